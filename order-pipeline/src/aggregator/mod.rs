//! Aggregator side of the status engine
//!
//! - **projection**: canonical status → aggregator-native status (pure)
//! - **action**: native status → client call
//! - **client**: capability trait implemented per aggregator
//! - **registry**: lookup table of clients keyed by delivery service
//! - **webhook**: reqwest client for external webhook integrations

pub mod action;
pub mod client;
pub mod projection;
pub mod registry;
pub mod webhook;

// Re-exports
pub use action::{AggregatorAction, reject_reason, resolve};
pub use client::{AggregatorClient, AggregatorError, AggregatorResult};
pub use projection::{OrderAttrs, Projection, project};
pub use registry::AggregatorRegistry;
pub use webhook::WebhookClient;
