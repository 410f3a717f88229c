//! Shared types for the order pipeline
//!
//! Domain vocabulary used by the status engine and by every collaborator
//! that reads or writes order documents: canonical statuses, POS and
//! aggregator identifiers, orders, stores and 3PL delivery records.

pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use models::{Delivery3plOrder, DeliveryStatus, Proposal, Store, StoreGroup};
pub use order::{DeliveryService, Order, OrderStatus, OrderType, PosKind};
