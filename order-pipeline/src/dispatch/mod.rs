//! ThreePL dispatch
//!
//! - **client**: 3PL collaborator contract
//! - **http**: reqwest implementation
//! - **selector**: booking, re-bid and cancellation decisions
//! - **worker**: asynchronous booking queue
//! - **cron**: periodic scans over open orders

pub mod client;
pub mod cron;
pub mod http;
pub mod retry;
pub mod selector;
pub mod worker;

pub use client::{ThreePlClient, ThreePlError, ThreePlResult};
pub use cron::{CronScheduler, ScanReport, ScanSettings};
pub use http::HttpThreePlClient;
pub use retry::RetryPolicy;
pub use selector::{CreateOutcome, DispatchError, DispatchSelector, DispatchSkip, RebidOutcome};
pub use worker::{BookingOutcome, DeliveryJob, DeliveryWorker};
