//! Order domain types
//!
//! - `status`: canonical status vocabulary (persisted, string-exact)
//! - `kinds`: POS and aggregator identifiers
//! - `model`: the order document and its status log

pub mod kinds;
pub mod model;
pub mod status;

// Re-exports
pub use kinds::{DeliveryService, PosKind, UnknownKind};
pub use model::{Address, Customer, Order, OrderItem, OrderType, StatusEntry};
pub use status::{OrderStatus, UnknownStatus};
