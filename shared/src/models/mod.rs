//! Store and delivery records consumed by the order pipeline

pub mod delivery;
pub mod store;

pub use delivery::{
    CancelState, Courier, Delivery3plOrder, DeliveryRequest, DeliveryStatus, DeliveryStatusEntry,
    Proposal,
};
pub use store::{
    AggregatorSettings, PurchaseBucket, PurchaseTypes, StatusOverride, Store, StoreConfigError,
    StoreGroup, ThreePlSettings,
};
