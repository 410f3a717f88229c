//! 3PL collaborator contract

use async_trait::async_trait;
use shared::models::{Delivery3plOrder, DeliveryRequest, Proposal};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThreePlError {
    #[error("3PL request failed: {0}")]
    Http(String),

    #[error("3PL rejected the request: {0}")]
    Rejected(String),

    #[error("3PL delivery not found: {0}")]
    NotFound(String),

    #[error("3PL call timed out")]
    Timeout,
}

pub type ThreePlResult<T> = Result<T, ThreePlError>;

#[async_trait]
pub trait ThreePlClient: Send + Sync {
    /// Book a courier; `request.provider` pins the provider when set
    async fn create_3pl_order(&self, request: &DeliveryRequest) -> ThreePlResult<Delivery3plOrder>;

    async fn cancel_3pl_order(&self, delivery_id: &str) -> ThreePlResult<()>;

    /// Stop looking for a performer without cancelling the booking record
    async fn cancel_courier_search(&self, delivery_id: &str) -> ThreePlResult<()>;

    /// Priced offers from every provider able to serve the request
    async fn list_potential_providers(&self, request: &DeliveryRequest) -> ThreePlResult<Vec<Proposal>>;

    /// Current booking of an order (by internal order id)
    async fn get_delivery_info_by_order_id(&self, order_id: &str) -> ThreePlResult<Delivery3plOrder>;
}
