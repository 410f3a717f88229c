//! Aggregator client capability
//!
//! One trait covers every lifecycle call the engine makes. Each aggregator
//! implements only what its API offers; the default body of every method
//! returns [`AggregatorError::Unsupported`], which the workflow treats as a
//! deliberate no-op rather than a failure.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::models::Store;
use shared::order::{DeliveryService, Order};
use thiserror::Error;

/// Aggregator call errors
#[derive(Debug, Error)]
pub enum AggregatorError {
    /// The aggregator has no equivalent lifecycle call
    #[error("method is not supported by {0}")]
    Unsupported(DeliveryService),

    #[error("aggregator request failed: {0}")]
    Http(String),

    #[error("aggregator rejected the request: {0}")]
    Rejected(String),

    #[error("aggregator call timed out")]
    Timeout,
}

impl AggregatorError {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, AggregatorError::Unsupported(_))
    }
}

pub type AggregatorResult<T> = Result<T, AggregatorError>;

#[async_trait]
pub trait AggregatorClient: Send + Sync {
    /// Aggregator this client talks to
    fn service(&self) -> DeliveryService;

    async fn accept_order(
        &self,
        _order: &Order,
        _store: &Store,
        _pickup_time: DateTime<Utc>,
    ) -> AggregatorResult<()> {
        Err(AggregatorError::Unsupported(self.service()))
    }

    async fn accept_self_delivery_order(
        &self,
        _order: &Order,
        _store: &Store,
        _pickup_time: DateTime<Utc>,
    ) -> AggregatorResult<()> {
        Err(AggregatorError::Unsupported(self.service()))
    }

    async fn reject_order(&self, _order: &Order, _store: &Store, _reason: &str) -> AggregatorResult<()> {
        Err(AggregatorError::Unsupported(self.service()))
    }

    /// Mark the order ready for pickup
    async fn mark_order(&self, _order: &Order, _store: &Store) -> AggregatorResult<()> {
        Err(AggregatorError::Unsupported(self.service()))
    }

    async fn confirm_pre_order(&self, _order: &Order, _store: &Store) -> AggregatorResult<()> {
        Err(AggregatorError::Unsupported(self.service()))
    }

    async fn delivered_order(&self, _order: &Order, _store: &Store) -> AggregatorResult<()> {
        Err(AggregatorError::Unsupported(self.service()))
    }

    async fn update_order_status(
        &self,
        _order: &Order,
        _store: &Store,
        _status: &str,
    ) -> AggregatorResult<()> {
        Err(AggregatorError::Unsupported(self.service()))
    }
}
