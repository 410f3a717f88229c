//! Repository Module
//!
//! Collaborator contracts for the document store. The engine only depends on
//! the traits below; [`InMemoryRepository`] backs the binary and the tests.

pub mod memory;

pub use memory::InMemoryRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::models::{Delivery3plOrder, Proposal, Store, StoreGroup};
use shared::order::{Order, OrderStatus, PosKind};
use std::fmt;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Compare-and-swap lost: the stored status moved since it was read
    #[error("Conflict: expected status {expected}, found {actual}")]
    Conflict {
        expected: OrderStatus,
        actual: OrderStatus,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

// =============================================================================
// Selectors
// =============================================================================

/// Order lookup key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderSelector {
    /// Internal id
    Id(String),
    /// Aggregator-facing display id
    OrderId(String),
    /// Id assigned by the POS
    PosOrderId(String),
}

impl OrderSelector {
    /// Identifier scheme used by each POS in its status webhooks
    ///
    /// | POS                          | Key            |
    /// |------------------------------|----------------|
    /// | rkeeper, burger_king, poster | external id    |
    /// | kwaaka                       | internal id    |
    /// | others                       | POS order id   |
    pub fn for_pos(pos: PosKind, reference: impl Into<String>) -> Self {
        let reference = reference.into();
        match pos {
            PosKind::RKeeper | PosKind::BurgerKing | PosKind::Poster => {
                OrderSelector::OrderId(reference)
            }
            PosKind::Kwaaka => OrderSelector::Id(reference),
            _ => OrderSelector::PosOrderId(reference),
        }
    }

    pub fn matches(&self, order: &Order) -> bool {
        match self {
            OrderSelector::Id(id) => order.id == *id,
            OrderSelector::OrderId(id) => order.order_id == *id,
            OrderSelector::PosOrderId(id) => !id.is_empty() && order.pos_order_id == *id,
        }
    }
}

impl fmt::Display for OrderSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSelector::Id(id) => write!(f, "id={id}"),
            OrderSelector::OrderId(id) => write!(f, "order_id={id}"),
            OrderSelector::PosOrderId(id) => write!(f, "pos_order_id={id}"),
        }
    }
}

/// Conditional status write
#[derive(Debug, Clone)]
pub struct StatusTransition {
    /// Status the caller read; the write fails when the stored one differs
    pub expected: OrderStatus,
    pub status: OrderStatus,
    pub error_detail: Option<String>,
    pub at: DateTime<Utc>,
}

/// Filter for bulk scans
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    /// Empty = any status
    pub statuses: Vec<OrderStatus>,
    /// Empty = any store
    pub store_ids: Vec<String>,
    pub has_delivery: Option<bool>,
    /// Skip terminal orders
    pub open_only: bool,
    pub has_dispatcher: Option<bool>,
    pub send_courier: Option<bool>,
    pub picked_up_by_customer: Option<bool>,
    pub marketplace: Option<bool>,
    /// Last status change strictly before this instant
    pub updated_before: Option<DateTime<Utc>>,
    /// Applied after every other filter
    pub limit: Option<usize>,
}

impl OrderQuery {
    pub fn matches(&self, order: &Order) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&order.status))
            && (self.store_ids.is_empty() || self.store_ids.contains(&order.store_id))
            && self.has_delivery.is_none_or(|want| order.has_delivery() == want)
            && !(self.open_only && order.status.is_terminal())
            && self
                .has_dispatcher
                .is_none_or(|want| !order.delivery_dispatcher.is_empty() == want)
            && self.send_courier.is_none_or(|want| order.send_courier == want)
            && self
                .picked_up_by_customer
                .is_none_or(|want| order.is_picked_up_by_customer == want)
            && self.marketplace.is_none_or(|want| order.is_marketplace == want)
            && self
                .updated_before
                .is_none_or(|cutoff| order.last_status_change() < cutoff)
    }
}

/// Partial update of the dispatch fields of an order
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
    pub delivery_order_id: Option<String>,
    pub delivery_dispatcher: Option<String>,
    pub send_courier: Option<bool>,
    pub proposals: Option<Vec<Proposal>>,
    /// Appended to `delivery_history`
    pub archive_delivery: Option<Delivery3plOrder>,
}

impl OrderPatch {
    pub fn apply(self, order: &mut Order) {
        if let Some(id) = self.delivery_order_id {
            order.delivery_order_id = id;
        }
        if let Some(dispatcher) = self.delivery_dispatcher {
            order.delivery_dispatcher = dispatcher;
        }
        if let Some(send_courier) = self.send_courier {
            order.send_courier = send_courier;
        }
        if let Some(proposals) = self.proposals {
            order.proposals = proposals;
        }
        if let Some(delivery) = self.archive_delivery {
            order.delivery_history.push(delivery);
        }
    }
}

// =============================================================================
// Contracts
// =============================================================================

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn get_order(&self, selector: &OrderSelector) -> RepoResult<Order>;

    /// Replace the whole document
    async fn update_order(&self, order: &Order) -> RepoResult<()>;

    /// Atomic compare-and-swap on the current status; returns the stored order
    async fn update_order_status(
        &self,
        selector: &OrderSelector,
        transition: &StatusTransition,
    ) -> RepoResult<Order>;

    async fn get_all_orders(&self, query: &OrderQuery) -> RepoResult<Vec<Order>>;

    async fn patch_order(&self, id: &str, patch: OrderPatch) -> RepoResult<Order>;
}

#[async_trait]
pub trait StoreRepository: Send + Sync {
    async fn find_store(&self, id: &str) -> RepoResult<Store>;

    /// Group the store belongs to
    async fn find_store_group(&self, store_id: &str) -> RepoResult<StoreGroup>;

    async fn list_stores(&self) -> RepoResult<Vec<Store>>;
}
