//! Order document as stored by the repository

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::kinds::{DeliveryService, PosKind};
use super::status::OrderStatus;
use crate::models::delivery::{Delivery3plOrder, Proposal};

/// One entry of the append-only status log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusEntry {
    pub name: OrderStatus,
    pub time: DateTime<Utc>,
}

/// Order purchase timing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    #[default]
    Instant,
    Preorder,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Address {
    pub label: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Customer {
    pub name: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    pub price: Decimal,
}

/// Order record
///
/// `id` is the internal identity, `order_id` the aggregator-facing display id and
/// `pos_order_id` the identifier assigned by the POS once the order reached it.
///
/// Invariant: `statuses_history` is strictly time-increasing and its last entry
/// always equals `status`. Mutate status only through [`Order::push_status`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    pub order_id: String,
    #[serde(default)]
    pub pos_order_id: String,
    pub store_id: String,
    pub delivery_service: DeliveryService,
    pub pos_type: PosKind,
    pub status: OrderStatus,
    #[serde(default)]
    pub statuses_history: Vec<StatusEntry>,
    #[serde(rename = "type", default)]
    pub order_type: OrderType,
    #[serde(default)]
    pub is_picked_up_by_customer: bool,
    #[serde(default)]
    pub is_parent_order: bool,
    #[serde(default)]
    pub is_child_order: bool,
    /// Submission to the aggregator is owned by the parent order
    #[serde(default)]
    pub defer_submission: bool,
    /// Current 3PL provider, empty when none is assigned
    #[serde(default)]
    pub delivery_dispatcher: String,
    /// Current 3PL delivery id, empty when none exists
    #[serde(default)]
    pub delivery_order_id: String,
    /// A courier dispatch has been requested for this order
    #[serde(default)]
    pub send_courier: bool,
    #[serde(default)]
    pub is_marketplace: bool,
    #[serde(default)]
    pub proposals: Vec<Proposal>,
    /// Cancelled 3PL deliveries, oldest first
    #[serde(default)]
    pub delivery_history: Vec<Delivery3plOrder>,
    #[serde(default)]
    pub customer: Customer,
    #[serde(default)]
    pub delivery_address: Address,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub estimated_total_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create a new instant order in `NEW`
    pub fn new(
        id: impl Into<String>,
        order_id: impl Into<String>,
        store_id: impl Into<String>,
        delivery_service: DeliveryService,
        pos_type: PosKind,
    ) -> Self {
        let created_at = Utc::now();
        Self {
            id: id.into(),
            order_id: order_id.into(),
            pos_order_id: String::new(),
            store_id: store_id.into(),
            delivery_service,
            pos_type,
            status: OrderStatus::New,
            statuses_history: vec![StatusEntry {
                name: OrderStatus::New,
                time: created_at,
            }],
            order_type: OrderType::Instant,
            is_picked_up_by_customer: false,
            is_parent_order: false,
            is_child_order: false,
            defer_submission: false,
            delivery_dispatcher: String::new(),
            delivery_order_id: String::new(),
            send_courier: false,
            is_marketplace: false,
            proposals: Vec::new(),
            delivery_history: Vec::new(),
            customer: Customer::default(),
            delivery_address: Address::default(),
            items: Vec::new(),
            estimated_total_price: Decimal::ZERO,
            pickup_time: None,
            failure_reason: None,
            created_at,
        }
    }

    /// Append a status and make it current.
    ///
    /// The recorded time is bumped past the previous entry when the clock did not
    /// advance, so the log stays strictly increasing. Returns the recorded time.
    pub fn push_status(&mut self, status: OrderStatus, at: DateTime<Utc>) -> DateTime<Utc> {
        let time = match self.statuses_history.last() {
            Some(last) if at <= last.time => last.time + Duration::milliseconds(1),
            _ => at,
        };
        self.statuses_history.push(StatusEntry { name: status, time });
        self.status = status;
        time
    }

    /// Time the order most recently entered `status`
    pub fn status_entered_at(&self, status: OrderStatus) -> Option<DateTime<Utc>> {
        self.statuses_history
            .iter()
            .rev()
            .find(|entry| entry.name == status)
            .map(|entry| entry.time)
    }

    /// Time of the latest status change (creation time for an empty log)
    pub fn last_status_change(&self) -> DateTime<Utc> {
        self.statuses_history
            .last()
            .map(|entry| entry.time)
            .unwrap_or(self.created_at)
    }

    pub fn has_delivery(&self) -> bool {
        !self.delivery_order_id.is_empty()
    }

    /// Check the history invariant (used by repositories and tests)
    pub fn history_is_consistent(&self) -> bool {
        let ordered = self
            .statuses_history
            .windows(2)
            .all(|pair| pair[0].time < pair[1].time);
        let tail_matches = self
            .statuses_history
            .last()
            .is_none_or(|entry| entry.name == self.status);
        ordered && tail_matches
    }
}
