//! 3PL delivery records
//!
//! A `Delivery3plOrder` tracks one courier booking with one provider. Once it
//! reaches a terminal status it is never re-targeted: a new booking is created
//! and the old record is archived into the order's `delivery_history`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::order::{Address, Customer, OrderItem};

/// Provider-side delivery lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    OrderCreated,
    PerformerLookup,
    ComingToPickup,
    PickedUp,
    Delivered,
    Returning,
    Returned,
    Cancelled,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::OrderCreated => "ORDER_CREATED",
            DeliveryStatus::PerformerLookup => "PERFORMER_LOOKUP",
            DeliveryStatus::ComingToPickup => "COMING_TO_PICKUP",
            DeliveryStatus::PickedUp => "PICKED_UP",
            DeliveryStatus::Delivered => "DELIVERED",
            DeliveryStatus::Returning => "RETURNING",
            DeliveryStatus::Returned => "RETURNED",
            DeliveryStatus::Cancelled => "CANCELLED",
            DeliveryStatus::Failed => "FAILED",
        }
    }

    /// No provider re-bid may target a record in one of these statuses
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeliveryStatus::Delivered
                | DeliveryStatus::Cancelled
                | DeliveryStatus::Returning
                | DeliveryStatus::Returned
                | DeliveryStatus::Failed
        )
    }

    /// A courier is already on the way or the booking is settled
    pub fn blocks_rebid(&self) -> bool {
        self.is_terminal()
            || matches!(
                self,
                DeliveryStatus::ComingToPickup | DeliveryStatus::PickedUp
            )
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryStatusEntry {
    pub status: DeliveryStatus,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Courier {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_url: Option<String>,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

/// Whether the provider still allows cancelling the booking
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum CancelState {
    #[default]
    #[serde(rename = "")]
    Available,
    #[serde(rename = "unavailable")]
    Unavailable,
}

/// One courier booking with one provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Delivery3plOrder {
    pub id: String,
    /// Internal id of the order this booking serves
    pub order_id: String,
    pub provider: String,
    pub status: DeliveryStatus,
    #[serde(default)]
    pub status_history: Vec<DeliveryStatusEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub courier: Option<Courier>,
    #[serde(default)]
    pub cancel_state: CancelState,
    pub created_at: DateTime<Utc>,
}

impl Delivery3plOrder {
    /// True when any status ever reached makes re-bidding pointless
    pub fn blocks_rebid(&self) -> bool {
        self.status.blocks_rebid() || self.status_history.iter().any(|e| e.status.blocks_rebid())
    }

    /// Time the booking most recently entered `status`
    pub fn status_entered_at(&self, status: DeliveryStatus) -> Option<DateTime<Utc>> {
        self.status_history
            .iter()
            .rev()
            .find(|entry| entry.status == status)
            .map(|entry| entry.time)
    }
}

/// Priced offer from one provider. Lower `priority` is preferred.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Proposal {
    pub price: Decimal,
    pub time_estimate_minutes: u32,
    pub provider_service: String,
    pub priority: i32,
}

/// Delivery booking request sent to the 3PL service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryRequest {
    /// Internal order id
    pub order_id: String,
    /// Aggregator-facing order id, printed on the courier ticket
    pub display_id: String,
    pub store_id: String,
    /// Explicit provider; `None` lets the 3PL service choose
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Providers the store allows (empty: all)
    #[serde(default)]
    pub providers: Vec<String>,
    pub pickup: Address,
    #[serde(default)]
    pub pickup_phone: String,
    pub dropoff: Address,
    pub customer: Customer,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub taxi_class: String,
    pub total_price: Decimal,
}
