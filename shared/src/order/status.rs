//! Canonical order status vocabulary
//!
//! The string form of every variant is persisted and compared against
//! historically stored values, so it must never change.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical, POS-agnostic order lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    New,
    Accepted,
    WaitCooking,
    ReadyForCooking,
    CookingStarted,
    CookingComplete,
    /// Held back before the POS receives the order
    WaitSending,
    ReadyForPickup,
    OutForDelivery,
    OnWay,
    PickedUpByCustomer,
    Delivered,
    Closed,
    CancelledByPosSystem,
    CancelledByDeliveryService,
    Failed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 16] = [
        OrderStatus::New,
        OrderStatus::Accepted,
        OrderStatus::WaitCooking,
        OrderStatus::ReadyForCooking,
        OrderStatus::CookingStarted,
        OrderStatus::CookingComplete,
        OrderStatus::WaitSending,
        OrderStatus::ReadyForPickup,
        OrderStatus::OutForDelivery,
        OrderStatus::OnWay,
        OrderStatus::PickedUpByCustomer,
        OrderStatus::Delivered,
        OrderStatus::Closed,
        OrderStatus::CancelledByPosSystem,
        OrderStatus::CancelledByDeliveryService,
        OrderStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::Accepted => "ACCEPTED",
            OrderStatus::WaitCooking => "WAIT_COOKING",
            OrderStatus::ReadyForCooking => "READY_FOR_COOKING",
            OrderStatus::CookingStarted => "COOKING_STARTED",
            OrderStatus::CookingComplete => "COOKING_COMPLETE",
            OrderStatus::WaitSending => "WAIT_SENDING",
            OrderStatus::ReadyForPickup => "READY_FOR_PICKUP",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::OnWay => "ON_WAY",
            OrderStatus::PickedUpByCustomer => "PICKED_UP_BY_CUSTOMER",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Closed => "CLOSED",
            OrderStatus::CancelledByPosSystem => "CANCELLED_BY_POS_SYSTEM",
            OrderStatus::CancelledByDeliveryService => "CANCELLED_BY_DELIVERY_SERVICE",
            OrderStatus::Failed => "FAILED",
        }
    }

    /// Terminal statuses: the order is never mutated again except by archival
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Closed
                | OrderStatus::Failed
                | OrderStatus::CancelledByPosSystem
                | OrderStatus::CancelledByDeliveryService
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not part of the canonical vocabulary
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}
