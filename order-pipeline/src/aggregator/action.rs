//! Native status → aggregator client call

use shared::order::DeliveryService;
use std::fmt;

use super::projection::{
    chocofood, deliveroo, glovo, starter_app, talabat, wolt, yandex,
};

/// Outbound aggregator call triggered by a projected native status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregatorAction {
    Accept,
    Reject,
    /// Mark the order ready
    Ready,
    Confirm,
    Delivered,
    /// Generic status push for tokens without a dedicated call
    UpdateStatus(String),
}

impl fmt::Display for AggregatorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregatorAction::Accept => write!(f, "accept"),
            AggregatorAction::Reject => write!(f, "reject"),
            AggregatorAction::Ready => write!(f, "ready"),
            AggregatorAction::Confirm => write!(f, "confirm"),
            AggregatorAction::Delivered => write!(f, "delivered"),
            AggregatorAction::UpdateStatus(status) => write!(f, "update_status({status})"),
        }
    }
}

/// Resolve the call for a native status.
///
/// `None` for an empty token and for internal channels, which never call out.
pub fn resolve(service: DeliveryService, native: &str) -> Option<AggregatorAction> {
    if native.is_empty() || service.is_internal() || service == DeliveryService::Unknown {
        return None;
    }

    let action = match (service, native) {
        (DeliveryService::Wolt, wolt::ACCEPT) => AggregatorAction::Accept,
        (DeliveryService::Wolt, wolt::CONFIRM) => AggregatorAction::Confirm,
        (DeliveryService::Wolt, wolt::READY) => AggregatorAction::Ready,
        (DeliveryService::Wolt, wolt::REJECT) => AggregatorAction::Reject,
        (DeliveryService::Wolt, wolt::DELIVERED) => AggregatorAction::Delivered,

        (DeliveryService::Glovo, glovo::ACCEPTED) => AggregatorAction::Accept,
        (DeliveryService::Glovo, glovo::READY_FOR_PICKUP) => AggregatorAction::Ready,
        (DeliveryService::Glovo, glovo::PICKED_UP_BY_CUSTOMER) => AggregatorAction::Delivered,

        (DeliveryService::Chocofood, chocofood::ACCEPTED) => AggregatorAction::Accept,
        (DeliveryService::Chocofood, chocofood::READY) => AggregatorAction::Ready,
        (DeliveryService::Chocofood, chocofood::DELIVERED) => AggregatorAction::Delivered,
        (DeliveryService::Chocofood, chocofood::CANCELED) => AggregatorAction::Reject,

        (DeliveryService::Yandex, yandex::ACCEPTED) => AggregatorAction::Accept,
        (DeliveryService::Yandex, yandex::READY) => AggregatorAction::Ready,
        (DeliveryService::Yandex, yandex::DELIVERED) => AggregatorAction::Delivered,
        (DeliveryService::Yandex, yandex::CANCELLED) => AggregatorAction::Reject,

        (DeliveryService::Talabat, talabat::ACCEPTED) => AggregatorAction::Accept,
        (DeliveryService::Talabat, talabat::PREPARED) => AggregatorAction::Ready,
        (DeliveryService::Talabat, talabat::PICKED_UP) => AggregatorAction::Delivered,
        (DeliveryService::Talabat, talabat::REJECTED) => AggregatorAction::Reject,

        (DeliveryService::Deliveroo, deliveroo::ACCEPTED) => AggregatorAction::Accept,
        (DeliveryService::Deliveroo, deliveroo::CONFIRMED) => AggregatorAction::Confirm,
        (DeliveryService::Deliveroo, deliveroo::READY_FOR_COLLECTION) => AggregatorAction::Ready,
        (DeliveryService::Deliveroo, deliveroo::COLLECTED) => AggregatorAction::Delivered,
        (DeliveryService::Deliveroo, deliveroo::REJECTED) => AggregatorAction::Reject,

        (DeliveryService::StarterApp, starter_app::ACCEPTED) => AggregatorAction::Accept,
        (DeliveryService::StarterApp, starter_app::READY) => AggregatorAction::Ready,
        (DeliveryService::StarterApp, starter_app::COMPLETED) => AggregatorAction::Delivered,
        (DeliveryService::StarterApp, starter_app::CANCELED) => AggregatorAction::Reject,

        (_, other) => AggregatorAction::UpdateStatus(other.to_string()),
    };
    Some(action)
}

/// Reason sent with `RejectOrder`
pub fn reject_reason(service: DeliveryService) -> &'static str {
    match service {
        DeliveryService::Talabat => "TECHNICAL_PROBLEM",
        DeliveryService::Deliveroo => "other",
        _ => "CANCELLED_BY_RESTAURANT",
    }
}
