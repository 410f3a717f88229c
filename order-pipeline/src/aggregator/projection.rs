//! Canonical status → aggregator-native status
//!
//! 1. Pick the override bucket (take-away / preorder / instant) for aggregators
//!    that support store overrides (Wolt, Glovo, external webhook).
//! 2. An override entry for the canonical status wins unconditionally, even
//!    when its native status is empty ("special matching").
//! 3. Otherwise fall back to the aggregator's default table ("default matching").
//!
//! Projection is pure: no I/O, same inputs → same output.

use shared::models::{PurchaseBucket, PurchaseTypes};
use shared::order::{DeliveryService, Order, OrderStatus, OrderType};

/// Wolt native statuses
pub mod wolt {
    pub const ACCEPT: &str = "Accept";
    pub const CONFIRM: &str = "Confirm";
    pub const READY: &str = "Ready";
    pub const REJECT: &str = "Reject";
    pub const DELIVERED: &str = "Delivered";
}

/// Glovo native statuses
pub mod glovo {
    pub const ACCEPTED: &str = "ACCEPTED";
    pub const READY_FOR_PICKUP: &str = "READY_FOR_PICKUP";
    pub const OUT_FOR_DELIVERY: &str = "OUT_FOR_DELIVERY";
    pub const PICKED_UP_BY_CUSTOMER: &str = "PICKED_UP_BY_CUSTOMER";
}

/// Chocofood native statuses
pub mod chocofood {
    pub const ACCEPTED: &str = "accepted";
    pub const COOKING: &str = "cooking";
    pub const READY: &str = "ready";
    pub const DELIVERED: &str = "delivered";
    pub const CANCELED: &str = "canceled";
}

/// Yandex Eda native statuses
pub mod yandex {
    pub const ACCEPTED: &str = "ACCEPTED_BY_RESTAURANT";
    pub const COOKING: &str = "COOKING";
    pub const READY: &str = "READY";
    pub const TAKEN_BY_COURIER: &str = "TAKEN_BY_COURIER";
    pub const DELIVERED: &str = "DELIVERED";
    pub const CANCELLED: &str = "CANCELLED";
}

/// Talabat native statuses
pub mod talabat {
    pub const ACCEPTED: &str = "OrderAccepted";
    pub const PREPARED: &str = "OrderPrepared";
    pub const PICKED_UP: &str = "OrderPickedUp";
    pub const REJECTED: &str = "OrderRejected";
}

/// Deliveroo native statuses
pub mod deliveroo {
    pub const ACCEPTED: &str = "accepted";
    pub const CONFIRMED: &str = "confirmed";
    pub const IN_KITCHEN: &str = "in_kitchen";
    pub const READY_FOR_COLLECTION: &str = "ready_for_collection";
    pub const COLLECTED: &str = "collected";
    pub const REJECTED: &str = "rejected";
}

/// StarterApp native statuses
pub mod starter_app {
    pub const ACCEPTED: &str = "accepted";
    pub const COOKING: &str = "cooking";
    pub const READY: &str = "ready";
    pub const ON_WAY: &str = "on_way";
    pub const COMPLETED: &str = "completed";
    pub const CANCELED: &str = "canceled";
}

/// Order attributes that influence projection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderAttrs {
    pub order_type: OrderType,
    pub is_picked_up_by_customer: bool,
}

impl OrderAttrs {
    pub fn bucket(&self) -> PurchaseBucket {
        if self.is_picked_up_by_customer {
            PurchaseBucket::Takeaway
        } else if self.order_type == OrderType::Preorder {
            PurchaseBucket::Preorder
        } else {
            PurchaseBucket::Instant
        }
    }

    fn is_preorder(&self) -> bool {
        self.order_type == OrderType::Preorder
    }
}

impl From<&Order> for OrderAttrs {
    fn from(order: &Order) -> Self {
        Self {
            order_type: order.order_type,
            is_picked_up_by_customer: order.is_picked_up_by_customer,
        }
    }
}

/// Result of projecting a canonical status onto an aggregator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    /// Aggregator-native status; empty means "no action"
    pub native: String,
    /// Canonical status echo
    pub status: OrderStatus,
}

impl Projection {
    pub fn is_empty(&self) -> bool {
        self.native.is_empty()
    }
}

/// Aggregators whose stores may override the default table
fn supports_overrides(service: DeliveryService) -> bool {
    matches!(
        service,
        DeliveryService::Wolt | DeliveryService::Glovo | DeliveryService::Emenu
    )
}

/// Project a canonical status onto an aggregator's vocabulary
pub fn project(
    service: DeliveryService,
    status: OrderStatus,
    attrs: &OrderAttrs,
    overrides: Option<&PurchaseTypes>,
) -> Projection {
    if supports_overrides(service)
        && let Some(types) = overrides
        && let Some(entry) = types
            .bucket(attrs.bucket())
            .iter()
            .find(|entry| entry.pos_status == status)
    {
        return Projection {
            native: entry.status.clone(),
            status,
        };
    }

    let native = match service {
        DeliveryService::Wolt => wolt_default(status, attrs),
        DeliveryService::Glovo => glovo_default(status),
        DeliveryService::Chocofood => chocofood_default(status),
        DeliveryService::Yandex => yandex_default(status),
        DeliveryService::Emenu => emenu_default(status),
        DeliveryService::Talabat => talabat_default(status),
        DeliveryService::Deliveroo => deliveroo_default(status, attrs),
        DeliveryService::StarterApp => starter_app_default(status),
        DeliveryService::Kwaaka | DeliveryService::QrMenu => status.as_str(),
        DeliveryService::Unknown => "",
    };

    Projection {
        native: native.to_string(),
        status,
    }
}

// ============================================================================
// Default tables
// ============================================================================

fn wolt_default(status: OrderStatus, attrs: &OrderAttrs) -> &'static str {
    use OrderStatus::*;
    match status {
        Accepted | WaitCooking | ReadyForCooking | CookingStarted | WaitSending => {
            if attrs.is_preorder() {
                wolt::CONFIRM
            } else {
                wolt::ACCEPT
            }
        }
        CookingComplete | Closed | ReadyForPickup | OnWay | Delivered | OutForDelivery => {
            wolt::READY
        }
        CancelledByPosSystem => wolt::REJECT,
        PickedUpByCustomer => wolt::DELIVERED,
        _ => "",
    }
}

fn glovo_default(status: OrderStatus) -> &'static str {
    use OrderStatus::*;
    match status {
        Accepted | WaitCooking | ReadyForCooking | CookingStarted | WaitSending => glovo::ACCEPTED,
        CookingComplete | ReadyForPickup => glovo::READY_FOR_PICKUP,
        OutForDelivery | OnWay => glovo::OUT_FOR_DELIVERY,
        PickedUpByCustomer | Delivered | Closed => glovo::PICKED_UP_BY_CUSTOMER,
        // Glovo orders cannot be rejected by the restaurant once placed
        _ => "",
    }
}

fn chocofood_default(status: OrderStatus) -> &'static str {
    use OrderStatus::*;
    match status {
        Accepted | WaitCooking | ReadyForCooking | WaitSending => chocofood::ACCEPTED,
        CookingStarted => chocofood::COOKING,
        CookingComplete | ReadyForPickup => chocofood::READY,
        OnWay | OutForDelivery | PickedUpByCustomer | Delivered | Closed => chocofood::DELIVERED,
        CancelledByPosSystem => chocofood::CANCELED,
        _ => "",
    }
}

fn yandex_default(status: OrderStatus) -> &'static str {
    use OrderStatus::*;
    match status {
        Accepted | WaitCooking | ReadyForCooking | WaitSending => yandex::ACCEPTED,
        CookingStarted => yandex::COOKING,
        CookingComplete | ReadyForPickup => yandex::READY,
        OnWay | OutForDelivery => yandex::TAKEN_BY_COURIER,
        PickedUpByCustomer | Delivered | Closed => yandex::DELIVERED,
        CancelledByPosSystem => yandex::CANCELLED,
        _ => "",
    }
}

/// Webhook integrations receive canonical names
fn emenu_default(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::New => "",
        other => other.as_str(),
    }
}

fn talabat_default(status: OrderStatus) -> &'static str {
    use OrderStatus::*;
    match status {
        Accepted | WaitCooking | ReadyForCooking | CookingStarted | WaitSending => {
            talabat::ACCEPTED
        }
        CookingComplete | ReadyForPickup | Closed => talabat::PREPARED,
        OnWay | OutForDelivery | PickedUpByCustomer | Delivered => talabat::PICKED_UP,
        CancelledByPosSystem => talabat::REJECTED,
        _ => "",
    }
}

fn deliveroo_default(status: OrderStatus, attrs: &OrderAttrs) -> &'static str {
    use OrderStatus::*;
    match status {
        Accepted | WaitCooking | ReadyForCooking | WaitSending => {
            if attrs.is_preorder() {
                deliveroo::CONFIRMED
            } else {
                deliveroo::ACCEPTED
            }
        }
        CookingStarted => deliveroo::IN_KITCHEN,
        CookingComplete | ReadyForPickup => deliveroo::READY_FOR_COLLECTION,
        PickedUpByCustomer | OnWay | OutForDelivery | Delivered | Closed => deliveroo::COLLECTED,
        CancelledByPosSystem => deliveroo::REJECTED,
        _ => "",
    }
}

fn starter_app_default(status: OrderStatus) -> &'static str {
    use OrderStatus::*;
    match status {
        Accepted | WaitCooking | ReadyForCooking | WaitSending => starter_app::ACCEPTED,
        CookingStarted => starter_app::COOKING,
        CookingComplete | ReadyForPickup => starter_app::READY,
        OnWay | OutForDelivery => starter_app::ON_WAY,
        PickedUpByCustomer | Delivered | Closed => starter_app::COMPLETED,
        CancelledByPosSystem => starter_app::CANCELED,
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::StatusOverride;

    const INSTANT: OrderAttrs = OrderAttrs {
        order_type: OrderType::Instant,
        is_picked_up_by_customer: false,
    };
    const PREORDER: OrderAttrs = OrderAttrs {
        order_type: OrderType::Preorder,
        is_picked_up_by_customer: false,
    };
    const TAKEAWAY: OrderAttrs = OrderAttrs {
        order_type: OrderType::Preorder,
        is_picked_up_by_customer: true,
    };

    fn overrides(bucket: PurchaseBucket, pos_status: OrderStatus, native: &str) -> PurchaseTypes {
        let entries = vec![StatusOverride {
            pos_status,
            status: native.to_string(),
        }];
        match bucket {
            PurchaseBucket::Instant => PurchaseTypes {
                instant: entries,
                ..Default::default()
            },
            PurchaseBucket::Preorder => PurchaseTypes {
                preorder: entries,
                ..Default::default()
            },
            PurchaseBucket::Takeaway => PurchaseTypes {
                takeaway: entries,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_bucket_selection() {
        assert_eq!(INSTANT.bucket(), PurchaseBucket::Instant);
        assert_eq!(PREORDER.bucket(), PurchaseBucket::Preorder);
        // Take-away wins over preorder
        assert_eq!(TAKEAWAY.bucket(), PurchaseBucket::Takeaway);
    }

    #[test]
    fn test_wolt_default_table() {
        let p = project(DeliveryService::Wolt, OrderStatus::CookingComplete, &INSTANT, None);
        assert_eq!(p.native, "Ready");
        assert_eq!(p.status, OrderStatus::CookingComplete);

        let p = project(DeliveryService::Wolt, OrderStatus::Accepted, &INSTANT, None);
        assert_eq!(p.native, "Accept");
        let p = project(DeliveryService::Wolt, OrderStatus::Accepted, &PREORDER, None);
        assert_eq!(p.native, "Confirm");

        let p = project(DeliveryService::Wolt, OrderStatus::CancelledByPosSystem, &INSTANT, None);
        assert_eq!(p.native, "Reject");
        let p = project(DeliveryService::Wolt, OrderStatus::PickedUpByCustomer, &INSTANT, None);
        assert_eq!(p.native, "Delivered");
        let p = project(DeliveryService::Wolt, OrderStatus::New, &INSTANT, None);
        assert!(p.is_empty());
    }

    #[test]
    fn test_override_wins_even_when_empty() {
        let types = overrides(PurchaseBucket::Instant, OrderStatus::CookingComplete, "");
        let p = project(
            DeliveryService::Wolt,
            OrderStatus::CookingComplete,
            &INSTANT,
            Some(&types),
        );
        assert!(p.is_empty());
    }

    #[test]
    fn test_override_only_applies_to_its_bucket() {
        let types = overrides(PurchaseBucket::Takeaway, OrderStatus::CookingComplete, "Delivered");
        let p = project(
            DeliveryService::Wolt,
            OrderStatus::CookingComplete,
            &TAKEAWAY,
            Some(&types),
        );
        assert_eq!(p.native, "Delivered");

        let p = project(
            DeliveryService::Wolt,
            OrderStatus::CookingComplete,
            &INSTANT,
            Some(&types),
        );
        assert_eq!(p.native, "Ready");
    }

    #[test]
    fn test_overrides_ignored_for_aggregators_without_support() {
        let types = overrides(PurchaseBucket::Instant, OrderStatus::CancelledByPosSystem, "");
        let p = project(
            DeliveryService::Talabat,
            OrderStatus::CancelledByPosSystem,
            &INSTANT,
            Some(&types),
        );
        assert_eq!(p.native, "OrderRejected");
    }

    #[test]
    fn test_internal_channels_are_identity() {
        for status in OrderStatus::ALL {
            for service in [DeliveryService::Kwaaka, DeliveryService::QrMenu] {
                let p = project(service, status, &INSTANT, None);
                assert_eq!(p.native, status.as_str());
            }
        }
    }

    #[test]
    fn test_projection_is_pure() {
        let types = overrides(PurchaseBucket::Preorder, OrderStatus::Accepted, "Accept");
        let first = project(DeliveryService::Glovo, OrderStatus::Accepted, &PREORDER, Some(&types));
        for _ in 0..3 {
            let again =
                project(DeliveryService::Glovo, OrderStatus::Accepted, &PREORDER, Some(&types));
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_unknown_aggregator_projects_to_nothing() {
        let p = project(DeliveryService::Unknown, OrderStatus::Accepted, &INSTANT, None);
        assert!(p.is_empty());
    }
}
