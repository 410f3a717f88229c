//! FoodBand statuses
//!
//! FoodBand delivers webhooks out of order, so every status carries a fixed
//! rank and a lower rank than the previous status is reported as
//! `InvalidStatusPriority`.

use shared::order::OrderStatus;

use super::StatusDecoder;

const TABLE: &[(&str, OrderStatus)] = &[
    ("new", OrderStatus::New),
    ("accepted", OrderStatus::Accepted),
    ("cooking", OrderStatus::CookingStarted),
    ("ready", OrderStatus::CookingComplete),
    ("ready_for_pickup", OrderStatus::ReadyForPickup),
    ("on_way", OrderStatus::OnWay),
    ("picked_up", OrderStatus::PickedUpByCustomer),
    ("delivered", OrderStatus::Delivered),
    ("closed", OrderStatus::Closed),
    ("cancelled", OrderStatus::CancelledByPosSystem),
];

pub struct FoodBandDecoder;

impl StatusDecoder for FoodBandDecoder {
    fn table(&self) -> &'static [(&'static str, OrderStatus)] {
        TABLE
    }

    fn rank(&self, status: OrderStatus) -> Option<u8> {
        let rank = match status {
            OrderStatus::New => 0,
            OrderStatus::Accepted => 1,
            OrderStatus::CookingStarted => 2,
            OrderStatus::CookingComplete => 3,
            OrderStatus::ReadyForPickup => 4,
            OrderStatus::OnWay | OrderStatus::PickedUpByCustomer => 5,
            OrderStatus::Delivered => 6,
            OrderStatus::Closed => 7,
            OrderStatus::CancelledByPosSystem => 8,
            _ => return None,
        };
        Some(rank)
    }
}
