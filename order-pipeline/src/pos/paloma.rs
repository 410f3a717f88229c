//! Paloma365 statuses

use shared::order::OrderStatus;

use super::StatusDecoder;

const TABLE: &[(&str, OrderStatus)] = &[
    ("new", OrderStatus::New),
    ("accepted", OrderStatus::Accepted),
    ("cooking", OrderStatus::CookingStarted),
    ("cooked", OrderStatus::CookingComplete),
    ("sent", OrderStatus::OutForDelivery),
    ("delivered", OrderStatus::Delivered),
    ("closed", OrderStatus::Closed),
    ("cancelled", OrderStatus::CancelledByPosSystem),
];

pub struct PalomaDecoder;

impl StatusDecoder for PalomaDecoder {
    fn table(&self) -> &'static [(&'static str, OrderStatus)] {
        TABLE
    }
}
