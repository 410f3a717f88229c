use shared::order::OrderStatus;

use super::StatusDecoder;

const TABLE: &[(&str, OrderStatus)] = &[
    ("NEW", OrderStatus::New),
    ("CONFIRMED", OrderStatus::Accepted),
    ("COOKING", OrderStatus::CookingStarted),
    ("COOKED", OrderStatus::CookingComplete),
    ("IN_DELIVERY", OrderStatus::OutForDelivery),
    ("DONE", OrderStatus::Closed),
    ("CANCELED", OrderStatus::CancelledByPosSystem),
];

pub struct YarosDecoder;

impl StatusDecoder for YarosDecoder {
    fn table(&self) -> &'static [(&'static str, OrderStatus)] {
        TABLE
    }
}
