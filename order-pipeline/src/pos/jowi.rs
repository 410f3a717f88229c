//! Jowi reports numeric status codes as strings

use shared::order::OrderStatus;

use super::StatusDecoder;

const TABLE: &[(&str, OrderStatus)] = &[
    ("0", OrderStatus::New),
    ("1", OrderStatus::Accepted),
    ("2", OrderStatus::CancelledByPosSystem),
    ("3", OrderStatus::OutForDelivery),
    ("4", OrderStatus::Closed),
];

pub struct JowiDecoder;

impl StatusDecoder for JowiDecoder {
    fn table(&self) -> &'static [(&'static str, OrderStatus)] {
        TABLE
    }
}
