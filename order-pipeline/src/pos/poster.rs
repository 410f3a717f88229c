//! Poster incoming-order status codes

use shared::order::OrderStatus;

use super::StatusDecoder;

const TABLE: &[(&str, OrderStatus)] = &[
    ("0", OrderStatus::New),
    ("1", OrderStatus::Accepted),
    ("2", OrderStatus::CookingStarted),
    ("3", OrderStatus::CookingComplete),
    ("4", OrderStatus::Closed),
    ("7", OrderStatus::CancelledByPosSystem),
];

pub struct PosterDecoder;

impl StatusDecoder for PosterDecoder {
    fn table(&self) -> &'static [(&'static str, OrderStatus)] {
        TABLE
    }
}
