//! Burger King in-house POS

use shared::order::OrderStatus;

use super::StatusDecoder;

const TABLE: &[(&str, OrderStatus)] = &[
    ("NEW", OrderStatus::New),
    ("ACCEPTED", OrderStatus::Accepted),
    ("IN_PROGRESS", OrderStatus::CookingStarted),
    ("READY", OrderStatus::CookingComplete),
    ("PICKED_UP", OrderStatus::PickedUpByCustomer),
    ("COMPLETED", OrderStatus::Closed),
    ("CANCELED", OrderStatus::CancelledByPosSystem),
];

pub struct BurgerKingDecoder;

impl StatusDecoder for BurgerKingDecoder {
    fn table(&self) -> &'static [(&'static str, OrderStatus)] {
        TABLE
    }
}
