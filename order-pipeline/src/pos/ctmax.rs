//! CTMax statuses

use shared::order::OrderStatus;

use super::StatusDecoder;

const TABLE: &[(&str, OrderStatus)] = &[
    ("Created", OrderStatus::New),
    ("Accepted", OrderStatus::Accepted),
    ("InProgress", OrderStatus::CookingStarted),
    ("Ready", OrderStatus::CookingComplete),
    ("Issued", OrderStatus::PickedUpByCustomer),
    ("Closed", OrderStatus::Closed),
    ("Cancelled", OrderStatus::CancelledByPosSystem),
];

pub struct CtMaxDecoder;

impl StatusDecoder for CtMaxDecoder {
    fn table(&self) -> &'static [(&'static str, OrderStatus)] {
        TABLE
    }
}
