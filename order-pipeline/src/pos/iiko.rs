//! iiko / Syrve delivery order statuses

use shared::order::OrderStatus;

use super::StatusDecoder;

const TABLE: &[(&str, OrderStatus)] = &[
    ("Unconfirmed", OrderStatus::New),
    ("New", OrderStatus::New),
    ("WaitCooking", OrderStatus::WaitCooking),
    ("ReadyForCooking", OrderStatus::ReadyForCooking),
    ("CookingStarted", OrderStatus::CookingStarted),
    ("CookingCompleted", OrderStatus::CookingComplete),
    ("Waiting", OrderStatus::ReadyForPickup),
    ("OnWay", OrderStatus::OnWay),
    ("Delivered", OrderStatus::Delivered),
    ("Closed", OrderStatus::Closed),
    ("Cancelled", OrderStatus::CancelledByPosSystem),
];

pub struct IikoDecoder;

impl StatusDecoder for IikoDecoder {
    fn table(&self) -> &'static [(&'static str, OrderStatus)] {
        TABLE
    }
}
