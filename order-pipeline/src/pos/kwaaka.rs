//! Platform-internal orders report canonical names verbatim

use shared::order::OrderStatus;

use super::StatusDecoder;

const TABLE: &[(&str, OrderStatus)] = &[
    ("NEW", OrderStatus::New),
    ("ACCEPTED", OrderStatus::Accepted),
    ("WAIT_SENDING", OrderStatus::WaitSending),
    ("COOKING_STARTED", OrderStatus::CookingStarted),
    ("COOKING_COMPLETE", OrderStatus::CookingComplete),
    ("READY_FOR_PICKUP", OrderStatus::ReadyForPickup),
    ("OUT_FOR_DELIVERY", OrderStatus::OutForDelivery),
    ("PICKED_UP_BY_CUSTOMER", OrderStatus::PickedUpByCustomer),
    ("DELIVERED", OrderStatus::Delivered),
    ("CLOSED", OrderStatus::Closed),
    ("CANCELLED_BY_POS_SYSTEM", OrderStatus::CancelledByPosSystem),
    ("FAILED", OrderStatus::Failed),
];

pub struct KwaakaDecoder;

impl StatusDecoder for KwaakaDecoder {
    fn table(&self) -> &'static [(&'static str, OrderStatus)] {
        TABLE
    }
}
