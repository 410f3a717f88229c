//! r_keeper statuses
//!
//! Two integrations exist: the delivery REST API and the legacy r_keeper 7
//! XML interface, which reports check states instead of order states.

use shared::order::OrderStatus;

use super::StatusDecoder;

const REST_TABLE: &[(&str, OrderStatus)] = &[
    ("Created", OrderStatus::New),
    ("Accepted", OrderStatus::Accepted),
    ("Cooking", OrderStatus::CookingStarted),
    ("Ready", OrderStatus::CookingComplete),
    ("Delivering", OrderStatus::OnWay),
    ("Delivered", OrderStatus::Delivered),
    ("Completed", OrderStatus::Closed),
    ("Canceled", OrderStatus::CancelledByPosSystem),
    ("Cancelled", OrderStatus::CancelledByPosSystem),
];

const XML_TABLE: &[(&str, OrderStatus)] = &[
    ("NEW", OrderStatus::New),
    ("OPEN", OrderStatus::Accepted),
    ("IN_KITCHEN", OrderStatus::CookingStarted),
    ("PRECHECK", OrderStatus::CookingComplete),
    ("PAID", OrderStatus::Closed),
    ("CLOSED", OrderStatus::Closed),
    ("DELETED", OrderStatus::CancelledByPosSystem),
];

pub struct RKeeperDecoder;

impl StatusDecoder for RKeeperDecoder {
    fn table(&self) -> &'static [(&'static str, OrderStatus)] {
        REST_TABLE
    }
}

pub struct RKeeper7XmlDecoder;

impl StatusDecoder for RKeeper7XmlDecoder {
    fn table(&self) -> &'static [(&'static str, OrderStatus)] {
        XML_TABLE
    }
}
