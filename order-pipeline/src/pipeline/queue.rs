//! Status queue validation
//!
//! Only the internal Kwaaka POS guarantees a strictly forward status stream.
//! Every other POS may repeat or jump around and is never constrained here.

use shared::order::{OrderStatus, PosKind};

/// Forward order of the internal POS lifecycle
const KWAAKA_RANKS: &[(OrderStatus, u8)] = &[
    (OrderStatus::New, 0),
    (OrderStatus::Accepted, 1),
    (OrderStatus::CookingStarted, 2),
    (OrderStatus::CookingComplete, 3),
    (OrderStatus::Closed, 4),
];

fn kwaaka_rank(status: OrderStatus) -> Option<u8> {
    KWAAKA_RANKS
        .iter()
        .find(|(known, _)| *known == status)
        .map(|(_, rank)| *rank)
}

/// `true` when `new` may follow `previous` for this POS.
///
/// Statuses outside the rank table are unconstrained.
pub fn is_monotonic(previous: OrderStatus, new: OrderStatus, pos: PosKind) -> bool {
    if pos != PosKind::Kwaaka {
        return true;
    }
    match (kwaaka_rank(previous), kwaaka_rank(new)) {
        (Some(previous), Some(new)) => previous < new,
        _ => true,
    }
}
