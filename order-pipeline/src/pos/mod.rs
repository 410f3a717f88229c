//! POS status translation
//!
//! Every POS vendor reports kitchen progress in its own vocabulary. Each vendor
//! owns a private, exhaustive `raw → canonical` table; [`translate`] picks the
//! table by [`PosKind`] and never defaults an unknown raw status.
//!
//! ```text
//! (PosKind, raw status, previous status)
//!         │
//!         ▼
//!   PosDecoder::for_kind ──None──▶ PosSystemIsIncorrect
//!         │
//!         ▼
//!   decoder.decode(raw) ──None──▶ StatusIsNotExist
//!         │
//!         ▼
//!   rank(new) < rank(previous) ──▶ InvalidStatusPriority { decoded, .. }
//!         │
//!         ▼
//!   canonical OrderStatus
//! ```

use enum_dispatch::enum_dispatch;
use shared::order::{OrderStatus, PosKind};
use thiserror::Error;

mod burger_king;
mod ctmax;
mod foodband;
mod iiko;
mod jowi;
mod kwaaka;
mod paloma;
mod poster;
mod rkeeper;
mod yaros;

pub use burger_king::BurgerKingDecoder;
pub use ctmax::CtMaxDecoder;
pub use foodband::FoodBandDecoder;
pub use iiko::IikoDecoder;
pub use jowi::JowiDecoder;
pub use kwaaka::KwaakaDecoder;
pub use paloma::PalomaDecoder;
pub use poster::PosterDecoder;
pub use rkeeper::{RKeeper7XmlDecoder, RKeeperDecoder};
pub use yaros::YarosDecoder;

/// Translation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    #[error("status {raw:?} does not exist for pos system {pos}")]
    StatusIsNotExist { pos: PosKind, raw: String },

    #[error("pos system is incorrect: {0}")]
    PosSystemIsIncorrect(String),

    /// The status decoded fine but ranks below the previous one.
    /// Callers treat this as "decoded but rejected", not as a hard failure.
    #[error("invalid status priority: {decoded} cannot follow {previous}")]
    InvalidStatusPriority {
        decoded: OrderStatus,
        previous: OrderStatus,
    },
}

/// A vendor status table
#[enum_dispatch]
pub trait StatusDecoder {
    /// Exhaustive `raw → canonical` table
    fn table(&self) -> &'static [(&'static str, OrderStatus)];

    fn decode(&self, raw: &str) -> Option<OrderStatus> {
        self.table()
            .iter()
            .find(|(known, _)| *known == raw)
            .map(|(_, status)| *status)
    }

    /// Fixed rank for vendors that forbid regressions; `None` disables the check
    fn rank(&self, _status: OrderStatus) -> Option<u8> {
        None
    }
}

/// PosDecoder enum - dispatches to the vendor table
///
/// Uses enum_dispatch for zero-cost static dispatch.
#[enum_dispatch(StatusDecoder)]
pub enum PosDecoder {
    Iiko(IikoDecoder),
    RKeeper(RKeeperDecoder),
    RKeeper7Xml(RKeeper7XmlDecoder),
    Jowi(JowiDecoder),
    Paloma(PalomaDecoder),
    BurgerKing(BurgerKingDecoder),
    Poster(PosterDecoder),
    Yaros(YarosDecoder),
    CtMax(CtMaxDecoder),
    FoodBand(FoodBandDecoder),
    Kwaaka(KwaakaDecoder),
}

impl PosDecoder {
    /// This is the ONLY place with a match on PosKind.
    pub fn for_kind(pos: PosKind) -> Option<Self> {
        let decoder = match pos {
            PosKind::Iiko => PosDecoder::Iiko(IikoDecoder),
            PosKind::RKeeper => PosDecoder::RKeeper(RKeeperDecoder),
            PosKind::RKeeper7Xml => PosDecoder::RKeeper7Xml(RKeeper7XmlDecoder),
            PosKind::Jowi => PosDecoder::Jowi(JowiDecoder),
            PosKind::Paloma => PosDecoder::Paloma(PalomaDecoder),
            PosKind::BurgerKing => PosDecoder::BurgerKing(BurgerKingDecoder),
            PosKind::Poster => PosDecoder::Poster(PosterDecoder),
            PosKind::Yaros => PosDecoder::Yaros(YarosDecoder),
            PosKind::CtMax => PosDecoder::CtMax(CtMaxDecoder),
            PosKind::FoodBand => PosDecoder::FoodBand(FoodBandDecoder),
            PosKind::Kwaaka => PosDecoder::Kwaaka(KwaakaDecoder),
            PosKind::Unknown => return None,
        };
        Some(decoder)
    }
}

/// Translate a raw POS status into the canonical vocabulary.
///
/// Pure and deterministic: identical inputs always give identical results.
pub fn translate(
    pos: PosKind,
    raw: &str,
    previous: OrderStatus,
) -> Result<OrderStatus, TranslateError> {
    let decoder = PosDecoder::for_kind(pos)
        .ok_or_else(|| TranslateError::PosSystemIsIncorrect(pos.to_string()))?;

    let decoded = decoder
        .decode(raw)
        .ok_or_else(|| TranslateError::StatusIsNotExist {
            pos,
            raw: raw.to_string(),
        })?;

    if let (Some(new_rank), Some(previous_rank)) = (decoder.rank(decoded), decoder.rank(previous))
        && new_rank < previous_rank
    {
        return Err(TranslateError::InvalidStatusPriority { decoded, previous });
    }

    Ok(decoded)
}

/// Translate with the POS given by name (webhook path segment, stored string)
pub fn translate_named(
    pos: &str,
    raw: &str,
    previous: OrderStatus,
) -> Result<OrderStatus, TranslateError> {
    let kind = pos
        .parse::<PosKind>()
        .map_err(|_| TranslateError::PosSystemIsIncorrect(pos.to_string()))?;
    translate(kind, raw, previous)
}
