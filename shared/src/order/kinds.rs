//! POS and aggregator identifiers
//!
//! Both enums carry an `Unknown` catch-all so that stored records written by
//! newer integrations still deserialize; the engine rejects them explicitly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Point-of-sale system that owns the kitchen side of an order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PosKind {
    /// iiko and its rebrand Syrve share one API
    #[serde(alias = "syrve")]
    Iiko,
    #[serde(rename = "rkeeper")]
    RKeeper,
    #[serde(rename = "rkeeper7_xml")]
    RKeeper7Xml,
    Jowi,
    Paloma,
    BurgerKing,
    Poster,
    Yaros,
    #[serde(rename = "ctmax")]
    CtMax,
    #[serde(rename = "foodband")]
    FoodBand,
    /// Orders handled by the platform itself (no external POS)
    Kwaaka,
    #[serde(other)]
    Unknown,
}

impl PosKind {
    pub const ALL: [PosKind; 11] = [
        PosKind::Iiko,
        PosKind::RKeeper,
        PosKind::RKeeper7Xml,
        PosKind::Jowi,
        PosKind::Paloma,
        PosKind::BurgerKing,
        PosKind::Poster,
        PosKind::Yaros,
        PosKind::CtMax,
        PosKind::FoodBand,
        PosKind::Kwaaka,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PosKind::Iiko => "iiko",
            PosKind::RKeeper => "rkeeper",
            PosKind::RKeeper7Xml => "rkeeper7_xml",
            PosKind::Jowi => "jowi",
            PosKind::Paloma => "paloma",
            PosKind::BurgerKing => "burger_king",
            PosKind::Poster => "poster",
            PosKind::Yaros => "yaros",
            PosKind::CtMax => "ctmax",
            PosKind::FoodBand => "foodband",
            PosKind::Kwaaka => "kwaaka",
            PosKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PosKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unsupported POS or aggregator name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported {kind}: {value}")]
pub struct UnknownKind {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for PosKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("syrve") {
            return Ok(PosKind::Iiko);
        }
        PosKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownKind {
                kind: "pos system",
                value: s.to_string(),
            })
    }
}

/// Order-intake platform ("aggregator") an order came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryService {
    Wolt,
    Glovo,
    Chocofood,
    Yandex,
    /// Generic external webhook integration
    Emenu,
    Talabat,
    Deliveroo,
    StarterApp,
    Kwaaka,
    QrMenu,
    #[serde(other)]
    Unknown,
}

impl DeliveryService {
    pub const ALL: [DeliveryService; 10] = [
        DeliveryService::Wolt,
        DeliveryService::Glovo,
        DeliveryService::Chocofood,
        DeliveryService::Yandex,
        DeliveryService::Emenu,
        DeliveryService::Talabat,
        DeliveryService::Deliveroo,
        DeliveryService::StarterApp,
        DeliveryService::Kwaaka,
        DeliveryService::QrMenu,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryService::Wolt => "wolt",
            DeliveryService::Glovo => "glovo",
            DeliveryService::Chocofood => "chocofood",
            DeliveryService::Yandex => "yandex",
            DeliveryService::Emenu => "emenu",
            DeliveryService::Talabat => "talabat",
            DeliveryService::Deliveroo => "deliveroo",
            DeliveryService::StarterApp => "starter_app",
            DeliveryService::Kwaaka => "kwaaka",
            DeliveryService::QrMenu => "qr_menu",
            DeliveryService::Unknown => "unknown",
        }
    }

    /// Internal channels never call an external aggregator
    pub fn is_internal(&self) -> bool {
        matches!(self, DeliveryService::Kwaaka | DeliveryService::QrMenu)
    }
}

impl fmt::Display for DeliveryService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryService {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeliveryService::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownKind {
                kind: "delivery service",
                value: s.to_string(),
            })
    }
}
