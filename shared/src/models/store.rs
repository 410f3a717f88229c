//! Store Model
//!
//! Per-tenant configuration read by the status engine: aggregator settings,
//! status override tables and 3PL dispatch settings.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use crate::order::{Address, DeliveryService, OrderStatus, PosKind};

/// Store-specific projection entry: canonical `pos_status` maps to the
/// aggregator-native `status` (an empty `status` suppresses the call)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusOverride {
    pub pos_status: OrderStatus,
    pub status: String,
}

/// Override bucket selected by purchase semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseBucket {
    Instant,
    Preorder,
    Takeaway,
}

impl fmt::Display for PurchaseBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurchaseBucket::Instant => write!(f, "instant"),
            PurchaseBucket::Preorder => write!(f, "preorder"),
            PurchaseBucket::Takeaway => write!(f, "takeaway"),
        }
    }
}

/// Override tables keyed by purchase type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PurchaseTypes {
    #[serde(default)]
    pub instant: Vec<StatusOverride>,
    #[serde(default)]
    pub preorder: Vec<StatusOverride>,
    #[serde(default)]
    pub takeaway: Vec<StatusOverride>,
}

impl PurchaseTypes {
    pub fn bucket(&self, bucket: PurchaseBucket) -> &[StatusOverride] {
        match bucket {
            PurchaseBucket::Instant => &self.instant,
            PurchaseBucket::Preorder => &self.preorder,
            PurchaseBucket::Takeaway => &self.takeaway,
        }
    }

    /// At most one entry per canonical status inside a bucket
    pub fn validate(&self) -> Result<(), StoreConfigError> {
        for bucket in [
            PurchaseBucket::Instant,
            PurchaseBucket::Preorder,
            PurchaseBucket::Takeaway,
        ] {
            let mut seen = HashSet::new();
            for entry in self.bucket(bucket) {
                if !seen.insert(entry.pos_status) {
                    return Err(StoreConfigError::DuplicateOverride {
                        bucket,
                        status: entry.pos_status,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Per-aggregator store settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AggregatorSettings {
    #[serde(default)]
    pub send_to_pos: bool,
    /// Never push status changes to this aggregator
    #[serde(default)]
    pub ignore_status_update: bool,
    /// The aggregator accepts orders on its own
    #[serde(default)]
    pub auto_accept_on: bool,
    /// The store delivers with its own couriers
    #[serde(default)]
    pub is_self_delivery: bool,
    #[serde(default)]
    pub purchase_types: PurchaseTypes,
    /// Target of status callbacks for webhook integrations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

/// 3PL courier dispatch settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ThreePlSettings {
    #[serde(default)]
    pub is_3pl: bool,
    /// Provider availability flags; an empty map enables every provider
    #[serde(default)]
    pub providers: BTreeMap<String, bool>,
    #[serde(default)]
    pub taxi_class: String,
}

impl ThreePlSettings {
    pub fn is_provider_enabled(&self, provider: &str) -> bool {
        self.providers.is_empty() || self.providers.get(provider).copied().unwrap_or(false)
    }

    pub fn enabled_providers(&self) -> Vec<String> {
        self.providers
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Store entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Store {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub group_id: String,
    pub pos_type: PosKind,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub aggregators: HashMap<DeliveryService, AggregatorSettings>,
    #[serde(default)]
    pub kwaaka_3pl: ThreePlSettings,
    /// Parent orders submit once on behalf of their children
    #[serde(default)]
    pub defer_submission: bool,
    /// Linked chat for order notifications
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_chat_id: Option<String>,
    /// Expected cooking time used to compute pickup times
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooking_time_minutes: Option<u32>,
}

impl Store {
    pub fn new(id: impl Into<String>, name: impl Into<String>, pos_type: PosKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            group_id: String::new(),
            pos_type,
            address: Address::default(),
            phone: String::new(),
            aggregators: HashMap::new(),
            kwaaka_3pl: ThreePlSettings::default(),
            defer_submission: false,
            notification_chat_id: None,
            cooking_time_minutes: None,
        }
    }

    pub fn settings(&self, service: DeliveryService) -> Option<&AggregatorSettings> {
        self.aggregators.get(&service)
    }

    pub fn purchase_types(&self, service: DeliveryService) -> Option<&PurchaseTypes> {
        self.settings(service).map(|s| &s.purchase_types)
    }

    pub fn is_3pl(&self) -> bool {
        self.kwaaka_3pl.is_3pl
    }

    pub fn validate(&self) -> Result<(), StoreConfigError> {
        for (service, settings) in &self.aggregators {
            settings
                .purchase_types
                .validate()
                .map_err(|e| StoreConfigError::Aggregator {
                    service: *service,
                    source: Box::new(e),
                })?;
        }
        Ok(())
    }
}

/// Group of stores owned by one tenant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StoreGroup {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub store_ids: Vec<String>,
}

/// Store configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreConfigError {
    #[error("duplicate override for {status} in {bucket} bucket")]
    DuplicateOverride {
        bucket: PurchaseBucket,
        status: OrderStatus,
    },

    #[error("invalid {service} settings: {source}")]
    Aggregator {
        service: DeliveryService,
        #[source]
        source: Box<StoreConfigError>,
    },
}
