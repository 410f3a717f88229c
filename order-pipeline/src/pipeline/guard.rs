//! Submission guards
//!
//! Pre-conditions evaluated after projection and before any aggregator call.
//! A guard never fails the update; it turns it into [`Gate::Skip`].
//!
//! | Order | Guard               | Applies to                    |
//! |-------|---------------------|-------------------------------|
//! | 1     | empty projection    | every aggregator              |
//! | 2     | deferred submission | child orders of defer stores  |
//! | 3     | idempotence         | Wolt                          |

use serde::Serialize;
use shared::models::Store;
use shared::order::{DeliveryService, Order};
use std::fmt;

use crate::aggregator::projection::{OrderAttrs, Projection, glovo, project, wolt};

/// Why an update did not reach the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Projected status maps to no aggregator call
    NoAction,
    /// Parent order submits on behalf of this child
    DeferredSubmission,
    /// Aggregator already reached the projected status
    AlreadySubmitted,
    IgnoredByStore,
    /// Aggregator accepts on its own
    AutoAccepted,
    /// Decoded status ranks below the current one
    StalePriority,
    OrderFailed,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NoAction => "no_action",
            SkipReason::DeferredSubmission => "deferred_submission",
            SkipReason::AlreadySubmitted => "already_submitted",
            SkipReason::IgnoredByStore => "ignored_by_store",
            SkipReason::AutoAccepted => "auto_accepted",
            SkipReason::StalePriority => "stale_priority",
            SkipReason::OrderFailed => "order_failed",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Proceed,
    Skip(SkipReason),
}

/// Native statuses a deferred child order may still submit
const DEFERRED_PASS_THROUGH: &[&str] = &[wolt::READY, glovo::READY_FOR_PICKUP];

/// Whether the order itself should submit `native`
pub fn should_submit(order: &Order, store: &Store, native: &str) -> bool {
    if store.defer_submission && order.defer_submission {
        return DEFERRED_PASS_THROUGH.contains(&native);
    }
    true
}

/// Wolt idempotence check.
///
/// Projects every history entry before the current one with the same order and
/// store context; the update is redundant when any of them already produced
/// the current native status, or when the current one is empty. Orders from
/// other aggregators always need the update.
pub fn needs_update(order: &Order, store: &Store) -> bool {
    if order.delivery_service != DeliveryService::Wolt {
        return true;
    }

    let attrs = OrderAttrs::from(order);
    let overrides = store.purchase_types(DeliveryService::Wolt);
    let current = project(DeliveryService::Wolt, order.status, &attrs, overrides);
    if current.is_empty() {
        return false;
    }

    let preceding = &order.statuses_history[..order.statuses_history.len().saturating_sub(1)];
    !preceding.iter().any(|entry| {
        project(DeliveryService::Wolt, entry.name, &attrs, overrides).native == current.native
    })
}

/// Evaluate the guards in order; the first suppression wins
pub fn submission_gate(order: &Order, store: &Store, projection: &Projection) -> Gate {
    if projection.is_empty() {
        return Gate::Skip(SkipReason::NoAction);
    }
    if !should_submit(order, store, &projection.native) {
        return Gate::Skip(SkipReason::DeferredSubmission);
    }
    if !needs_update(order, store) {
        return Gate::Skip(SkipReason::AlreadySubmitted);
    }
    Gate::Proceed
}
