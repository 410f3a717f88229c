//! Cron scans
//!
//! Periodic re-scans of open orders. Each scan reads one bounded batch,
//! keeps going when a single order fails, and checks the shutdown token
//! between orders.
//!
//! | Scan                                   | Action                             |
//! |----------------------------------------|------------------------------------|
//! | `bulk_create_3pl_order`                | book couriers for cooked orders    |
//! | `performer_lookup_more_than_15_minute` | re-bid stalled courier searches    |
//! | `no_dispatcher_message`                | alert on cooked orders w/o courier |
//! | `auto_close`                           | close idle finished orders         |

use chrono::{Duration as ChronoDuration, Utc};
use shared::models::{DeliveryStatus, Store};
use shared::order::{Order, OrderStatus};
use shared::util::minutes_since;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::selector::{CreateOutcome, DispatchSelector, RebidOutcome};
use crate::notify::{AlertSender, OperatorAlert};
use crate::repository::{
    OrderQuery, OrderRepository, OrderSelector, RepoError, StatusTransition, StoreRepository,
};

/// Cooked and waiting for a courier
const AWAITING_COURIER: &[OrderStatus] = &[OrderStatus::CookingComplete, OrderStatus::ReadyForPickup];

/// Cooking is over; the order only waits to be closed
const POST_COOKING: &[OrderStatus] = &[
    OrderStatus::CookingComplete,
    OrderStatus::ReadyForPickup,
    OrderStatus::OnWay,
    OrderStatus::OutForDelivery,
    OrderStatus::PickedUpByCustomer,
    OrderStatus::Delivered,
];

#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub interval: Duration,
    pub batch_limit: usize,
    pub performer_lookup_minutes: i64,
    pub no_dispatcher_minutes: i64,
    pub auto_close_after_hours: i64,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            batch_limit: 200,
            performer_lookup_minutes: 15,
            no_dispatcher_minutes: 10,
            auto_close_after_hours: 12,
        }
    }
}

/// Per-run counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub scanned: usize,
    pub processed: usize,
    pub failed: usize,
}

pub struct CronScheduler {
    orders: Arc<dyn OrderRepository>,
    stores: Arc<dyn StoreRepository>,
    /// `None` when 3PL is not configured; the delivery scans are then no-ops
    dispatch: Option<Arc<DispatchSelector>>,
    alerts: AlertSender,
    settings: ScanSettings,
}

impl CronScheduler {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        stores: Arc<dyn StoreRepository>,
        dispatch: Option<Arc<DispatchSelector>>,
        alerts: AlertSender,
        settings: ScanSettings,
    ) -> Self {
        Self {
            orders,
            stores,
            dispatch,
            alerts,
            settings,
        }
    }

    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(interval_secs = self.settings.interval.as_secs(), "CronScheduler started");
        let mut interval = tokio::time::interval(self.settings.interval);
        // First tick fires immediately; skip it so startup is not a scan storm
        interval.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("CronScheduler received shutdown signal");
                    break;
                }
                _ = interval.tick() => {
                    self.run_all(&shutdown).await;
                }
            }
        }
    }

    /// One pass of every scan
    pub async fn run_all(&self, shutdown: &CancellationToken) {
        let scans = [
            ("bulk_create_3pl_order", self.bulk_create_3pl_order(shutdown).await),
            (
                "performer_lookup_more_than_15_minute",
                self.performer_lookup_more_than_15_minute(shutdown).await,
            ),
            ("no_dispatcher_message", self.no_dispatcher_message(shutdown).await),
            ("auto_close", self.auto_close(shutdown).await),
        ];
        for (scan, result) in scans {
            match result {
                Ok(report) if report.scanned > 0 => tracing::info!(
                    scan,
                    scanned = report.scanned,
                    processed = report.processed,
                    failed = report.failed,
                    "Cron scan finished"
                ),
                Ok(_) => {}
                Err(e) => tracing::error!(scan, error = %e, "Cron scan failed"),
            }
        }
    }

    /// Book couriers for cooked 3PL orders that have none yet
    pub async fn bulk_create_3pl_order(
        &self,
        shutdown: &CancellationToken,
    ) -> Result<ScanReport, RepoError> {
        let Some(dispatch) = &self.dispatch else {
            return Ok(ScanReport::default());
        };
        let stores = self.three_pl_stores().await?;
        if stores.is_empty() {
            return Ok(ScanReport::default());
        }

        let orders = self
            .orders
            .get_all_orders(&OrderQuery {
                statuses: AWAITING_COURIER.to_vec(),
                store_ids: stores.keys().cloned().collect(),
                has_delivery: Some(false),
                send_courier: Some(false),
                picked_up_by_customer: Some(false),
                marketplace: Some(false),
                limit: Some(self.settings.batch_limit),
                ..Default::default()
            })
            .await?;

        let mut report = ScanReport::default();
        for order in orders {
            if shutdown.is_cancelled() {
                break;
            }
            report.scanned += 1;
            let Some(store) = stores.get(&order.store_id) else {
                continue;
            };
            match dispatch.select_and_create(&order, store).await {
                Ok(CreateOutcome::Enqueued) => report.processed += 1,
                Ok(CreateOutcome::Skipped(_)) => {}
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(order_id = %order.id, store_id = %order.store_id, error = %e, "Bulk courier booking failed");
                }
            }
        }
        Ok(report)
    }

    /// Re-bid deliveries stuck looking for a performer
    pub async fn performer_lookup_more_than_15_minute(
        &self,
        shutdown: &CancellationToken,
    ) -> Result<ScanReport, RepoError> {
        let Some(dispatch) = &self.dispatch else {
            return Ok(ScanReport::default());
        };
        let stores = self.three_pl_stores().await?;
        if stores.is_empty() {
            return Ok(ScanReport::default());
        }

        let orders = self
            .orders
            .get_all_orders(&OrderQuery {
                store_ids: stores.keys().cloned().collect(),
                has_delivery: Some(true),
                open_only: true,
                limit: Some(self.settings.batch_limit),
                ..Default::default()
            })
            .await?;

        let now = Utc::now();
        let mut report = ScanReport::default();
        for order in orders {
            if shutdown.is_cancelled() {
                break;
            }
            report.scanned += 1;
            let Some(store) = stores.get(&order.store_id) else {
                continue;
            };

            let delivery = match dispatch.delivery_info(&order).await {
                Ok(delivery) => delivery,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(order_id = %order.id, error = %e, "Failed to load delivery info");
                    continue;
                }
            };
            if delivery.status != DeliveryStatus::PerformerLookup {
                continue;
            }
            let since = delivery
                .status_entered_at(DeliveryStatus::PerformerLookup)
                .unwrap_or(delivery.created_at);
            if minutes_since(since, now) < self.settings.performer_lookup_minutes {
                continue;
            }

            match dispatch.cancel_and_rebid(&order, store).await {
                Ok(RebidOutcome::Rebid { .. }) => report.processed += 1,
                Ok(outcome) => {
                    tracing::debug!(order_id = %order.id, outcome = ?outcome, "Rebid not performed")
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(order_id = %order.id, error = %e, "Rebid failed");
                }
            }
        }
        Ok(report)
    }

    /// Alert operators about cooked 3PL orders still without a courier
    pub async fn no_dispatcher_message(
        &self,
        shutdown: &CancellationToken,
    ) -> Result<ScanReport, RepoError> {
        let stores = self.three_pl_stores().await?;
        if stores.is_empty() {
            return Ok(ScanReport::default());
        }

        let orders = self
            .orders
            .get_all_orders(&OrderQuery {
                statuses: AWAITING_COURIER.to_vec(),
                store_ids: stores.keys().cloned().collect(),
                has_dispatcher: Some(false),
                picked_up_by_customer: Some(false),
                limit: Some(self.settings.batch_limit),
                ..Default::default()
            })
            .await?;

        let now = Utc::now();
        let mut report = ScanReport::default();
        for order in orders {
            if shutdown.is_cancelled() {
                break;
            }
            report.scanned += 1;
            let waiting = minutes_since(cooked_at(&order), now);
            if waiting < self.settings.no_dispatcher_minutes {
                continue;
            }
            self.alerts.send(OperatorAlert::NoDispatcher {
                order_id: order.id.clone(),
                store_id: order.store_id.clone(),
                waiting_minutes: waiting,
            });
            report.processed += 1;
        }
        Ok(report)
    }

    /// Close orders that sat in a post-cooking status for too long
    pub async fn auto_close(&self, shutdown: &CancellationToken) -> Result<ScanReport, RepoError> {
        let cutoff = Utc::now() - ChronoDuration::hours(self.settings.auto_close_after_hours);
        let orders = self
            .orders
            .get_all_orders(&OrderQuery {
                statuses: POST_COOKING.to_vec(),
                updated_before: Some(cutoff),
                limit: Some(self.settings.batch_limit),
                ..Default::default()
            })
            .await?;

        let mut report = ScanReport::default();
        for order in orders {
            if shutdown.is_cancelled() {
                break;
            }
            report.scanned += 1;
            let transition = StatusTransition {
                expected: order.status,
                status: OrderStatus::Closed,
                error_detail: None,
                at: Utc::now(),
            };
            match self
                .orders
                .update_order_status(&OrderSelector::Id(order.id.clone()), &transition)
                .await
            {
                Ok(_) => {
                    report.processed += 1;
                    tracing::info!(order_id = %order.id, previous = %order.status, "Order auto-closed");
                }
                // Moved on since the scan read it
                Err(RepoError::Conflict { .. }) => {}
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(order_id = %order.id, error = %e, "Auto-close failed");
                }
            }
        }
        Ok(report)
    }

    async fn three_pl_stores(&self) -> Result<HashMap<String, Store>, RepoError> {
        Ok(self
            .stores
            .list_stores()
            .await?
            .into_iter()
            .filter(Store::is_3pl)
            .map(|store| (store.id.clone(), store))
            .collect())
    }
}

fn cooked_at(order: &Order) -> chrono::DateTime<Utc> {
    order
        .status_entered_at(OrderStatus::CookingComplete)
        .unwrap_or_else(|| order.last_status_change())
}
