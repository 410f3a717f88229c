//! OrderStatusWorkflow - one inbound POS status event, end to end
//!
//! ```text
//! StatusEvent
//!   │ resolve order (per-POS key) + store
//!   │ translate ─────────── StatusIsNotExist ──▶ Err
//!   │                      InvalidStatusPriority ─▶ Skip(StalePriority)
//!   │ queue check ───────── violation ──▶ Err(ValidateOrderStatusQueue)
//!   │ persist (CAS on previous status)
//!   │ FAILED ───────────── alert ──▶ Skip(OrderFailed)
//!   │ 3PL (cancel on POS cancellation, else select-and-create)
//!   │ project
//!   │ internal channel ─── notify ──▶ Proceed
//!   │ store settings + submission gate ──▶ Skip(..)
//!   ▼ aggregator call (Unsupported counts as success)
//! ```

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use shared::models::Store;
use shared::order::{Order, OrderStatus, PosKind};
use std::sync::Arc;
use std::time::Duration;

use super::error::WorkflowError;
use super::guard::{Gate, SkipReason, submission_gate};
use super::queue::is_monotonic;
use crate::aggregator::{
    AggregatorAction, AggregatorClient, AggregatorError, AggregatorRegistry, OrderAttrs,
    Projection, project, reject_reason, resolve,
};
use crate::dispatch::DispatchSelector;
use crate::notify::{AlertSender, Notifiers, OperatorAlert};
use crate::pos::{TranslateError, translate};
use crate::repository::{
    OrderRepository, OrderSelector, RepoError, StatusTransition, StoreRepository,
};

/// Raw status event as delivered by a POS webhook
#[derive(Debug, Clone)]
pub struct StatusEvent {
    pub pos: PosKind,
    /// Order key in the POS's own identifier scheme
    pub reference: String,
    pub raw_status: String,
    pub error_detail: Option<String>,
}

/// Result of a handled event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Proceed {
        status: OrderStatus,
        /// Aggregator-native status, empty for none
        native: String,
        /// Call made on the aggregator, if any
        #[serde(skip_serializing_if = "Option::is_none")]
        action: Option<String>,
    },
    Skip {
        status: OrderStatus,
        reason: SkipReason,
    },
}

impl Outcome {
    pub fn status(&self) -> OrderStatus {
        match self {
            Outcome::Proceed { status, .. } | Outcome::Skip { status, .. } => *status,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    /// Deadline for a single aggregator call
    pub outbound_timeout: Duration,
    /// Cooking time used for pickup when the store has none
    pub default_cooking_minutes: i64,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            outbound_timeout: Duration::from_secs(10),
            default_cooking_minutes: 20,
        }
    }
}

pub struct OrderStatusWorkflow {
    orders: Arc<dyn OrderRepository>,
    stores: Arc<dyn StoreRepository>,
    registry: AggregatorRegistry,
    /// `None` when 3PL is not configured
    dispatch: Option<Arc<DispatchSelector>>,
    notifiers: Notifiers,
    alerts: AlertSender,
    settings: WorkflowSettings,
}

impl OrderStatusWorkflow {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        stores: Arc<dyn StoreRepository>,
        registry: AggregatorRegistry,
        dispatch: Option<Arc<DispatchSelector>>,
        notifiers: Notifiers,
        alerts: AlertSender,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            orders,
            stores,
            registry,
            dispatch,
            notifiers,
            alerts,
            settings,
        }
    }

    /// Handle one POS status event
    pub async fn update_order_status(&self, event: &StatusEvent) -> Result<Outcome, WorkflowError> {
        let selector = OrderSelector::for_pos(event.pos, event.reference.clone());
        let order = self.orders.get_order(&selector).await.inspect_err(|e| {
            tracing::warn!(pos = %event.pos, selector = %selector, error = %e, "Order lookup failed");
            // Store is unknown until the order resolves
            self.alert_failure(&event.reference, "", format!("order lookup failed: {e}"));
        })?;
        let store = self.stores.find_store(&order.store_id).await.inspect_err(|e| {
            tracing::warn!(order_id = %order.id, store_id = %order.store_id, error = %e, "Store lookup failed");
            self.alert_failure(&order.id, &order.store_id, format!("store lookup failed: {e}"));
        })?;

        let status = match translate(event.pos, &event.raw_status, order.status) {
            Ok(status) => status,
            Err(TranslateError::InvalidStatusPriority { decoded, previous }) => {
                tracing::info!(
                    order_id = %order.id,
                    decoded = %decoded,
                    previous = %previous,
                    "Stale status ignored"
                );
                return Ok(Outcome::Skip {
                    status: decoded,
                    reason: SkipReason::StalePriority,
                });
            }
            Err(e) => {
                tracing::warn!(order_id = %order.id, raw_status = %event.raw_status, error = %e, "Status translation failed");
                return Err(e.into());
            }
        };

        if !is_monotonic(order.status, status, event.pos) {
            tracing::warn!(order_id = %order.id, previous = %order.status, status = %status, "Status queue violation");
            return Err(WorkflowError::ValidateOrderStatusQueue {
                previous: order.status,
                new: status,
            });
        }

        let transition = StatusTransition {
            expected: order.status,
            status,
            error_detail: event.error_detail.clone(),
            at: Utc::now(),
        };
        let order = self
            .orders
            .update_order_status(&OrderSelector::Id(order.id.clone()), &transition)
            .await
            .inspect_err(|e| {
                tracing::error!(order_id = %order.id, store_id = %store.id, status = %status, error = %e, "Failed to persist status");
                // A lost race means another event already moved the order
                if !matches!(e, RepoError::Conflict { .. }) {
                    self.alert_failure(&order.id, &store.id, format!("status not persisted: {e}"));
                }
            })?;
        tracing::info!(
            order_id = %order.id,
            store_id = %store.id,
            service = %order.delivery_service,
            status = %status,
            "Order status updated"
        );

        if status == OrderStatus::Failed {
            self.alerts.send(OperatorAlert::OrderFailed {
                order_id: order.id.clone(),
                store_id: store.id.clone(),
                reason: event.error_detail.clone(),
            });
            return Ok(Outcome::Skip {
                status,
                reason: SkipReason::OrderFailed,
            });
        }

        self.forward_to_3pl(&order, &store).await?;

        let attrs = OrderAttrs::from(&order);
        let projection = project(
            order.delivery_service,
            status,
            &attrs,
            store.purchase_types(order.delivery_service),
        );

        if order.delivery_service.is_internal() {
            let group = self.stores.find_store_group(&store.id).await?;
            let notifier = self.notifiers.resolve(&store);
            notifier.notify(status, &order, &group, &store).await.inspect_err(|e| {
                tracing::error!(order_id = %order.id, channel = notifier.channel(), error = %e, "Notification failed");
            })?;
            return Ok(Outcome::Proceed {
                status,
                native: projection.native,
                action: None,
            });
        }

        self.submit(&order, &store, projection).await
    }

    async fn forward_to_3pl(&self, order: &Order, store: &Store) -> Result<(), WorkflowError> {
        let Some(dispatch) = &self.dispatch else {
            return Ok(());
        };
        if !store.is_3pl() {
            return Ok(());
        }

        let result = if order.status == OrderStatus::CancelledByPosSystem {
            dispatch.cancel_delivery(order).await.map(|_| ())
        } else {
            dispatch.select_and_create(order, store).await.map(|_| ())
        };

        result.map_err(|e| {
            tracing::error!(order_id = %order.id, store_id = %store.id, error = %e, "3PL dispatch failed");
            self.alert_failure(&order.id, &store.id, e.to_string());
            e.into()
        })
    }

    fn alert_failure(&self, order_id: &str, store_id: &str, error: String) {
        self.alerts.send(OperatorAlert::StatusUpdateFailed {
            order_id: order_id.to_string(),
            store_id: store_id.to_string(),
            error,
        });
    }

    /// Store settings, submission gate, then the aggregator call
    async fn submit(
        &self,
        order: &Order,
        store: &Store,
        projection: Projection,
    ) -> Result<Outcome, WorkflowError> {
        let service = order.delivery_service;
        let status = projection.status;
        let skip = |reason: SkipReason| -> Result<Outcome, WorkflowError> {
            tracing::debug!(order_id = %order.id, status = %status, reason = %reason, "Aggregator call skipped");
            Ok(Outcome::Skip { status, reason })
        };

        let settings = store.settings(service);
        if settings.is_some_and(|s| s.ignore_status_update) {
            return skip(SkipReason::IgnoredByStore);
        }
        if let Gate::Skip(reason) = submission_gate(order, store, &projection) {
            return skip(reason);
        }
        let Some(action) = resolve(service, &projection.native) else {
            return skip(SkipReason::NoAction);
        };
        if settings.is_some_and(|s| s.auto_accept_on)
            && matches!(action, AggregatorAction::Accept | AggregatorAction::Confirm)
        {
            return skip(SkipReason::AutoAccepted);
        }

        let client = self
            .registry
            .get(service)
            .ok_or(WorkflowError::ClientNotRegistered(service))?;

        match self.invoke(client.as_ref(), &action, order, store).await {
            Ok(()) => {
                tracing::info!(order_id = %order.id, service = %service, action = %action, "Aggregator call succeeded");
            }
            Err(e) if e.is_unsupported() => {
                tracing::debug!(order_id = %order.id, service = %service, action = %action, "Aggregator has no such call");
            }
            Err(e) => {
                tracing::error!(order_id = %order.id, store_id = %store.id, service = %service, action = %action, error = %e, "Aggregator call failed");
                self.alert_failure(&order.id, &store.id, e.to_string());
                return Err(WorkflowError::Aggregator {
                    service,
                    action: action.to_string(),
                    source: e,
                });
            }
        }

        Ok(Outcome::Proceed {
            status,
            native: projection.native,
            action: Some(action.to_string()),
        })
    }

    /// This is the ONLY place with a match on AggregatorAction.
    async fn invoke(
        &self,
        client: &dyn AggregatorClient,
        action: &AggregatorAction,
        order: &Order,
        store: &Store,
    ) -> Result<(), AggregatorError> {
        let self_delivery = store
            .settings(order.delivery_service)
            .is_some_and(|s| s.is_self_delivery);

        let call = async {
            match action {
                AggregatorAction::Accept if self_delivery => {
                    client
                        .accept_self_delivery_order(order, store, self.pickup_time(order, store))
                        .await
                }
                AggregatorAction::Accept => {
                    client
                        .accept_order(order, store, self.pickup_time(order, store))
                        .await
                }
                AggregatorAction::Reject => {
                    client
                        .reject_order(order, store, reject_reason(order.delivery_service))
                        .await
                }
                AggregatorAction::Ready => client.mark_order(order, store).await,
                AggregatorAction::Confirm => client.confirm_pre_order(order, store).await,
                AggregatorAction::Delivered => client.delivered_order(order, store).await,
                AggregatorAction::UpdateStatus(native) => {
                    client.update_order_status(order, store, native).await
                }
            }
        };

        tokio::time::timeout(self.settings.outbound_timeout, call)
            .await
            .map_err(|_| AggregatorError::Timeout)?
    }

    fn pickup_time(&self, order: &Order, store: &Store) -> DateTime<Utc> {
        order.pickup_time.unwrap_or_else(|| {
            let minutes = store
                .cooking_time_minutes
                .map(i64::from)
                .unwrap_or(self.settings.default_cooking_minutes);
            Utc::now() + ChronoDuration::minutes(minutes)
        })
    }
}
