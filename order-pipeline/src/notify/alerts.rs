//! Operator alert channel
//!
//! Producers push [`OperatorAlert`]s through a bounded channel without ever
//! blocking the status path; the [`AlertWorker`] drains it into an [`AlertSink`].

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use super::NotifyError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorAlert {
    /// Order reached `FAILED`
    OrderFailed {
        order_id: String,
        store_id: String,
        reason: Option<String>,
    },
    /// An aggregator or 3PL call failed while handling a status update
    StatusUpdateFailed {
        order_id: String,
        store_id: String,
        error: String,
    },
    DeliveryCreationFailed {
        order_id: String,
        store_id: String,
        error: String,
    },
    /// Cooked order still has no courier
    NoDispatcher {
        order_id: String,
        store_id: String,
        waiting_minutes: i64,
    },
}

impl OperatorAlert {
    pub fn kind(&self) -> &'static str {
        match self {
            OperatorAlert::OrderFailed { .. } => "order_failed",
            OperatorAlert::StatusUpdateFailed { .. } => "status_update_failed",
            OperatorAlert::DeliveryCreationFailed { .. } => "delivery_creation_failed",
            OperatorAlert::NoDispatcher { .. } => "no_dispatcher",
        }
    }

    pub fn order_id(&self) -> &str {
        match self {
            OperatorAlert::OrderFailed { order_id, .. }
            | OperatorAlert::StatusUpdateFailed { order_id, .. }
            | OperatorAlert::DeliveryCreationFailed { order_id, .. }
            | OperatorAlert::NoDispatcher { order_id, .. } => order_id,
        }
    }
}

impl fmt::Display for OperatorAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatorAlert::OrderFailed {
                order_id,
                store_id,
                reason,
            } => write!(
                f,
                "order {order_id} (store {store_id}) failed: {}",
                reason.as_deref().unwrap_or("no detail")
            ),
            OperatorAlert::StatusUpdateFailed {
                order_id,
                store_id,
                error,
            } => write!(f, "status update for order {order_id} (store {store_id}) failed: {error}"),
            OperatorAlert::DeliveryCreationFailed {
                order_id,
                store_id,
                error,
            } => write!(f, "courier booking for order {order_id} (store {store_id}) failed: {error}"),
            OperatorAlert::NoDispatcher {
                order_id,
                store_id,
                waiting_minutes,
            } => write!(
                f,
                "order {order_id} (store {store_id}) has no courier after {waiting_minutes} min"
            ),
        }
    }
}

/// Producer half of the alert channel
#[derive(Clone)]
pub struct AlertSender {
    tx: mpsc::Sender<OperatorAlert>,
}

impl AlertSender {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<OperatorAlert>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Never blocks; a full or closed channel drops the alert with a warning
    pub fn send(&self, alert: OperatorAlert) {
        match self.tx.try_send(alert) {
            Ok(()) => {}
            Err(TrySendError::Full(alert)) => {
                tracing::warn!(kind = alert.kind(), order_id = %alert.order_id(), "Alert channel full, alert dropped");
            }
            Err(TrySendError::Closed(alert)) => {
                tracing::warn!(kind = alert.kind(), order_id = %alert.order_id(), "Alert channel closed, alert dropped");
            }
        }
    }
}

#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, alert: &OperatorAlert) -> Result<(), NotifyError>;
}

/// Writes alerts under the `operator_alert` target
pub struct TracingAlertSink;

#[async_trait]
impl AlertSink for TracingAlertSink {
    async fn deliver(&self, alert: &OperatorAlert) -> Result<(), NotifyError> {
        tracing::warn!(
            target: "operator_alert",
            kind = alert.kind(),
            order_id = %alert.order_id(),
            "{alert}"
        );
        Ok(())
    }
}

pub struct AlertWorker {
    sink: Arc<dyn AlertSink>,
}

impl AlertWorker {
    pub fn new(sink: Arc<dyn AlertSink>) -> Self {
        Self { sink }
    }

    /// Drain the channel until it closes or shutdown is requested
    pub async fn run(self, mut rx: mpsc::Receiver<OperatorAlert>, shutdown: CancellationToken) {
        tracing::info!("AlertWorker started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    // Flush what is already queued
                    while let Ok(alert) = rx.try_recv() {
                        self.deliver(&alert).await;
                    }
                    tracing::info!("AlertWorker received shutdown signal");
                    break;
                }
                alert = rx.recv() => {
                    match alert {
                        Some(alert) => self.deliver(&alert).await,
                        None => {
                            tracing::info!("Alert channel closed, shutting down AlertWorker");
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn deliver(&self, alert: &OperatorAlert) {
        if let Err(e) = self.sink.deliver(alert).await {
            tracing::error!(kind = alert.kind(), order_id = %alert.order_id(), error = %e, "Failed to deliver operator alert");
        }
    }
}
