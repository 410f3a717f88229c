//! Notifications
//!
//! - [`Notify`]: customer/tenant-facing status notification contract
//! - [`Notifiers`]: picks the chat notifier when the store has a linked chat,
//!   the message notifier otherwise
//! - [`alerts`]: operator alert channel (failed orders, failed calls)

pub mod alerts;

pub use alerts::{AlertSender, AlertSink, AlertWorker, OperatorAlert, TracingAlertSink};

use async_trait::async_trait;
use shared::models::{Store, StoreGroup};
use shared::order::{Order, OrderStatus};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    #[error("Notification channel closed")]
    Closed,
}

#[async_trait]
pub trait Notify: Send + Sync {
    /// Channel name used in logs
    fn channel(&self) -> &'static str;

    async fn notify(
        &self,
        status: OrderStatus,
        order: &Order,
        group: &StoreGroup,
        store: &Store,
    ) -> Result<(), NotifyError>;
}

/// Notifier pair resolved per store
#[derive(Clone)]
pub struct Notifiers {
    chat: Arc<dyn Notify>,
    message: Arc<dyn Notify>,
}

impl Notifiers {
    pub fn new(chat: Arc<dyn Notify>, message: Arc<dyn Notify>) -> Self {
        Self { chat, message }
    }

    /// Both channels write structured log lines
    pub fn tracing() -> Self {
        Self::new(
            Arc::new(TracingNotifier::new("chat")),
            Arc::new(TracingNotifier::new("message")),
        )
    }

    pub fn resolve(&self, store: &Store) -> Arc<dyn Notify> {
        match store.notification_chat_id.as_deref() {
            Some(chat_id) if !chat_id.is_empty() => self.chat.clone(),
            _ => self.message.clone(),
        }
    }
}

/// Notifier that only logs
pub struct TracingNotifier {
    channel: &'static str,
}

impl TracingNotifier {
    pub fn new(channel: &'static str) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl Notify for TracingNotifier {
    fn channel(&self) -> &'static str {
        self.channel
    }

    async fn notify(
        &self,
        status: OrderStatus,
        order: &Order,
        group: &StoreGroup,
        store: &Store,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            channel = self.channel,
            order_id = %order.id,
            store_id = %store.id,
            group = %group.name,
            status = %status,
            "Order status notification"
        );
        Ok(())
    }
}
