//! WebhookClient - status callbacks for external webhook integrations
//!
//! External integrations (`emenu`) have no lifecycle API of their own; every
//! status change is POSTed to the webhook url configured on the store.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use shared::models::Store;
use shared::order::{DeliveryService, Order};
use std::time::Duration;

use super::client::{AggregatorClient, AggregatorError, AggregatorResult};

/// Callback body sent to the webhook url
#[derive(Debug, Serialize)]
struct StatusCallback<'a> {
    order_id: &'a str,
    store_id: &'a str,
    status: &'a str,
}

pub struct WebhookClient {
    client: Client,
}

impl WebhookClient {
    pub fn new(timeout: Duration) -> Result<Self, AggregatorError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AggregatorError::Http(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl AggregatorClient for WebhookClient {
    fn service(&self) -> DeliveryService {
        DeliveryService::Emenu
    }

    async fn update_order_status(
        &self,
        order: &Order,
        store: &Store,
        status: &str,
    ) -> AggregatorResult<()> {
        let Some(url) = store
            .settings(DeliveryService::Emenu)
            .and_then(|s| s.webhook_url.as_deref())
        else {
            tracing::warn!(
                order_id = %order.id,
                store_id = %store.id,
                "No webhook url configured"
            );
            return Err(AggregatorError::Rejected(format!(
                "no webhook url configured for store {}",
                store.id
            )));
        };

        let body = StatusCallback {
            order_id: &order.order_id,
            store_id: &store.id,
            status,
        };

        let response = self.client.post(url).json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                AggregatorError::Timeout
            } else {
                AggregatorError::Http(format!("Webhook request failed: {e}"))
            }
        })?;

        if !response.status().is_success() {
            let code = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AggregatorError::Rejected(format!(
                "Webhook responded with {code}: {text}"
            )));
        }

        tracing::debug!(order_id = %order.id, status = %status, "Webhook status delivered");
        Ok(())
    }
}
