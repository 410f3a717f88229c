//! HttpThreePlClient - reqwest implementation of the 3PL contract
//!
//! Endpoints (relative to `THREE_PL_BASE_URL`):
//!
//! | Operation                  | Method | Path                                   |
//! |----------------------------|--------|----------------------------------------|
//! | create                     | POST   | `/v1/deliveries`                       |
//! | cancel                     | POST   | `/v1/deliveries/{id}/cancel`           |
//! | cancel courier search      | POST   | `/v1/deliveries/{id}/cancel-search`    |
//! | list potential providers   | POST   | `/v1/providers/quotes`                 |
//! | delivery info by order id  | GET    | `/v1/deliveries/by-order/{order_id}`   |

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::models::{Delivery3plOrder, DeliveryRequest, Proposal};
use std::time::Duration;

use super::client::{ThreePlClient, ThreePlError, ThreePlResult};

pub struct HttpThreePlClient {
    client: Client,
    base_url: String,
}

impl HttpThreePlClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ThreePlResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ThreePlError::Http(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: Response) -> ThreePlResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND {
            return Err(ThreePlError::NotFound(body));
        }
        Err(ThreePlError::Rejected(format!("{status}: {body}")))
    }

    async fn json<T: DeserializeOwned>(response: Response) -> ThreePlResult<T> {
        Self::check(response)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ThreePlError::Http(format!("Invalid 3PL response: {e}")))
    }
}

fn transport(e: reqwest::Error) -> ThreePlError {
    if e.is_timeout() {
        ThreePlError::Timeout
    } else {
        ThreePlError::Http(e.to_string())
    }
}

#[async_trait]
impl ThreePlClient for HttpThreePlClient {
    async fn create_3pl_order(&self, request: &DeliveryRequest) -> ThreePlResult<Delivery3plOrder> {
        let response = self
            .client
            .post(self.url("/v1/deliveries"))
            .json(request)
            .send()
            .await
            .map_err(transport)?;
        Self::json(response).await
    }

    async fn cancel_3pl_order(&self, delivery_id: &str) -> ThreePlResult<()> {
        let response = self
            .client
            .post(self.url(&format!("/v1/deliveries/{delivery_id}/cancel")))
            .send()
            .await
            .map_err(transport)?;
        Self::check(response).await.map(|_| ())
    }

    async fn cancel_courier_search(&self, delivery_id: &str) -> ThreePlResult<()> {
        let response = self
            .client
            .post(self.url(&format!("/v1/deliveries/{delivery_id}/cancel-search")))
            .send()
            .await
            .map_err(transport)?;
        Self::check(response).await.map(|_| ())
    }

    async fn list_potential_providers(&self, request: &DeliveryRequest) -> ThreePlResult<Vec<Proposal>> {
        let response = self
            .client
            .post(self.url("/v1/providers/quotes"))
            .json(request)
            .send()
            .await
            .map_err(transport)?;
        Self::json(response).await
    }

    async fn get_delivery_info_by_order_id(&self, order_id: &str) -> ThreePlResult<Delivery3plOrder> {
        let response = self
            .client
            .get(self.url(&format!("/v1/deliveries/by-order/{order_id}")))
            .send()
            .await
            .map_err(transport)?;
        Self::json(response).await
    }
}
