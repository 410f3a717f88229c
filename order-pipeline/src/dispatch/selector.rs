//! ThreePL dispatch selector
//!
//! Owns every decision about courier bookings for an order:
//!
//! - `select_and_create`: first booking, queued for the [`DeliveryWorker`]
//! - `cancel_and_rebid`: swap a stalled provider for the best alternative
//! - `cancel_delivery`: drop the booking when the POS cancels the order
//!
//! Proposal retrieval is best-effort everywhere; booking and cancellation
//! errors are returned to the caller.
//!
//! [`DeliveryWorker`]: super::worker::DeliveryWorker

use chrono::Utc;
use shared::models::{
    CancelState, Delivery3plOrder, DeliveryRequest, DeliveryStatus, DeliveryStatusEntry,
    Proposal, Store,
};
use shared::order::{Order, OrderStatus};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::client::{ThreePlClient, ThreePlError};
use super::retry::RetryPolicy;
use super::worker::DeliveryJob;
use crate::repository::{OrderPatch, OrderRepository, RepoError};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    ThreePl(#[from] ThreePlError),

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error("delivery queue is full")]
    QueueFull,

    #[error("delivery queue is closed")]
    QueueClosed,

    #[error("delivery {0} can no longer be cancelled")]
    NotCancellable(String),
}

/// Canonical statuses that never trigger a booking: too early, or over
const NOT_DISPATCHABLE: &[OrderStatus] = &[
    OrderStatus::New,
    OrderStatus::Accepted,
    OrderStatus::CookingStarted,
    OrderStatus::OnWay,
    OrderStatus::WaitSending,
    OrderStatus::CancelledByPosSystem,
    OrderStatus::Failed,
];

/// Why `select_and_create` did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchSkip {
    NotThreePlStore,
    Marketplace,
    HasDelivery,
    /// A booking is already queued
    CourierRequested,
    PickedUpByCustomer,
    NotDispatchable(OrderStatus),
}

impl fmt::Display for DispatchSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchSkip::NotThreePlStore => write!(f, "store has no 3PL"),
            DispatchSkip::Marketplace => write!(f, "marketplace order"),
            DispatchSkip::HasDelivery => write!(f, "delivery already exists"),
            DispatchSkip::CourierRequested => write!(f, "courier already requested"),
            DispatchSkip::PickedUpByCustomer => write!(f, "picked up by customer"),
            DispatchSkip::NotDispatchable(status) => write!(f, "status {status} is not dispatchable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Enqueued,
    Skipped(DispatchSkip),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebidOutcome {
    /// Old booking cancelled and archived, new one created
    Rebid { provider: String, delivery_id: String },
    /// The current booking is too far along (or already settled)
    InFlight(DeliveryStatus),
    /// No provider other than the current one offered
    NoAlternative,
    NoDelivery,
}

pub struct DispatchSelector {
    client: Arc<dyn ThreePlClient>,
    orders: Arc<dyn OrderRepository>,
    jobs: mpsc::Sender<DeliveryJob>,
    retry: RetryPolicy,
}

impl DispatchSelector {
    pub fn new(
        client: Arc<dyn ThreePlClient>,
        orders: Arc<dyn OrderRepository>,
        jobs: mpsc::Sender<DeliveryJob>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            orders,
            jobs,
            retry,
        }
    }

    /// Guard clauses for the first booking
    pub fn dispatch_skip(order: &Order, store: &Store) -> Option<DispatchSkip> {
        if !store.is_3pl() {
            return Some(DispatchSkip::NotThreePlStore);
        }
        if order.is_marketplace {
            return Some(DispatchSkip::Marketplace);
        }
        if order.has_delivery() {
            return Some(DispatchSkip::HasDelivery);
        }
        if order.send_courier {
            return Some(DispatchSkip::CourierRequested);
        }
        if order.is_picked_up_by_customer {
            return Some(DispatchSkip::PickedUpByCustomer);
        }
        if order.status.is_terminal() || NOT_DISPATCHABLE.contains(&order.status) {
            return Some(DispatchSkip::NotDispatchable(order.status));
        }
        None
    }

    pub fn build_request(order: &Order, store: &Store, provider: Option<String>) -> DeliveryRequest {
        DeliveryRequest {
            order_id: order.id.clone(),
            display_id: order.order_id.clone(),
            store_id: store.id.clone(),
            provider,
            providers: store.kwaaka_3pl.enabled_providers(),
            pickup: store.address.clone(),
            pickup_phone: store.phone.clone(),
            dropoff: order.delivery_address.clone(),
            customer: order.customer.clone(),
            items: order.items.clone(),
            taxi_class: store.kwaaka_3pl.taxi_class.clone(),
            total_price: order.estimated_total_price,
        }
    }

    /// Lowest `priority` wins; the current provider never does
    pub fn select_provider<'a>(proposals: &'a [Proposal], current: &str) -> Option<&'a Proposal> {
        proposals
            .iter()
            .filter(|p| p.provider_service != current)
            .min_by_key(|p| p.priority)
    }

    /// Queue the first booking and cache fresh proposals on the order
    pub async fn select_and_create(
        &self,
        order: &Order,
        store: &Store,
    ) -> Result<CreateOutcome, DispatchError> {
        if let Some(skip) = Self::dispatch_skip(order, store) {
            tracing::debug!(order_id = %order.id, reason = %skip, "Courier dispatch skipped");
            return Ok(CreateOutcome::Skipped(skip));
        }

        let request = Self::build_request(order, store, None);

        // Mark first so a fast worker failure cannot be overwritten
        self.orders
            .patch_order(
                &order.id,
                OrderPatch {
                    send_courier: Some(true),
                    ..Default::default()
                },
            )
            .await?;

        let job = DeliveryJob {
            order_id: order.id.clone(),
            store_id: store.id.clone(),
            request: request.clone(),
        };
        if let Err(e) = self.jobs.try_send(job) {
            self.reset_send_courier(&order.id).await;
            return Err(match e {
                TrySendError::Full(_) => DispatchError::QueueFull,
                TrySendError::Closed(_) => DispatchError::QueueClosed,
            });
        }
        tracing::info!(order_id = %order.id, store_id = %store.id, "Courier booking enqueued");

        let proposals = self.fetch_proposals(&request, store).await;
        if !proposals.is_empty()
            && let Err(e) = self
                .orders
                .patch_order(
                    &order.id,
                    OrderPatch {
                        proposals: Some(proposals),
                        ..Default::default()
                    },
                )
                .await
        {
            tracing::warn!(order_id = %order.id, error = %e, "Failed to cache delivery proposals");
        }

        Ok(CreateOutcome::Enqueued)
    }

    /// Replace the current provider with the best alternative
    pub async fn cancel_and_rebid(
        &self,
        order: &Order,
        store: &Store,
    ) -> Result<RebidOutcome, DispatchError> {
        if !order.has_delivery() {
            return Ok(RebidOutcome::NoDelivery);
        }

        let delivery = self.client.get_delivery_info_by_order_id(&order.id).await?;
        if delivery.blocks_rebid() || delivery.cancel_state == CancelState::Unavailable {
            tracing::info!(
                order_id = %order.id,
                delivery_id = %delivery.id,
                status = %delivery.status,
                "Delivery in flight, rebid skipped"
            );
            return Ok(RebidOutcome::InFlight(delivery.status));
        }

        let request = Self::build_request(order, store, None);
        let fresh = self.fetch_proposals(&request, store).await;
        let proposals = if fresh.is_empty() {
            order.proposals.clone()
        } else {
            fresh.clone()
        };

        let Some(selected) = Self::select_provider(&proposals, &order.delivery_dispatcher).cloned()
        else {
            tracing::info!(
                order_id = %order.id,
                dispatcher = %order.delivery_dispatcher,
                "No alternative provider, rebid skipped"
            );
            return Ok(RebidOutcome::NoAlternative);
        };

        self.client.cancel_3pl_order(&delivery.id).await?;
        self.archive(order, delivery, Some(fresh)).await?;

        let request = DeliveryRequest {
            provider: Some(selected.provider_service.clone()),
            ..request
        };
        let created = self.client.create_3pl_order(&request).await?;
        let provider = if created.provider.is_empty() {
            selected.provider_service.clone()
        } else {
            created.provider.clone()
        };

        self.orders
            .patch_order(
                &order.id,
                OrderPatch {
                    delivery_order_id: Some(created.id.clone()),
                    delivery_dispatcher: Some(provider.clone()),
                    send_courier: Some(true),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(
            order_id = %order.id,
            previous = %order.delivery_dispatcher,
            provider = %provider,
            delivery_id = %created.id,
            "Delivery re-bid"
        );
        Ok(RebidOutcome::Rebid {
            provider,
            delivery_id: created.id,
        })
    }

    /// Cancel the active booking of an order; `false` when there was none to cancel.
    /// Without a booking, a pending courier request is withdrawn instead.
    pub async fn cancel_delivery(&self, order: &Order) -> Result<bool, DispatchError> {
        if !order.has_delivery() {
            // A queued booking sees the cleared flag and drops itself
            self.reset_send_courier(&order.id).await;
            return Ok(false);
        }

        let delivery = self.client.get_delivery_info_by_order_id(&order.id).await?;
        if delivery.status.is_terminal() {
            return Ok(false);
        }
        if delivery.cancel_state == CancelState::Unavailable {
            return Err(DispatchError::NotCancellable(delivery.id));
        }

        match delivery.status {
            DeliveryStatus::OrderCreated | DeliveryStatus::PerformerLookup => {
                self.client.cancel_courier_search(&delivery.id).await?
            }
            _ => self.client.cancel_3pl_order(&delivery.id).await?,
        }

        tracing::info!(order_id = %order.id, delivery_id = %delivery.id, "Delivery cancelled");
        self.archive(order, delivery, None).await?;
        Ok(true)
    }

    pub async fn delivery_info(&self, order: &Order) -> Result<Delivery3plOrder, DispatchError> {
        Ok(self.client.get_delivery_info_by_order_id(&order.id).await?)
    }

    /// Offers from enabled providers; empty on failure
    async fn fetch_proposals(&self, request: &DeliveryRequest, store: &Store) -> Vec<Proposal> {
        let client = &*self.client;
        match self
            .retry
            .run("list_potential_providers", move || {
                client.list_potential_providers(request)
            })
            .await
        {
            Ok(proposals) => proposals
                .into_iter()
                .filter(|p| store.kwaaka_3pl.is_provider_enabled(&p.provider_service))
                .collect(),
            Err(e) => {
                tracing::warn!(
                    order_id = %request.order_id,
                    store_id = %store.id,
                    error = %e,
                    "Failed to fetch delivery proposals"
                );
                Vec::new()
            }
        }
    }

    /// Move the booking into history and clear the active one
    async fn archive(
        &self,
        order: &Order,
        mut delivery: Delivery3plOrder,
        proposals: Option<Vec<Proposal>>,
    ) -> Result<(), DispatchError> {
        let now = Utc::now();
        delivery.status = DeliveryStatus::Cancelled;
        delivery.status_history.push(DeliveryStatusEntry {
            status: DeliveryStatus::Cancelled,
            time: now,
        });

        self.orders
            .patch_order(
                &order.id,
                OrderPatch {
                    delivery_order_id: Some(String::new()),
                    delivery_dispatcher: Some(String::new()),
                    send_courier: Some(false),
                    proposals: proposals.filter(|p| !p.is_empty()),
                    archive_delivery: Some(delivery),
                },
            )
            .await?;
        Ok(())
    }

    async fn reset_send_courier(&self, order_id: &str) {
        let patch = OrderPatch {
            send_courier: Some(false),
            ..Default::default()
        };
        if let Err(e) = self.orders.patch_order(order_id, patch).await {
            tracing::error!(order_id = %order_id, error = %e, "Failed to reset courier flag");
        }
    }
}
