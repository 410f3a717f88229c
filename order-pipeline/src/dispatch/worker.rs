//! Delivery Worker - books couriers queued by the selector
//!
//! Receives [`DeliveryJob`]s on a bounded mpsc channel and calls the 3PL
//! service with bounded concurrency. A job whose order was cancelled or
//! already booked is dropped. A failed booking clears `send_courier` so the
//! bulk scan can pick the order up again, and raises an operator alert.

use shared::models::{Delivery3plOrder, DeliveryRequest};
use shared::order::Order;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;

use super::client::ThreePlClient;
use super::selector::DispatchError;
use crate::notify::{AlertSender, OperatorAlert};
use crate::repository::{OrderPatch, OrderRepository, OrderSelector};

/// One queued courier booking
#[derive(Debug, Clone)]
pub struct DeliveryJob {
    /// Internal order id
    pub order_id: String,
    pub store_id: String,
    pub request: DeliveryRequest,
}

/// What happened to a queued booking
#[derive(Debug, Clone, PartialEq)]
pub enum BookingOutcome {
    Booked(Delivery3plOrder),
    /// The order no longer wanted a courier when the job ran
    Dropped,
    /// Booked, then cancelled because the order closed meanwhile
    Withdrawn(Delivery3plOrder),
}

pub struct DeliveryWorker {
    client: Arc<dyn ThreePlClient>,
    orders: Arc<dyn OrderRepository>,
    alerts: AlertSender,
    semaphore: Arc<Semaphore>,
}

impl DeliveryWorker {
    pub fn new(
        client: Arc<dyn ThreePlClient>,
        orders: Arc<dyn OrderRepository>,
        alerts: AlertSender,
        concurrency: usize,
    ) -> Self {
        Self {
            client,
            orders,
            alerts,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    pub async fn run(self, mut rx: mpsc::Receiver<DeliveryJob>, shutdown: CancellationToken) {
        tracing::info!(
            concurrency = self.semaphore.available_permits(),
            "DeliveryWorker started"
        );
        let worker = Arc::new(self);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("DeliveryWorker received shutdown signal");
                    break;
                }
                job = rx.recv() => {
                    let Some(job) = job else {
                        tracing::info!("Delivery channel closed, shutting down DeliveryWorker");
                        break;
                    };
                    let Ok(permit) = worker.semaphore.clone().acquire_owned().await else {
                        break;
                    };
                    let w = worker.clone();
                    tokio::spawn(async move {
                        let _permit = permit;
                        let order_id = job.order_id.clone();
                        match w.process(job).await {
                            Ok(outcome) => {
                                tracing::debug!(order_id = %order_id, outcome = ?outcome, "Booking job done")
                            }
                            Err(e) => {
                                tracing::warn!(order_id = %order_id, error = %e, "Booking job failed")
                            }
                        }
                    });
                }
            }
        }
    }

    /// Book one courier and record the result on the order
    pub async fn process(&self, job: DeliveryJob) -> Result<BookingOutcome, DispatchError> {
        let current = self
            .orders
            .get_order(&OrderSelector::Id(job.order_id.clone()))
            .await?;
        if !wants_courier(&current) || current.has_delivery() {
            tracing::info!(
                order_id = %job.order_id,
                status = ?current.status,
                send_courier = current.send_courier,
                "Dropping stale courier booking"
            );
            return Ok(BookingOutcome::Dropped);
        }

        let delivery = match self.client.create_3pl_order(&job.request).await {
            Ok(delivery) => delivery,
            Err(e) => {
                tracing::error!(
                    order_id = %job.order_id,
                    store_id = %job.store_id,
                    error = %e,
                    "Courier booking failed"
                );
                self.alerts.send(OperatorAlert::DeliveryCreationFailed {
                    order_id: job.order_id.clone(),
                    store_id: job.store_id.clone(),
                    error: e.to_string(),
                });
                self.patch_or_log(
                    &job.order_id,
                    OrderPatch {
                        send_courier: Some(false),
                        ..Default::default()
                    },
                )
                .await;
                return Err(e.into());
            }
        };

        let recorded = self
            .orders
            .patch_order(
                &job.order_id,
                OrderPatch {
                    delivery_order_id: Some(delivery.id.clone()),
                    delivery_dispatcher: Some(delivery.provider.clone()),
                    ..Default::default()
                },
            )
            .await;
        let order = match recorded {
            Ok(order) => order,
            Err(e) => {
                tracing::error!(
                    order_id = %job.order_id,
                    delivery_id = %delivery.id,
                    error = %e,
                    "Courier booked but not recorded on the order"
                );
                self.alerts.send(OperatorAlert::DeliveryCreationFailed {
                    order_id: job.order_id.clone(),
                    store_id: job.store_id.clone(),
                    error: format!("delivery {} booked but not recorded: {e}", delivery.id),
                });
                return Err(e.into());
            }
        };

        // The order may have been cancelled while the booking was in flight
        if !wants_courier(&order) {
            return self.withdraw(&job, delivery).await;
        }

        tracing::info!(
            order_id = %job.order_id,
            delivery_id = %delivery.id,
            provider = %delivery.provider,
            "Courier booked"
        );
        Ok(BookingOutcome::Booked(delivery))
    }

    async fn withdraw(
        &self,
        job: &DeliveryJob,
        delivery: Delivery3plOrder,
    ) -> Result<BookingOutcome, DispatchError> {
        if let Err(e) = self.client.cancel_3pl_order(&delivery.id).await {
            tracing::error!(
                order_id = %job.order_id,
                delivery_id = %delivery.id,
                error = %e,
                "Failed to cancel courier for a closed order"
            );
            self.alerts.send(OperatorAlert::DeliveryCreationFailed {
                order_id: job.order_id.clone(),
                store_id: job.store_id.clone(),
                error: format!("delivery {} left active on a closed order: {e}", delivery.id),
            });
            return Err(e.into());
        }

        self.patch_or_log(
            &job.order_id,
            OrderPatch {
                delivery_order_id: Some(String::new()),
                delivery_dispatcher: Some(String::new()),
                send_courier: Some(false),
                ..Default::default()
            },
        )
        .await;
        tracing::info!(
            order_id = %job.order_id,
            delivery_id = %delivery.id,
            "Courier cancelled, order closed during booking"
        );
        Ok(BookingOutcome::Withdrawn(delivery))
    }

    async fn patch_or_log(&self, order_id: &str, patch: OrderPatch) {
        if let Err(e) = self.orders.patch_order(order_id, patch).await {
            tracing::error!(order_id = %order_id, error = %e, "Failed to update courier fields");
        }
    }
}

fn wants_courier(order: &Order) -> bool {
    order.send_courier && !order.status.is_terminal()
}
