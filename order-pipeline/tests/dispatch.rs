//! Courier booking, re-bid and cancellation against a fake 3PL service

mod common;

use common::*;
use order_pipeline::aggregator::AggregatorRegistry;
use async_trait::async_trait;
use chrono::Utc;
use order_pipeline::dispatch::{
    BookingOutcome, CreateOutcome, DeliveryWorker, DispatchError, DispatchSelector, DispatchSkip,
    RebidOutcome, ThreePlClient, ThreePlResult,
};
use order_pipeline::notify::OperatorAlert;
use order_pipeline::pipeline::{StatusEvent, WorkflowError};
use order_pipeline::repository::{
    InMemoryRepository, OrderRepository, OrderSelector, RepoError, StatusTransition,
};
use shared::models::{
    CancelState, Delivery3plOrder, DeliveryRequest, DeliveryStatus, DeliveryStatusEntry, Proposal,
    Store,
};
use shared::order::{DeliveryService, Order, OrderStatus, PosKind};
use std::sync::Arc;

fn three_pl_store() -> Store {
    let mut store = store("s-1", PosKind::Iiko);
    store.kwaaka_3pl.is_3pl = true;
    store.kwaaka_3pl.taxi_class = "courier".into();
    store
}

fn cooked_order() -> Order {
    order(
        "o-1",
        DeliveryService::Wolt,
        PosKind::Iiko,
        &[OrderStatus::Accepted, OrderStatus::CookingComplete],
    )
}

/// Cooked order currently booked with provider `B` as delivery `d-old`
fn booked_order() -> Order {
    let mut order = cooked_order();
    order.delivery_order_id = "d-old".into();
    order.delivery_dispatcher = "B".into();
    order.send_courier = true;
    order
}

fn harness(order: Order, fake: Arc<FakeThreePl>) -> Harness {
    let repo = InMemoryRepository::new();
    repo.insert_store(three_pl_store());
    repo.insert_group(group());
    repo.insert_order(order);
    Harness::with_3pl(repo, AggregatorRegistry::new(), fake)
}

async fn stored(h: &Harness) -> Order {
    h.repo.get_order(&OrderSelector::Id("o-1".into())).await.unwrap()
}

fn selector(h: &Harness) -> &DispatchSelector {
    h.dispatch.as_deref().expect("3PL configured")
}

#[tokio::test]
async fn test_rebid_picks_best_alternative_provider() {
    let fake = FakeThreePl::with_proposals(vec![
        proposal("A", 2),
        proposal("B", 1),
        proposal("C", 3),
    ]);
    fake.set_delivery(stalled_delivery("d-old", "o-1", "B", 20));
    let h = harness(booked_order(), fake.clone());

    let order = stored(&h).await;
    let outcome = selector(&h)
        .cancel_and_rebid(&order, &three_pl_store())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        RebidOutcome::Rebid {
            provider: "A".into(),
            delivery_id: "d-1".into(),
        }
    );
    assert_eq!(fake.count("cancel(d-old)"), 1);
    assert_eq!(fake.count("create(o-1,A)"), 1);

    let order = stored(&h).await;
    assert_eq!(order.delivery_order_id, "d-1");
    assert_eq!(order.delivery_dispatcher, "A");
    assert_eq!(order.proposals.len(), 3);
    assert_eq!(order.delivery_history.len(), 1);
    let archived = &order.delivery_history[0];
    assert_eq!(archived.id, "d-old");
    assert_eq!(archived.status, DeliveryStatus::Cancelled);
}

#[tokio::test]
async fn test_rebid_never_targets_a_picked_up_delivery() {
    let fake = FakeThreePl::with_proposals(vec![proposal("A", 1)]);
    let mut delivery = stalled_delivery("d-old", "o-1", "B", 30);
    // Courier picked up once, then the provider fell back to lookup
    delivery.status_history.insert(
        1,
        DeliveryStatusEntry {
            status: DeliveryStatus::PickedUp,
            time: delivery.created_at,
        },
    );
    fake.set_delivery(delivery);
    let h = harness(booked_order(), fake.clone());

    let order = stored(&h).await;
    let outcome = selector(&h)
        .cancel_and_rebid(&order, &three_pl_store())
        .await
        .unwrap();

    assert_eq!(outcome, RebidOutcome::InFlight(DeliveryStatus::PerformerLookup));
    assert_eq!(fake.count("cancel"), 0);
    assert_eq!(fake.count("create"), 0);
    assert_eq!(stored(&h).await.delivery_order_id, "d-old");
}

#[tokio::test]
async fn test_rebid_respects_uncancellable_bookings() {
    let fake = FakeThreePl::with_proposals(vec![proposal("A", 1)]);
    let mut delivery = stalled_delivery("d-old", "o-1", "B", 30);
    delivery.cancel_state = CancelState::Unavailable;
    fake.set_delivery(delivery);
    let h = harness(booked_order(), fake.clone());

    let order = stored(&h).await;
    let outcome = selector(&h)
        .cancel_and_rebid(&order, &three_pl_store())
        .await
        .unwrap();
    assert!(matches!(outcome, RebidOutcome::InFlight(_)));
    assert_eq!(fake.count("cancel"), 0);
}

#[tokio::test]
async fn test_rebid_without_alternative_keeps_booking() {
    let fake = FakeThreePl::with_proposals(vec![proposal("B", 1)]);
    fake.set_delivery(stalled_delivery("d-old", "o-1", "B", 30));
    let h = harness(booked_order(), fake.clone());

    let order = stored(&h).await;
    let outcome = selector(&h)
        .cancel_and_rebid(&order, &three_pl_store())
        .await
        .unwrap();
    assert_eq!(outcome, RebidOutcome::NoAlternative);
    assert_eq!(fake.count("cancel"), 0);
}

#[tokio::test]
async fn test_rebid_falls_back_to_cached_proposals() {
    let fake = FakeThreePl::with_proposals(vec![proposal("A", 1)]);
    *fake.fail_proposals.lock().unwrap() = true;
    fake.set_delivery(stalled_delivery("d-old", "o-1", "B", 30));
    let mut order = booked_order();
    order.proposals = vec![proposal("B", 1), proposal("C", 5)];
    let h = harness(order, fake.clone());

    let order = stored(&h).await;
    let outcome = selector(&h)
        .cancel_and_rebid(&order, &three_pl_store())
        .await
        .unwrap();
    assert!(matches!(outcome, RebidOutcome::Rebid { ref provider, .. } if provider == "C"));
}

#[tokio::test]
async fn test_cooked_order_enqueues_a_booking() {
    let fake = FakeThreePl::with_proposals(vec![proposal("A", 2), proposal("B", 1)]);
    let mut h = harness(
        order("o-1", DeliveryService::Wolt, PosKind::Iiko, &[OrderStatus::Accepted]),
        fake.clone(),
    );

    h.workflow
        .update_order_status(&StatusEvent {
            pos: PosKind::Iiko,
            reference: "POS-o-1".into(),
            raw_status: "CookingCompleted".into(),
            error_detail: None,
        })
        .await
        // Wolt client is not registered; the booking happens before the call
        .unwrap_err();

    let job = h.jobs.as_mut().unwrap().try_recv().expect("booking queued");
    assert_eq!(job.order_id, "o-1");
    assert_eq!(job.request.taxi_class, "courier");
    assert_eq!(job.request.provider, None);

    let order = stored(&h).await;
    assert!(order.send_courier);
    assert_eq!(order.proposals.len(), 2);

    // Worker books the courier and records it on the order
    let worker = DeliveryWorker::new(fake.clone(), h.repo.clone(), h.alert_sender.clone(), 2);
    let outcome = worker.process(job).await.unwrap();
    let BookingOutcome::Booked(delivery) = outcome else {
        panic!("expected a booking, got {outcome:?}");
    };
    let order = stored(&h).await;
    assert_eq!(order.delivery_order_id, delivery.id);
    assert_eq!(order.delivery_dispatcher, "yandex");
}

#[tokio::test]
async fn test_booking_survives_proposal_failure() {
    let fake = FakeThreePl::new();
    *fake.fail_proposals.lock().unwrap() = true;
    let mut h = harness(cooked_order(), fake.clone());

    let order = stored(&h).await;
    let outcome = selector(&h)
        .select_and_create(&order, &three_pl_store())
        .await
        .unwrap();

    assert_eq!(outcome, CreateOutcome::Enqueued);
    assert!(fake.count("quotes") >= 1);
    assert!(h.jobs.as_mut().unwrap().try_recv().is_ok());
    assert!(stored(&h).await.proposals.is_empty());
}

#[tokio::test]
async fn test_second_booking_is_skipped() {
    let fake = FakeThreePl::new();
    let h = harness(cooked_order(), fake.clone());

    let order = stored(&h).await;
    selector(&h)
        .select_and_create(&order, &three_pl_store())
        .await
        .unwrap();

    let order = stored(&h).await;
    let outcome = selector(&h)
        .select_and_create(&order, &three_pl_store())
        .await
        .unwrap();
    assert_eq!(outcome, CreateOutcome::Skipped(DispatchSkip::CourierRequested));
}

#[tokio::test]
async fn test_failed_booking_resets_flag_and_alerts() {
    let fake = FakeThreePl::new();
    *fake.fail_create.lock().unwrap() = true;
    let mut h = harness(cooked_order(), fake.clone());

    let order = stored(&h).await;
    selector(&h)
        .select_and_create(&order, &three_pl_store())
        .await
        .unwrap();
    let job = h.jobs.as_mut().unwrap().try_recv().unwrap();

    let worker = DeliveryWorker::new(fake.clone(), h.repo.clone(), h.alert_sender.clone(), 1);
    let err = worker.process(job).await.unwrap_err();
    assert!(matches!(err, DispatchError::ThreePl(_)));

    assert!(!stored(&h).await.send_courier);
    let alerts = h.drain_alerts();
    assert!(matches!(
        alerts.as_slice(),
        [OperatorAlert::DeliveryCreationFailed { order_id, .. }] if order_id == "o-1"
    ));
}

#[tokio::test]
async fn test_pos_cancellation_cancels_courier_search() {
    let fake = FakeThreePl::new();
    fake.set_delivery(delivery("d-old", "o-1", "B", DeliveryStatus::PerformerLookup));
    let mut order = booked_order();
    order.delivery_service = DeliveryService::Kwaaka;
    let h = harness(order, fake.clone());

    h.workflow
        .update_order_status(&StatusEvent {
            pos: PosKind::Iiko,
            reference: "POS-o-1".into(),
            raw_status: "Cancelled".into(),
            error_detail: None,
        })
        .await
        .unwrap();

    assert_eq!(fake.calls(), vec!["cancel_search(d-old)"]);
    let order = stored(&h).await;
    assert_eq!(order.status, OrderStatus::CancelledByPosSystem);
    assert!(!order.has_delivery());
    assert_eq!(order.delivery_history.len(), 1);
}

#[tokio::test]
async fn test_uncancellable_delivery_fails_the_update() {
    let fake = FakeThreePl::new();
    let mut delivery = delivery("d-old", "o-1", "B", DeliveryStatus::ComingToPickup);
    delivery.cancel_state = CancelState::Unavailable;
    fake.set_delivery(delivery);
    let mut order = booked_order();
    order.delivery_service = DeliveryService::Kwaaka;
    let mut h = harness(order, fake.clone());

    let err = h
        .workflow
        .update_order_status(&StatusEvent {
            pos: PosKind::Iiko,
            reference: "POS-o-1".into(),
            raw_status: "Cancelled".into(),
            error_detail: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Dispatch(DispatchError::NotCancellable(ref id)) if id == "d-old"
    ));
    assert_eq!(h.drain_alerts().len(), 1);
    // Status is persisted before dispatch
    assert_eq!(stored(&h).await.status, OrderStatus::CancelledByPosSystem);
}

fn pos_event(raw: &str) -> StatusEvent {
    StatusEvent {
        pos: PosKind::Iiko,
        reference: "POS-o-1".into(),
        raw_status: raw.into(),
        error_detail: None,
    }
}

#[tokio::test]
async fn test_queued_booking_is_dropped_after_pos_cancellation() {
    let fake = FakeThreePl::new();
    let kwaaka = order("o-1", DeliveryService::Kwaaka, PosKind::Iiko, &[OrderStatus::Accepted]);
    let mut h = harness(kwaaka, fake.clone());

    h.workflow
        .update_order_status(&pos_event("CookingCompleted"))
        .await
        .unwrap();
    let job = h.jobs.as_mut().unwrap().try_recv().expect("booking queued");

    h.workflow
        .update_order_status(&pos_event("Cancelled"))
        .await
        .unwrap();
    assert!(!stored(&h).await.send_courier);

    let worker = DeliveryWorker::new(fake.clone(), h.repo.clone(), h.alert_sender.clone(), 1);
    let outcome = worker.process(job).await.unwrap();

    assert_eq!(outcome, BookingOutcome::Dropped);
    assert_eq!(fake.count("create"), 0);
    let order = stored(&h).await;
    assert_eq!(order.status, OrderStatus::CancelledByPosSystem);
    assert!(!order.has_delivery());
}

/// Moves the order to a POS cancellation while the booking call is running
struct CancelledMidBooking {
    inner: Arc<FakeThreePl>,
    repo: Arc<InMemoryRepository>,
}

#[async_trait]
impl ThreePlClient for CancelledMidBooking {
    async fn create_3pl_order(&self, request: &DeliveryRequest) -> ThreePlResult<Delivery3plOrder> {
        let transition = StatusTransition {
            expected: OrderStatus::CookingComplete,
            status: OrderStatus::CancelledByPosSystem,
            error_detail: None,
            at: Utc::now(),
        };
        self.repo
            .update_order_status(&OrderSelector::Id(request.order_id.clone()), &transition)
            .await
            .unwrap();
        self.inner.create_3pl_order(request).await
    }

    async fn cancel_3pl_order(&self, delivery_id: &str) -> ThreePlResult<()> {
        self.inner.cancel_3pl_order(delivery_id).await
    }

    async fn cancel_courier_search(&self, delivery_id: &str) -> ThreePlResult<()> {
        self.inner.cancel_courier_search(delivery_id).await
    }

    async fn list_potential_providers(&self, request: &DeliveryRequest) -> ThreePlResult<Vec<Proposal>> {
        self.inner.list_potential_providers(request).await
    }

    async fn get_delivery_info_by_order_id(&self, order_id: &str) -> ThreePlResult<Delivery3plOrder> {
        self.inner.get_delivery_info_by_order_id(order_id).await
    }
}

#[tokio::test]
async fn test_booking_is_withdrawn_when_order_closes_meanwhile() {
    let fake = FakeThreePl::new();
    let mut h = harness(cooked_order(), fake.clone());
    let order = stored(&h).await;
    selector(&h)
        .select_and_create(&order, &three_pl_store())
        .await
        .unwrap();
    let job = h.jobs.as_mut().unwrap().try_recv().unwrap();

    let client = Arc::new(CancelledMidBooking {
        inner: fake.clone(),
        repo: h.repo.clone(),
    });
    let worker = DeliveryWorker::new(client, h.repo.clone(), h.alert_sender.clone(), 1);
    let outcome = worker.process(job).await.unwrap();

    assert!(matches!(outcome, BookingOutcome::Withdrawn(ref d) if d.id == "d-1"));
    assert_eq!(fake.count("cancel(d-1)"), 1);
    let order = stored(&h).await;
    assert_eq!(order.status, OrderStatus::CancelledByPosSystem);
    assert!(!order.has_delivery());
    assert!(!order.send_courier);
    assert!(h.drain_alerts().is_empty());
}

#[tokio::test]
async fn test_unrecorded_booking_alerts_with_delivery_id() {
    let fake = FakeThreePl::new();
    let mut h = harness(cooked_order(), fake.clone());
    let order = stored(&h).await;
    selector(&h)
        .select_and_create(&order, &three_pl_store())
        .await
        .unwrap();
    let job = h.jobs.as_mut().unwrap().try_recv().unwrap();
    *h.flaky.fail_patches.lock().unwrap() = true;

    let worker = DeliveryWorker::new(fake.clone(), h.flaky.clone(), h.alert_sender.clone(), 1);
    let err = worker.process(job).await.unwrap_err();

    assert!(matches!(err, DispatchError::Repo(RepoError::Storage(_))));
    assert_eq!(fake.count("create(o-1"), 1);
    let alerts = h.drain_alerts();
    assert!(matches!(
        alerts.as_slice(),
        [OperatorAlert::DeliveryCreationFailed { order_id, error, .. }]
            if order_id == "o-1" && error.contains("d-1")
    ));
}
