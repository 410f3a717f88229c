//! Shared fixtures: in-memory repository plus recording fakes for every
//! outbound collaborator.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use order_pipeline::aggregator::{
    AggregatorClient, AggregatorError, AggregatorRegistry, AggregatorResult,
};
use order_pipeline::dispatch::{
    DeliveryJob, DispatchSelector, RetryPolicy, ThreePlClient, ThreePlError, ThreePlResult,
};
use order_pipeline::notify::{AlertSender, Notifiers, Notify, NotifyError, OperatorAlert};
use order_pipeline::pipeline::{OrderStatusWorkflow, WorkflowSettings};
use order_pipeline::repository::{
    InMemoryRepository, OrderPatch, OrderQuery, OrderRepository, OrderSelector, RepoError,
    RepoResult, StatusTransition,
};
use rust_decimal::Decimal;
use shared::models::{
    Delivery3plOrder, DeliveryRequest, DeliveryStatus, DeliveryStatusEntry, Proposal, Store,
    StoreGroup,
};
use shared::order::{DeliveryService, Order, OrderStatus, PosKind};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;
use tokio::sync::mpsc;

// ============================================================================
// Aggregator
// ============================================================================

/// Records every call as `"method"` or `"method(arg)"`
pub struct RecordingAggregator {
    service: DeliveryService,
    calls: Mutex<Vec<String>>,
    /// Methods that answer `Unsupported`
    unsupported: Vec<&'static str>,
    fail: bool,
}

impl RecordingAggregator {
    pub fn new(service: DeliveryService) -> Arc<Self> {
        Arc::new(Self {
            service,
            calls: Mutex::new(Vec::new()),
            unsupported: Vec::new(),
            fail: false,
        })
    }

    pub fn without(service: DeliveryService, unsupported: Vec<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            service,
            calls: Mutex::new(Vec::new()),
            unsupported,
            fail: false,
        })
    }

    pub fn failing(service: DeliveryService) -> Arc<Self> {
        Arc::new(Self {
            service,
            calls: Mutex::new(Vec::new()),
            unsupported: Vec::new(),
            fail: true,
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, method: &'static str, call: String) -> AggregatorResult<()> {
        if self.unsupported.contains(&method) {
            return Err(AggregatorError::Unsupported(self.service));
        }
        self.calls.lock().unwrap().push(call);
        if self.fail {
            return Err(AggregatorError::Http("503 Service Unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl AggregatorClient for RecordingAggregator {
    fn service(&self) -> DeliveryService {
        self.service
    }

    async fn accept_order(
        &self,
        _order: &Order,
        _store: &Store,
        _pickup_time: DateTime<Utc>,
    ) -> AggregatorResult<()> {
        self.record("accept_order", "accept_order".into())
    }

    async fn accept_self_delivery_order(
        &self,
        _order: &Order,
        _store: &Store,
        _pickup_time: DateTime<Utc>,
    ) -> AggregatorResult<()> {
        self.record("accept_self_delivery_order", "accept_self_delivery_order".into())
    }

    async fn reject_order(&self, _order: &Order, _store: &Store, reason: &str) -> AggregatorResult<()> {
        self.record("reject_order", format!("reject_order({reason})"))
    }

    async fn mark_order(&self, _order: &Order, _store: &Store) -> AggregatorResult<()> {
        self.record("mark_order", "mark_order".into())
    }

    async fn confirm_pre_order(&self, _order: &Order, _store: &Store) -> AggregatorResult<()> {
        self.record("confirm_pre_order", "confirm_pre_order".into())
    }

    async fn delivered_order(&self, _order: &Order, _store: &Store) -> AggregatorResult<()> {
        self.record("delivered_order", "delivered_order".into())
    }

    async fn update_order_status(
        &self,
        _order: &Order,
        _store: &Store,
        status: &str,
    ) -> AggregatorResult<()> {
        self.record("update_order_status", format!("update_order_status({status})"))
    }
}

// ============================================================================
// 3PL
// ============================================================================

#[derive(Default)]
pub struct FakeThreePl {
    pub proposals: Mutex<Vec<Proposal>>,
    /// Current booking per internal order id
    pub deliveries: Mutex<HashMap<String, Delivery3plOrder>>,
    pub calls: Mutex<Vec<String>>,
    pub fail_proposals: Mutex<bool>,
    pub fail_create: Mutex<bool>,
    created: Mutex<u32>,
}

impl FakeThreePl {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_proposals(proposals: Vec<Proposal>) -> Arc<Self> {
        let fake = Self::default();
        *fake.proposals.lock().unwrap() = proposals;
        Arc::new(fake)
    }

    pub fn set_delivery(&self, delivery: Delivery3plOrder) {
        self.deliveries
            .lock()
            .unwrap()
            .insert(delivery.order_id.clone(), delivery);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

#[async_trait]
impl ThreePlClient for FakeThreePl {
    async fn create_3pl_order(&self, request: &DeliveryRequest) -> ThreePlResult<Delivery3plOrder> {
        let provider = request.provider.clone().unwrap_or_else(|| "yandex".to_string());
        self.calls
            .lock()
            .unwrap()
            .push(format!("create({},{provider})", request.order_id));
        if *self.fail_create.lock().unwrap() {
            return Err(ThreePlError::Rejected("no couriers".into()));
        }

        let n = {
            let mut created = self.created.lock().unwrap();
            *created += 1;
            *created
        };
        let delivery = delivery(&format!("d-{n}"), &request.order_id, &provider, DeliveryStatus::OrderCreated);
        self.set_delivery(delivery.clone());
        Ok(delivery)
    }

    async fn cancel_3pl_order(&self, delivery_id: &str) -> ThreePlResult<()> {
        self.calls.lock().unwrap().push(format!("cancel({delivery_id})"));
        Ok(())
    }

    async fn cancel_courier_search(&self, delivery_id: &str) -> ThreePlResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("cancel_search({delivery_id})"));
        Ok(())
    }

    async fn list_potential_providers(&self, request: &DeliveryRequest) -> ThreePlResult<Vec<Proposal>> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("quotes({})", request.order_id));
        if *self.fail_proposals.lock().unwrap() {
            return Err(ThreePlError::Timeout);
        }
        Ok(self.proposals.lock().unwrap().clone())
    }

    async fn get_delivery_info_by_order_id(&self, order_id: &str) -> ThreePlResult<Delivery3plOrder> {
        self.deliveries
            .lock()
            .unwrap()
            .get(order_id)
            .cloned()
            .ok_or_else(|| ThreePlError::NotFound(order_id.to_string()))
    }
}

pub fn proposal(provider: &str, priority: i32) -> Proposal {
    Proposal {
        price: Decimal::new(1200, 0),
        time_estimate_minutes: 25,
        provider_service: provider.into(),
        priority,
    }
}

pub fn delivery(id: &str, order_id: &str, provider: &str, status: DeliveryStatus) -> Delivery3plOrder {
    let now = Utc::now();
    Delivery3plOrder {
        id: id.into(),
        order_id: order_id.into(),
        provider: provider.into(),
        status,
        status_history: vec![DeliveryStatusEntry { status, time: now }],
        courier: None,
        cancel_state: Default::default(),
        created_at: now,
    }
}

/// Delivery that has been looking for a performer for `minutes`
pub fn stalled_delivery(id: &str, order_id: &str, provider: &str, minutes: i64) -> Delivery3plOrder {
    let since = Utc::now() - Duration::minutes(minutes);
    Delivery3plOrder {
        id: id.into(),
        order_id: order_id.into(),
        provider: provider.into(),
        status: DeliveryStatus::PerformerLookup,
        status_history: vec![
            DeliveryStatusEntry {
                status: DeliveryStatus::OrderCreated,
                time: since - Duration::minutes(1),
            },
            DeliveryStatusEntry {
                status: DeliveryStatus::PerformerLookup,
                time: since,
            },
        ],
        courier: None,
        cancel_state: Default::default(),
        created_at: since - Duration::minutes(1),
    }
}

// ============================================================================
// Repository
// ============================================================================

/// Delegates to the in-memory repository unless a write is told to fail
pub struct FlakyRepository {
    inner: Arc<InMemoryRepository>,
    pub fail_status_writes: Mutex<bool>,
    pub lose_status_race: Mutex<bool>,
    pub fail_patches: Mutex<bool>,
}

impl FlakyRepository {
    pub fn new(inner: Arc<InMemoryRepository>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_status_writes: Mutex::new(false),
            lose_status_race: Mutex::new(false),
            fail_patches: Mutex::new(false),
        })
    }
}

#[async_trait]
impl OrderRepository for FlakyRepository {
    async fn get_order(&self, selector: &OrderSelector) -> RepoResult<Order> {
        self.inner.get_order(selector).await
    }

    async fn update_order(&self, order: &Order) -> RepoResult<()> {
        self.inner.update_order(order).await
    }

    async fn update_order_status(
        &self,
        selector: &OrderSelector,
        transition: &StatusTransition,
    ) -> RepoResult<Order> {
        if *self.fail_status_writes.lock().unwrap() {
            return Err(RepoError::Storage("connection reset".into()));
        }
        if *self.lose_status_race.lock().unwrap() {
            return Err(RepoError::Conflict {
                expected: transition.expected,
                actual: OrderStatus::Closed,
            });
        }
        self.inner.update_order_status(selector, transition).await
    }

    async fn get_all_orders(&self, query: &OrderQuery) -> RepoResult<Vec<Order>> {
        self.inner.get_all_orders(query).await
    }

    async fn patch_order(&self, id: &str, patch: OrderPatch) -> RepoResult<Order> {
        if *self.fail_patches.lock().unwrap() {
            return Err(RepoError::Storage("write timed out".into()));
        }
        self.inner.patch_order(id, patch).await
    }
}

// ============================================================================
// Notify
// ============================================================================

pub struct RecordingNotifier {
    channel: &'static str,
    pub sent: Mutex<Vec<(OrderStatus, String, String)>>,
}

impl RecordingNotifier {
    pub fn new(channel: &'static str) -> Arc<Self> {
        Arc::new(Self {
            channel,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Notify for RecordingNotifier {
    fn channel(&self) -> &'static str {
        self.channel
    }

    async fn notify(
        &self,
        status: OrderStatus,
        order: &Order,
        group: &StoreGroup,
        _store: &Store,
    ) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((status, order.id.clone(), group.name.clone()));
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub repo: Arc<InMemoryRepository>,
    /// Order repository seen by the workflow
    pub flaky: Arc<FlakyRepository>,
    pub workflow: OrderStatusWorkflow,
    pub alerts: mpsc::Receiver<OperatorAlert>,
    pub alert_sender: AlertSender,
    pub chat: Arc<RecordingNotifier>,
    pub message: Arc<RecordingNotifier>,
    pub three_pl: Option<Arc<FakeThreePl>>,
    pub dispatch: Option<Arc<DispatchSelector>>,
    pub jobs: Option<mpsc::Receiver<DeliveryJob>>,
}

impl Harness {
    pub fn new(repo: InMemoryRepository, registry: AggregatorRegistry) -> Self {
        Self::build(repo, registry, None)
    }

    pub fn with_3pl(
        repo: InMemoryRepository,
        registry: AggregatorRegistry,
        three_pl: Arc<FakeThreePl>,
    ) -> Self {
        Self::build(repo, registry, Some(three_pl))
    }

    fn build(
        repo: InMemoryRepository,
        registry: AggregatorRegistry,
        three_pl: Option<Arc<FakeThreePl>>,
    ) -> Self {
        let repo = Arc::new(repo);
        let flaky = FlakyRepository::new(repo.clone());
        let (alert_sender, alerts) = AlertSender::channel(64);
        let chat = RecordingNotifier::new("chat");
        let message = RecordingNotifier::new("message");

        let (dispatch, jobs) = match &three_pl {
            Some(fake) => {
                let (tx, rx) = mpsc::channel(64);
                let selector = DispatchSelector::new(
                    fake.clone(),
                    repo.clone(),
                    tx,
                    RetryPolicy::new(2, StdDuration::from_millis(1)),
                );
                (Some(Arc::new(selector)), Some(rx))
            }
            None => (None, None),
        };

        let workflow = OrderStatusWorkflow::new(
            flaky.clone(),
            repo.clone(),
            registry,
            dispatch.clone(),
            Notifiers::new(chat.clone(), message.clone()),
            alert_sender.clone(),
            WorkflowSettings::default(),
        );

        Self {
            repo,
            flaky,
            workflow,
            alerts,
            alert_sender,
            chat,
            message,
            three_pl,
            dispatch,
            jobs,
        }
    }

    pub fn drain_alerts(&mut self) -> Vec<OperatorAlert> {
        let mut alerts = Vec::new();
        while let Ok(alert) = self.alerts.try_recv() {
            alerts.push(alert);
        }
        alerts
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn store(id: &str, pos: PosKind) -> Store {
    let mut store = Store::new(id, "Central", pos);
    store.group_id = "g-1".into();
    store
}

pub fn group() -> StoreGroup {
    StoreGroup {
        id: "g-1".into(),
        name: "Burger Group".into(),
        store_ids: vec!["s-1".into()],
    }
}

/// Order whose history walks through `statuses` one second apart
pub fn order(
    id: &str,
    service: DeliveryService,
    pos: PosKind,
    statuses: &[OrderStatus],
) -> Order {
    let mut order = Order::new(id, format!("EXT-{id}"), "s-1", service, pos);
    order.pos_order_id = format!("POS-{id}");
    let start = Utc::now() - Duration::hours(1);
    for (i, status) in statuses.iter().enumerate() {
        order.push_status(*status, start + Duration::seconds(i as i64 + 1));
    }
    order
}

/// Same as [`order`] with the whole history shifted `hours` into the past
pub fn aged_order(
    id: &str,
    service: DeliveryService,
    pos: PosKind,
    statuses: &[OrderStatus],
    hours: i64,
) -> Order {
    let mut order = Order::new(id, format!("EXT-{id}"), "s-1", service, pos);
    order.pos_order_id = format!("POS-{id}");
    let start = Utc::now() - Duration::hours(hours);
    order.created_at = start;
    order.statuses_history[0].time = start;
    for (i, status) in statuses.iter().enumerate() {
        order.push_status(*status, start + Duration::seconds(i as i64 + 1));
    }
    order
}
