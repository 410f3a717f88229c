use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

use crate::aggregator::AggregatorRegistry;
use crate::core::Config;
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::dispatch::{CronScheduler, DeliveryWorker, DispatchSelector, ThreePlClient};
use crate::notify::{AlertSender, AlertSink, AlertWorker, Notifiers};
use crate::pipeline::OrderStatusWorkflow;
use crate::repository::{OrderRepository, StoreRepository};

/// Operator alerts buffered before producers start dropping
const ALERT_CHANNEL_CAPACITY: usize = 1024;
/// Courier bookings waiting for a worker slot
const DELIVERY_QUEUE_CAPACITY: usize = 512;

/// External collaborators the pipeline is wired to
pub struct Collaborators {
    pub orders: Arc<dyn OrderRepository>,
    pub stores: Arc<dyn StoreRepository>,
    pub registry: AggregatorRegistry,
    /// `None` disables 3PL dispatch and the delivery scans
    pub three_pl: Option<Arc<dyn ThreePlClient>>,
    pub notifiers: Notifiers,
    pub alert_sink: Arc<dyn AlertSink>,
}

/// 服务状态 - shared by every HTTP handler
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | workflow | status update entry point |
/// | orders | order repository |
/// | alerts | operator alert producer |
#[derive(Clone)]
pub struct PipelineState {
    pub config: Config,
    pub workflow: Arc<OrderStatusWorkflow>,
    pub orders: Arc<dyn OrderRepository>,
    pub alerts: AlertSender,
    pub three_pl_enabled: bool,
    pub aggregators: usize,
    pub started_at: Instant,
}

impl PipelineState {
    /// Wire the pipeline and register its background tasks
    ///
    /// Spawns the alert worker, the delivery worker (when 3PL is configured)
    /// and the cron scheduler on `tasks`.
    pub fn initialize(
        config: Config,
        collaborators: Collaborators,
        tasks: &mut BackgroundTasks,
    ) -> Self {
        let Collaborators {
            orders,
            stores,
            registry,
            three_pl,
            notifiers,
            alert_sink,
        } = collaborators;

        let (alerts, alert_rx) = AlertSender::channel(ALERT_CHANNEL_CAPACITY);
        tasks.spawn(
            "alert_worker",
            TaskKind::Worker,
            AlertWorker::new(alert_sink).run(alert_rx, tasks.shutdown_token()),
        );

        let three_pl_enabled = three_pl.is_some();
        let dispatch = three_pl.map(|client| {
            let (job_tx, job_rx) = mpsc::channel(DELIVERY_QUEUE_CAPACITY);
            let worker = DeliveryWorker::new(
                client.clone(),
                orders.clone(),
                alerts.clone(),
                config.dispatch_concurrency,
            );
            tasks.spawn(
                "delivery_worker",
                TaskKind::Worker,
                worker.run(job_rx, tasks.shutdown_token()),
            );
            Arc::new(DispatchSelector::new(
                client,
                orders.clone(),
                job_tx,
                config.retry_policy(),
            ))
        });

        let cron = CronScheduler::new(
            orders.clone(),
            stores.clone(),
            dispatch.clone(),
            alerts.clone(),
            config.scan_settings(),
        );
        tasks.spawn(
            "cron_scheduler",
            TaskKind::Periodic,
            cron.run(tasks.shutdown_token()),
        );

        let aggregators = registry.len();
        let workflow = Arc::new(OrderStatusWorkflow::new(
            orders.clone(),
            stores,
            registry,
            dispatch,
            notifiers,
            alerts.clone(),
            config.workflow_settings(),
        ));

        tracing::info!(
            aggregators,
            three_pl = three_pl_enabled,
            "Pipeline state initialized"
        );

        Self {
            config,
            workflow,
            orders,
            alerts,
            three_pl_enabled,
            aggregators,
            started_at: Instant::now(),
        }
    }
}
