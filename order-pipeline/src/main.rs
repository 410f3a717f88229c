use anyhow::Context;
use order_pipeline::aggregator::{AggregatorRegistry, WebhookClient};
use order_pipeline::api::build_router;
use order_pipeline::dispatch::{HttpThreePlClient, ThreePlClient};
use order_pipeline::notify::{Notifiers, TracingAlertSink};
use order_pipeline::repository::InMemoryRepository;
use order_pipeline::{BackgroundTasks, Collaborators, Config, PipelineState, init_logger, print_banner};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 设置环境 (dotenv, 日志)
    dotenv::dotenv().ok();
    let config = Config::from_env();
    init_logger(&config.log_level, config.log_dir.as_deref());

    print_banner();
    tracing::info!(environment = %config.environment, "Order pipeline starting...");

    // 2. 存储
    let repo = match &config.seed_file {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read seed file {path}"))?;
            let repo = InMemoryRepository::from_seed_json(&json)?;
            tracing::info!(path = %path, orders = repo.order_count(), "Seed loaded");
            repo
        }
        None => InMemoryRepository::new(),
    };
    let repo = Arc::new(repo);

    // 3. 外部协作方
    let registry = AggregatorRegistry::new().with(Arc::new(WebhookClient::new(
        config.outbound_timeout(),
    )?));

    let three_pl: Option<Arc<dyn ThreePlClient>> = match &config.three_pl_base_url {
        Some(url) => Some(Arc::new(HttpThreePlClient::new(url.clone(), config.outbound_timeout())?)),
        None => {
            tracing::warn!("THREE_PL_BASE_URL not set, 3PL dispatch disabled");
            None
        }
    };

    let collaborators = Collaborators {
        orders: repo.clone(),
        stores: repo,
        registry,
        three_pl,
        notifiers: Notifiers::tracing(),
        alert_sink: Arc::new(TracingAlertSink),
    };

    // 4. 状态 + 后台任务
    let mut tasks = BackgroundTasks::new();
    let state = PipelineState::initialize(config.clone(), collaborators, &mut tasks);
    tasks.log_summary();

    // 5. HTTP 服务
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        })
        .await
        .context("HTTP server error")?;

    tasks.shutdown().await;
    Ok(())
}
