//! 健康检查路由
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /health | GET | 简单健康检查 |

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::PipelineState;

pub fn router() -> Router<PipelineState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// ok
    status: &'static str,
    version: &'static str,
    environment: String,
    uptime_seconds: u64,
    aggregators: usize,
    three_pl_enabled: bool,
}

async fn health(State(state): State<PipelineState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        aggregators: state.aggregators,
        three_pl_enabled: state.three_pl_enabled,
    })
}
