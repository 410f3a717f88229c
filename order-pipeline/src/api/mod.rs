//! API 路由模块
//!
//! - [`health`] - 健康检查
//! - [`webhooks`] - POS status webhooks

pub mod health;
pub mod webhooks;

use axum::{Router, body::Body, extract::Request, middleware, response::Response};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::core::PipelineState;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResponse, AppResult};

/// HTTP 请求日志中间件
async fn log_request(request: Request<Body>, next: middleware::Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let response = next.run(request).await;

    tracing::info!(
        target: "http_access",
        request_id = %request_id,
        "{} {} {}",
        method,
        uri,
        response.status()
    );
    response
}

/// Build the router without state
pub fn build_app() -> Router<PipelineState> {
    Router::<PipelineState>::new()
        .merge(health::router())
        .merge(webhooks::router())
}

/// Router with state and middleware applied
pub fn build_router(state: PipelineState) -> Router {
    build_app()
        .with_state(state)
        .layer(middleware::from_fn(log_request))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CorsLayer::permissive()),
        )
}
