//! POS Webhook API Module
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/pos/{pos}/status | POST | raw POS status update |

mod handler;

pub use handler::StatusUpdateRequest;

use axum::{Router, routing::post};

use crate::core::PipelineState;

pub fn router() -> Router<PipelineState> {
    Router::new().nest("/api/pos", routes())
}

fn routes() -> Router<PipelineState> {
    Router::new().route("/{pos}/status", post(handler::update_status))
}
