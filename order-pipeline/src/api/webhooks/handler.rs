//! POS Webhook Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::order::PosKind;

use crate::core::PipelineState;
use crate::pipeline::{Outcome, StatusEvent, WorkflowError};
use crate::pos::TranslateError;
use crate::utils::{AppResponse, AppResult, ok};

/// Status update body
#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    /// Order key in the POS's own identifier scheme
    pub order_id: String,
    /// Raw POS status
    pub status: String,
    #[serde(default)]
    pub error_detail: Option<String>,
}

/// Run one status update through the workflow
pub async fn update_status(
    State(state): State<PipelineState>,
    Path(pos): Path<String>,
    Json(payload): Json<StatusUpdateRequest>,
) -> AppResult<Json<AppResponse<Outcome>>> {
    let pos = pos
        .parse::<PosKind>()
        .map_err(|_| WorkflowError::Translate(TranslateError::PosSystemIsIncorrect(pos.clone())))?;

    let event = StatusEvent {
        pos,
        reference: payload.order_id,
        raw_status: payload.status,
        error_detail: payload.error_detail.filter(|d| !d.is_empty()),
    };

    let outcome = state.workflow.update_order_status(&event).await?;
    Ok(ok(outcome))
}
