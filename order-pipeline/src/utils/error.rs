//! 统一错误处理
//!
//! [`AppError`] maps workflow failures onto HTTP responses:
//!
//! | Error                                   | Status |
//! |-----------------------------------------|--------|
//! | order / store not found                 | 404    |
//! | unknown status, POS, queue violation    | 422    |
//! | compare-and-swap conflict               | 409    |
//! | aggregator / 3PL / notification failure | 502    |
//! | anything else                           | 500    |
//!
//! Body: `{ "code": "...", "message": "..." }`

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::pipeline::WorkflowError;
use crate::pos::TranslateError;
use crate::repository::RepoError;

/// API 统一响应结构
#[derive(Debug, Serialize)]
pub struct AppResponse<T> {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 404
    #[error("Resource not found: {message}")]
    NotFound { code: &'static str, message: String },

    /// 409
    #[error("Conflict: {message}")]
    Conflict { code: &'static str, message: String },

    /// 422
    #[error("Unprocessable: {message}")]
    Unprocessable { code: &'static str, message: String },

    /// 502
    #[error("Upstream failure: {message}")]
    Upstream { code: &'static str, message: String },

    /// 500
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::NotFound { code, message } => (StatusCode::NOT_FOUND, code, message),
            AppError::Conflict { code, message } => (StatusCode::CONFLICT, code, message),
            AppError::Unprocessable { code, message } => {
                (StatusCode::UNPROCESSABLE_ENTITY, code, message)
            }
            AppError::Upstream { code, message } => (StatusCode::BAD_GATEWAY, code, message),
            AppError::Internal(message) => {
                error!(target: "internal", error = %message, "Internal error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(AppResponse::<()> {
            code: code.to_string(),
            message,
            data: None,
        });
        (status, body).into_response()
    }
}

impl From<WorkflowError> for AppError {
    fn from(e: WorkflowError) -> Self {
        let code = e.code();
        let message = e.to_string();
        match e {
            WorkflowError::Repo(RepoError::NotFound(_)) => AppError::NotFound { code, message },
            WorkflowError::Repo(RepoError::Conflict { .. }) => AppError::Conflict { code, message },
            WorkflowError::Translate(
                TranslateError::StatusIsNotExist { .. }
                | TranslateError::PosSystemIsIncorrect(_)
                | TranslateError::InvalidStatusPriority { .. },
            )
            | WorkflowError::ValidateOrderStatusQueue { .. } => {
                AppError::Unprocessable { code, message }
            }
            WorkflowError::Aggregator { .. }
            | WorkflowError::Dispatch(_)
            | WorkflowError::Notify(_) => AppError::Upstream { code, message },
            WorkflowError::Repo(RepoError::Storage(_)) | WorkflowError::ClientNotRegistered(_) => {
                AppError::Internal(message)
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Create a successful response
pub fn ok<T: Serialize>(data: T) -> Json<AppResponse<T>> {
    Json(AppResponse {
        code: "OK".to_string(),
        message: "Success".to_string(),
        data: Some(data),
    })
}
