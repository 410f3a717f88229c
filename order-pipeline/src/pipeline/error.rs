//! Workflow errors

use shared::order::{DeliveryService, OrderStatus};
use thiserror::Error;

use crate::aggregator::AggregatorError;
use crate::dispatch::DispatchError;
use crate::notify::NotifyError;
use crate::pos::TranslateError;
use crate::repository::RepoError;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Translate(#[from] TranslateError),

    /// Stale or duplicate event for a POS with a forward-only stream
    #[error("order status queue violation: {new} cannot follow {previous}")]
    ValidateOrderStatusQueue {
        previous: OrderStatus,
        new: OrderStatus,
    },

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error("{action} call to {service} failed: {source}")]
    Aggregator {
        service: DeliveryService,
        action: String,
        #[source]
        source: AggregatorError,
    },

    #[error("no aggregator client registered for {0}")]
    ClientNotRegistered(DeliveryService),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Notify(#[from] NotifyError),
}

impl WorkflowError {
    /// Error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::Translate(TranslateError::StatusIsNotExist { .. }) => "STATUS_IS_NOT_EXIST",
            WorkflowError::Translate(TranslateError::PosSystemIsIncorrect(_)) => {
                "POS_SYSTEM_IS_INCORRECT"
            }
            WorkflowError::Translate(TranslateError::InvalidStatusPriority { .. }) => {
                "INVALID_STATUS_PRIORITY"
            }
            WorkflowError::ValidateOrderStatusQueue { .. } => "VALIDATE_ORDER_STATUS_QUEUE",
            WorkflowError::Repo(RepoError::NotFound(_)) => "NOT_FOUND",
            WorkflowError::Repo(RepoError::Conflict { .. }) => "CONFLICT",
            WorkflowError::Repo(RepoError::Storage(_)) => "STORAGE_ERROR",
            WorkflowError::Aggregator { .. } => "AGGREGATOR_ERROR",
            WorkflowError::ClientNotRegistered(_) => "CLIENT_NOT_REGISTERED",
            WorkflowError::Dispatch(_) => "DISPATCH_ERROR",
            WorkflowError::Notify(_) => "NOTIFY_ERROR",
        }
    }
}
