use crate::error::error_code;
use crate::model::queue::{ContentType, QueueStatus};
use crate::response::api_response::ApiErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum QueueError {
    #[error("queue item {0} not found")]
    NotFound(String),
    #[error("history entry {0} not found")]
    HistoryNotFound(String),
    #[error("queue item {id} is {status}, expected {expected}")]
    InvalidTransition {
        id: String,
        status: QueueStatus,
        expected: QueueStatus,
    },
    #[error("{0} submissions are currently disabled")]
    Disabled(ContentType),
    #[error("display slot is still held by {0}")]
    SlotBusy(String),
}

impl QueueError {
    fn get_code(&self) -> u32 {
        match self {
            QueueError::NotFound(_) => error_code::QUEUE_ITEM_NOT_FOUND,
            QueueError::HistoryNotFound(_) => error_code::HISTORY_NOT_FOUND,
            QueueError::InvalidTransition { .. } => error_code::INVALID_TRANSITION,
            QueueError::Disabled(_) => error_code::SUBMISSION_DISABLED,
            QueueError::SlotBusy(_) => error_code::SLOT_BUSY,
        }
    }
}

impl IntoResponse for QueueError {
    fn into_response(self) -> Response {
        let status_code = match self {
            QueueError::NotFound(_) => StatusCode::NOT_FOUND,
            QueueError::HistoryNotFound(_) => StatusCode::NOT_FOUND,
            QueueError::InvalidTransition { .. } => StatusCode::CONFLICT,
            QueueError::Disabled(_) => StatusCode::FORBIDDEN,
            QueueError::SlotBusy(_) => StatusCode::CONFLICT,
        };

        ApiErrorResponse::send(
            status_code.as_u16(),
            self.get_code(),
            Some(self.to_string()),
        )
    }
}
