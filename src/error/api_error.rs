use crate::error::{db_error::DbError, queue_error::QueueError};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use super::request_error::RequestError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    QueueError(#[from] QueueError),
    #[error(transparent)]
    DbError(#[from] DbError),
    #[error(transparent)]
    RequestError(#[from] RequestError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::QueueError(error) => error.into_response(),
            ApiError::DbError(error) => error.into_response(),
            ApiError::RequestError(error) => error.into_response(),
        }
    }
}
