use crate::response::api_response::ApiErrorResponse;
use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{rejection::JsonRejection, FromRequest};
use axum::response::{IntoResponse, Response};
use axum::{extract::Request, Json};
use serde::de::DeserializeOwned;
use thiserror::Error;
use validator::Validate;

use super::error_code;

#[derive(Debug, Error)]
pub enum RequestError {
    // 通用错误
    #[error("common request error:{0}")]
    CommonError(String),
    #[error(transparent)]
    ValidationError(#[from] validator::ValidationErrors),
    #[error(transparent)]
    JsonRejection(#[from] JsonRejection),
}

impl RequestError {
    fn get_code(&self) -> u32 {
        match self {
            RequestError::CommonError(_) => error_code::COMMON_REQUEST_ERROR,
            RequestError::ValidationError(_) => error_code::VALIDATION_ERROR,
            RequestError::JsonRejection(_) => error_code::JSON_REJECTION,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedRequest<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedRequest<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = RequestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedRequest(value))
    }
}

/// 可以不带请求体的接口；有内容时和 ValidatedRequest 一样解析并校验
#[derive(Debug, Clone, Default)]
pub struct OptionalRequest<T>(pub Option<T>);

#[async_trait]
impl<T, S> FromRequest<S> for OptionalRequest<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = RequestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|err| RequestError::CommonError(err.body_text()))?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(OptionalRequest(None));
        }
        let Json(value) = Json::<T>::from_bytes(&body)?;
        value.validate()?;
        Ok(OptionalRequest(Some(value)))
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        match self {
            RequestError::ValidationError(_) => ApiErrorResponse::send(
                400,
                self.get_code(),
                Some(self.to_string().replace('\n', ", ")),
            ),
            RequestError::JsonRejection(_) => {
                ApiErrorResponse::send(400, self.get_code(), Some(self.to_string()))
            }
            RequestError::CommonError(_) => {
                ApiErrorResponse::send(400, self.get_code(), Some(self.to_string()))
            }
        }
    }
}
