use crate::error::error_code;
use crate::response::api_response::ApiErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("{0}")]
    SomethingWentWrong(String),
    #[error("Duplicate entry exists")]
    UniqueConstraintViolation(String),
}

impl DbError {
    /// 记录错误日志并转换为 DbError
    pub fn log(context: &str, err: sqlx::Error) -> Self {
        tracing::error!("{context} - db error :{}", err.to_string());
        match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DbError::UniqueConstraintViolation(db_err.to_string())
            }
            err => DbError::SomethingWentWrong(err.to_string()),
        }
    }

    fn get_code(&self) -> u32 {
        match self {
            DbError::SomethingWentWrong(_) => error_code::SOMETHING_WENT_WRONG,
            DbError::UniqueConstraintViolation(_) => error_code::UNIQUE_CONSTRAINT_VIOLATION,
        }
    }
}

impl IntoResponse for DbError {
    fn into_response(self) -> Response {
        let status_code = match self {
            DbError::SomethingWentWrong(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DbError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,
        };

        ApiErrorResponse::send(
            status_code.as_u16(),
            self.get_code(),
            Some(self.to_string()),
        )
    }
}
