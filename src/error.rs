//! HTTP-facing error type.
//!
//! Device failures are not errors at this level: they are reported inside a
//! normal `{"ok": false, "error": ...}` body. `AppError` covers what the HTTP
//! layer itself rejects.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// A specialized `Result` type for REST handlers.
pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Request body could not be decoded into the expected shape.
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("not found")]
    NotFound,

    /// The device task did not complete.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidJson(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}
