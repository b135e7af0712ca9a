//! Typed error split used across the HTTP boundary.
//!
//! `PublicError` is safe to return verbatim to a caller and always maps to a 4xx status with a
//! `VALIDATION_ERROR` or `NOT_FOUND` code. `PrivateError` is logged at `error!` level via
//! `tracing` and surfaced to the caller only as a generic `INTERNAL_ERROR`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

pub type ApiResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    NotFound,
    InternalError,
}

/// Caller-facing error: the message is returned verbatim, so it must never contain anything
/// sensitive.
#[derive(Debug, Clone)]
pub enum PublicError {
    Validation(String),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Unauthorized,
}

/// Server-side failure: logged in full, never echoed back to the caller.
#[derive(Debug)]
pub enum PrivateError {
    Internal(String),
}

#[derive(Debug)]
pub enum AppError {
    Public(PublicError),
    Private(PrivateError),
}

impl From<PublicError> for AppError {
    fn from(e: PublicError) -> Self {
        AppError::Public(e)
    }
}

impl From<PrivateError> for AppError {
    fn from(e: PrivateError) -> Self {
        AppError::Private(e)
    }
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Public(PublicError::Validation(message.into()))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::Public(PublicError::NotFound(message.into()))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Private(PrivateError::Internal(message.into()))
    }

    fn parts(&self) -> (StatusCode, ErrorCode, String) {
        match self {
            AppError::Public(PublicError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, ErrorCode::ValidationError, msg.clone())
            }
            AppError::Public(PublicError::BadRequest(msg)) => {
                (StatusCode::BAD_REQUEST, ErrorCode::ValidationError, msg.clone())
            }
            AppError::Public(PublicError::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, ErrorCode::NotFound, msg.clone())
            }
            AppError::Public(PublicError::Conflict(msg)) => {
                (StatusCode::CONFLICT, ErrorCode::ValidationError, msg.clone())
            }
            AppError::Public(PublicError::Unauthorized) => (
                StatusCode::UNAUTHORIZED,
                ErrorCode::ValidationError,
                "unauthorized".to_string(),
            ),
            AppError::Private(PrivateError::Internal(msg)) => {
                error!(target: "error", "internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::InternalError,
                    "internal error".to_string(),
                )
            }
        }
    }
}

/// `{success: false, code, message}`.
#[derive(Serialize)]
struct ErrorEnvelope {
    success: bool,
    code: ErrorCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        (status, Json(ErrorEnvelope { success: false, code, message })).into_response()
    }
}

/// `{success: true, data}`.
#[derive(Serialize)]
pub struct DataEnvelope<T> {
    success: bool,
    data: T,
}

/// Wraps a handler's output in the uniform success envelope.
pub fn ok<T: Serialize>(data: T) -> Json<DataEnvelope<T>> {
    Json(DataEnvelope { success: true, data })
}
