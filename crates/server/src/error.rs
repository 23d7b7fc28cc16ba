//! API error types.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use rangedrop_auth::AuthError;
use rangedrop_protocol::{ErrorBody, RangeError};
use rangedrop_transfer::TransferError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("upload not found: {0}")]
    NotFound(String),

    #[error("upload not initialized: {0}")]
    NotInitialized(String),

    #[error("upload already initialized: {0}")]
    Conflict(String),

    #[error("total size mismatch")]
    SizeMismatch { expected: u64, received: u64 },

    #[error("range not satisfiable")]
    RangeNotSatisfiable { size: u64 },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::NotInitialized(_) => "not_initialized",
            Self::Conflict(_) => "already_initialized",
            Self::SizeMismatch { .. } => "size_mismatch",
            Self::RangeNotSatisfiable { .. } => "range_not_satisfiable",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NotInitialized(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::SizeMismatch { .. } => StatusCode::BAD_REQUEST,
            Self::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut body = ErrorBody::new(self.code(), self.to_string());

        match self {
            Self::SizeMismatch { expected, received } => {
                body.expected = Some(expected);
                body.received = Some(received);
            }
            Self::RangeNotSatisfiable { size } => {
                let mut response = (status, Json(body)).into_response();
                if let Ok(value) = HeaderValue::from_str(&format!("bytes */{size}")) {
                    response.headers_mut().insert(header::CONTENT_RANGE, value);
                }
                return response;
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}

impl From<TransferError> for ApiError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::InvalidArgument(msg) => Self::BadRequest(msg),
            TransferError::NotFound(id) => Self::NotFound(id),
            TransferError::AlreadyInitialized(id) => Self::Conflict(id),
            TransferError::SizeMismatch { expected, declared } => Self::SizeMismatch {
                expected,
                received: declared,
            },
            TransferError::NotInitialized(id) => Self::NotInitialized(id),
            TransferError::RangeNotSatisfiable { size } => Self::RangeNotSatisfiable { size },
            TransferError::Io(e) => {
                tracing::error!(error = %e, "storage failure");
                Self::Internal(e.to_string())
            }
        }
    }
}

impl From<RangeError> for ApiError {
    fn from(err: RangeError) -> Self {
        match err {
            RangeError::Malformed(msg) => Self::BadRequest(format!("invalid range: {msg}")),
            RangeError::Unsatisfiable { size } => Self::RangeNotSatisfiable { size },
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Signing(msg) => Self::Internal(msg),
            other => Self::Unauthorized(other.to_string()),
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
