//! Error types for the cache adapter
//!
//! Provides unified error handling using thiserror.

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Backend Error ==
/// Category of a failure reported by the remote key-value client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendErrorKind {
    /// The request was rejected as malformed (bad key, oversized value, ...)
    InvalidArgument,
    /// The named cache does not exist
    NotFound,
    /// A quota or rate limit was exceeded
    LimitExceeded,
    /// The request did not complete in time
    Timeout,
    /// The backend could not be reached
    Unavailable,
    /// Anything else
    Internal,
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendErrorKind::InvalidArgument => "invalid argument",
            BackendErrorKind::NotFound => "not found",
            BackendErrorKind::LimitExceeded => "limit exceeded",
            BackendErrorKind::Timeout => "timeout",
            BackendErrorKind::Unavailable => "unavailable",
            BackendErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// A failure reported by one of the backend primitives.
///
/// The adapter surfaces this value to its caller exactly as it was received.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Backend error ({kind}): {message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

// == Cache Error Enum ==
/// Unified error type for the cache adapter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    /// A caller-supplied argument was rejected before any backend call
    #[error("Invalid argument `{argument}`: {message}")]
    InvalidArgument {
        argument: &'static str,
        message: String,
    },

    /// The backend reported a failure; carried through unchanged
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A sidecar expiration field could not be decoded
    #[error("Malformed `{field}` field: {reason}")]
    MalformedField { field: &'static str, reason: String },

    /// The caller abandoned the operation before a skippable backend call
    #[error("Operation cancelled")]
    Cancelled,
}

impl CacheError {
    pub(crate) fn invalid_argument(argument: &'static str, message: impl Into<String>) -> Self {
        CacheError::InvalidArgument {
            argument,
            message: message.into(),
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache adapter.
pub type Result<T> = std::result::Result<T, CacheError>;

// == Configuration Error ==
/// Raised when configuration fails validation at bind time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

// == API Error ==
/// Errors returned by the HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Key not present in the cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Request body failed validation
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Failure from the cache adapter
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Cache(CacheError::InvalidArgument { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Cache(CacheError::MalformedField { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Cache(CacheError::Cancelled) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Cache(CacheError::Backend(e)) => match e.kind {
                BackendErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
                BackendErrorKind::NotFound => StatusCode::NOT_FOUND,
                BackendErrorKind::LimitExceeded => StatusCode::TOO_MANY_REQUESTS,
                BackendErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
                BackendErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
                BackendErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
