//! Flash Relay error types.
//!
//! `ApiError` is what callers see: a fixed HTTP status and at most a one-line
//! JSON body. Everything else is internal and only ever reaches the logs.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use std::net::SocketAddr;

use crate::domain::config::ConfigError;

/// Caller-facing error with HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status returned to the caller
    pub status: StatusCode,
    /// Message for the `{"error": ...}` body; `None` sends no body
    pub message: Option<String>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
        }
    }

    /// Unauthorized - missing or unusable credential. Carries no body.
    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: None,
        }
    }

    /// Bad request - body could not be decoded
    pub fn bad_request(details: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, details)
    }

    /// Internal error
    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, details)
    }

    /// Backing service unavailable
    pub fn unavailable(details: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, details)
    }

    /// Request exceeded its time budget
    pub fn timeout(details: impl Into<String>) -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, details)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "[{}] {}", self.status.as_u16(), message),
            None => write!(f, "[{}]", self.status.as_u16()),
        }
    }
}

impl std::error::Error for ApiError {}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = match &self.message {
            Some(message) => (self.status, Json(ErrorBody { error: message })).into_response(),
            None => self.status.into_response(),
        };

        if self.status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}

/// Result type for handler operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Queue store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Network or protocol failure talking to the backend
    #[error("store backend error: {0}")]
    Backend(String),

    /// Backend did not answer within the configured timeout
    #[error("store operation timed out")]
    Timeout,

    /// Queue kept changing under an optimistic drain
    #[error("queue changed concurrently on every drain attempt ({attempts} attempts)")]
    Contention { attempts: u32 },

    /// A message could not be serialized
    #[error("failed to encode flash message: {0}")]
    Encode(String),

    /// A stored entry could not be decoded back into a message
    #[error("stored entry {index} is not a valid flash message: {reason}")]
    CorruptEntry { index: usize, reason: String },
}

/// Process-level errors (startup and serving).
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Configuration rejected
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Store could not be reached at startup
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Server socket bind error
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Server loop terminated with an I/O error
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}
