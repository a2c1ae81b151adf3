//! Error types for the marketplace client
//!
//! Every failure is decoded once at the HTTP boundary into a tagged variant so
//! callers never inspect response bodies themselves.

use serde::Deserialize;
use thiserror::Error;

// == Client Error Enum ==
/// Unified error type for the marketplace client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Backend unreachable, connection reset or request timed out
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response with the server-provided message
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Session is gone: the single silent refresh failed or was rejected
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Durable token storage could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request rejected locally before it was sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == Error Kind ==
/// Coarse classification used by the retry policy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    Unauthorized,
    Status,
    Decode,
    Terminal,
}

impl ClientError {
    /// Builds an `Http` error from a status code and raw response body.
    ///
    /// The backend answers errors as `{"error": "..."}`; anything else is kept verbatim.
    pub fn from_response(status: u16, body: &str) -> Self {
        #[derive(Deserialize)]
        struct ServerError {
            error: String,
        }

        let message = match serde_json::from_str::<ServerError>(body) {
            Ok(parsed) => parsed.error,
            Err(_) if body.trim().is_empty() => status_reason(status).to_string(),
            Err(_) => body.to_string(),
        };

        ClientError::Http { status, message }
    }

    /// Returns the retry-policy classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Network(_) => ErrorKind::Network,
            ClientError::Http { status: 401, .. } => ErrorKind::Unauthorized,
            ClientError::Http { .. } => ErrorKind::Status,
            ClientError::Decode(_) => ErrorKind::Decode,
            ClientError::AuthenticationRequired
            | ClientError::Storage(_)
            | ClientError::Config(_)
            | ClientError::InvalidRequest(_) => ErrorKind::Terminal,
        }
    }

    /// True when the caller should treat the session as signed out.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ClientError::AuthenticationRequired | ClientError::Http { status: 401, .. }
        )
    }

    /// Returns the HTTP status if this is an `Http` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ClientError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

fn status_reason(status: u16) -> &'static str {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown status")
}

// == Result Type Alias ==
/// Convenience Result type for the marketplace client.
pub type Result<T> = std::result::Result<T, ClientError>;
