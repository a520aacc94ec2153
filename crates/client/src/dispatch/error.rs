//! Provider dispatch error types.
//!
//! These never leave the dispatcher: [`HttpDispatcher`](super::HttpDispatcher)
//! logs them and reports a plain miss to the pipeline.

use std::sync::Arc;

/// Errors from an upstream provider call.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Authentication failed (invalid or revoked credential).
    #[error("authentication failed: status {status}")]
    AuthError { status: u16 },

    /// Rate limited by the provider.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// Any other non-success status.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response body is not JSON.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { DispatchError::Timeout } else { DispatchError::Network(Arc::new(err)) }
    }
}

impl DispatchError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => DispatchError::AuthError { status },
            429 => DispatchError::RateLimited,
            _ => DispatchError::HttpError { status },
        }
    }
}
