//! Unified error types for edgesearch.
//!
//! Every variant maps onto one of the numeric codes carried in the response
//! envelope, see [`Error::envelope_code`].

use tokio_rusqlite::rusqlite;

/// Envelope code for a successful response.
pub const CODE_SUCCESS: i32 = 0;

/// Envelope code for requests turned away by the abuse gate.
pub const CODE_BLOCKED: i32 = 1050;

/// Envelope code for a missing or empty query.
pub const CODE_MISSING_QUERY: i32 = 1100;

/// Envelope code for any upstream or cache failure.
pub const CODE_UPSTREAM_FAILED: i32 = 1105;

/// Unified error types for the search gateway.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Request rejected by the abuse gate.
    #[error("BLOCKED: bot or high threat score")]
    Blocked,

    /// Query text absent or empty after trimming.
    #[error("MISSING_QUERY: query is missing")]
    MissingQuery,

    /// The provider call failed or returned an unusable body.
    #[error("UPSTREAM_UNAVAILABLE: {0}")]
    UpstreamUnavailable(String),

    /// Durable tier operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Cache key rejected before touching a tier.
    #[error("CACHE_ERROR: invalid key: {0}")]
    InvalidKey(String),
}

impl Error {
    /// Code carried in the `error` field of the response envelope.
    ///
    /// Cache failures are reported exactly like upstream failures.
    pub fn envelope_code(&self) -> i32 {
        match self {
            Error::Blocked => CODE_BLOCKED,
            Error::MissingQuery => CODE_MISSING_QUERY,
            Error::UpstreamUnavailable(_) | Error::Database(_) | Error::MigrationFailed(_) | Error::InvalidKey(_) => {
                CODE_UPSTREAM_FAILED
            }
        }
    }

    /// Human-readable message carried in the `info` field of the envelope.
    pub fn envelope_info(&self) -> &'static str {
        match self.envelope_code() {
            CODE_BLOCKED => "Bots aren't allowed to use this API endpoint.",
            CODE_MISSING_QUERY => "Query is missing!",
            _ => "Something went wrong while trying to fetch search results.",
        }
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
