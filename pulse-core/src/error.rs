//! Error types for the aggregation engine

use std::time::Duration;

use thiserror::Error;

/// Errors a source may return from its raw `fetch()`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Transport-level failure (DNS, TLS, connection reset, body read)
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Upstream answered with a non-success status
    #[error("HTTP error (status {status}): {message}")]
    Http { status: u16, message: String },

    /// The whole response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// The request did not complete in time
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

impl SourceError {
    pub fn request_failed(msg: impl Into<String>) -> Self {
        SourceError::RequestFailed(msg.into())
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        SourceError::Http {
            status,
            message: message.into(),
        }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        SourceError::Parse(msg.into())
    }
}

/// Result type alias for raw source fetches
pub type SourceResult<T> = Result<T, SourceError>;

/// Typed error kind carried by a [`FetchOutcome`](crate::FetchOutcome)
///
/// The display strings are stable diagnostics consumed downstream:
/// `rate_limited`, `fetch_empty`, or the upstream message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Transport failure or non-success HTTP status
    #[error("{0}")]
    Network(String),

    /// The local request budget for this source is exhausted
    #[error("rate_limited")]
    RateLimited,

    /// Fetch succeeded but produced no usable payload
    #[error("fetch_empty")]
    EmptyResult,

    /// The payload could not be decoded
    #[error("{0}")]
    Parse(String),
}

impl FetchError {
    /// Short machine-readable kind, independent of the message
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "network",
            FetchError::RateLimited => "rate_limited",
            FetchError::EmptyResult => "fetch_empty",
            FetchError::Parse(_) => "parse",
        }
    }
}

impl From<SourceError> for FetchError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Parse(_) => FetchError::Parse(err.to_string()),
            other => FetchError::Network(other.to_string()),
        }
    }
}
