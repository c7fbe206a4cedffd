//! Result of one cache-aware fetch

use std::time::Duration;

use serde_json::Value;

use crate::error::FetchError;

/// Outcome of `fetch_with_cache` for one source and topic
///
/// `data` and `error` are independent: a stale cache entry served after an
/// upstream failure carries both.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub data: Option<Value>,
    pub from_cache: bool,
    pub error: Option<FetchError>,
    /// Present only when `from_cache` is set
    pub cache_age: Option<Duration>,
}

impl FetchOutcome {
    /// Freshly fetched from upstream
    pub fn fetched(data: Value) -> Self {
        Self {
            data: Some(data),
            from_cache: false,
            error: None,
            cache_age: None,
        }
    }

    /// Served from cache, optionally annotated with the error that forced it
    pub fn cached(data: Value, age: Duration, error: Option<FetchError>) -> Self {
        Self {
            data: Some(data),
            from_cache: true,
            error,
            cache_age: Some(age),
        }
    }

    /// Nothing usable
    pub fn failed(error: FetchError) -> Self {
        Self {
            data: None,
            from_cache: false,
            error: Some(error),
            cache_age: None,
        }
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// Served from cache because the fresh path was unavailable
    pub fn is_degraded(&self) -> bool {
        self.from_cache && self.error.is_some()
    }
}
