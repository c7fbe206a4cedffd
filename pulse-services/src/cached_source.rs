//! Cache-aware fetch state machine for one source
//!
//! ```text
//! fresh cache hit ──► return cached
//! rate limited ─────► stale cache (rate_limited) | nothing (rate_limited)
//! fetch ok ─────────► store + return
//! fetch empty ──────► any cache (fetch_empty)    | nothing (fetch_empty)
//!                     (empty JSON, or nothing left after `normalize`)
//! fetch failed ─────► stale cache (message)      | nothing (message)
//! ```
//!
//! No error escapes: every path ends in a [`FetchOutcome`].

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use pulse_core::{
    is_empty_payload, FetchError, FetchOutcome, Source, SourceDescriptor, SourceError,
};

use crate::cache_store::CacheStore;
use crate::rate_limiter::RateLimiter;

/// A source paired with its own rate limiter and request timeout
pub struct CachedSource {
    source: Arc<dyn Source>,
    limiter: RateLimiter,
    timeout: Duration,
}

impl CachedSource {
    pub fn new(source: Arc<dyn Source>, timeout: Duration) -> Self {
        let descriptor = source.descriptor();
        let limiter = RateLimiter::new(&descriptor.name, descriptor.rate_budget);
        Self {
            source,
            limiter,
            timeout,
        }
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn descriptor(&self) -> &SourceDescriptor {
        self.source.descriptor()
    }

    pub fn source(&self) -> &Arc<dyn Source> {
        &self.source
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Fetch `topic`, consulting and updating `cache`
    pub async fn fetch_with_cache(&self, topic: &str, cache: &CacheStore) -> FetchOutcome {
        let descriptor = self.source.descriptor();
        let key = self.source.cache_key(topic);

        // Fresh entries skip the network and the limiter entirely
        if let Some((data, age)) = cache.get_with_age(&key) {
            if age < descriptor.fresh_ttl {
                debug!("[{}] Cache hit for {} ({:?} old)", descriptor.name, topic, age);
                return FetchOutcome::cached(data, age, None);
            }
        }

        if self.limiter.is_exhausted() {
            warn!(
                "[{}] Rate budget exhausted, {:?} until reset",
                descriptor.name,
                self.limiter.resets_in()
            );
            return self.stale_or_fail(&key, cache, FetchError::RateLimited);
        }

        self.limiter.record_request();
        debug!("[{}] Fetching {} from upstream", descriptor.name, topic);

        let result = match tokio::time::timeout(self.timeout, self.source.fetch(topic)).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(self.timeout)),
        };

        match result {
            Ok(Some(data)) if self.has_content(&data) => {
                cache.set(key, data.clone());
                FetchOutcome::fetched(data)
            }
            Ok(_) => {
                debug!("[{}] Empty result for {}", descriptor.name, topic);
                // Any entry will do here, however old
                match cache.get_with_age(&key) {
                    Some((data, age)) => FetchOutcome::cached(data, age, Some(FetchError::EmptyResult)),
                    None => FetchOutcome::failed(FetchError::EmptyResult),
                }
            }
            Err(e) => {
                warn!("[{}] Fetch failed for {}: {}", descriptor.name, topic, e);
                self.stale_or_fail(&key, cache, to_fetch_error(e))
            }
        }
    }

    /// Upstreams often answer "no matches" with a well-formed envelope
    /// (`{"items": []}`), so a payload that normalizes to nothing is empty too
    fn has_content(&self, data: &Value) -> bool {
        !is_empty_payload(data) && !self.source.normalize(data).is_empty()
    }

    /// Serve an entry inside the stale window, or fail with `error`
    fn stale_or_fail(&self, key: &str, cache: &CacheStore, error: FetchError) -> FetchOutcome {
        match cache.get_with_age(key) {
            Some((data, age)) if age < self.source.descriptor().stale_ttl => {
                debug!("[{}] Serving stale entry ({:?} old)", self.name(), age);
                FetchOutcome::cached(data, age, Some(error))
            }
            _ => FetchOutcome::failed(error),
        }
    }
}

fn to_fetch_error(error: SourceError) -> FetchError {
    match error {
        SourceError::Timeout(after) => FetchError::Network(format!("timed out after {:?}", after)),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use pulse_core::{Payload, PriorityTier, RateBudget, SourceResult};
    use serde_json::json;

    /// Replays canned responses in order, repeating the last one
    struct Scripted {
        descriptor: SourceDescriptor,
        responses: parking_lot::Mutex<Vec<SourceResult<Option<Value>>>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(budget: u32, responses: Vec<SourceResult<Option<Value>>>) -> Arc<Self> {
            Arc::new(Self {
                descriptor: SourceDescriptor::new(
                    "scripted",
                    PriorityTier::Primary,
                    Duration::from_secs(300),
                    Duration::from_secs(3600),
                    RateBudget::per_minute(budget),
                ),
                responses: parking_lot::Mutex::new(responses),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Source for Scripted {
        fn descriptor(&self) -> &SourceDescriptor {
            &self.descriptor
        }

        async fn fetch(&self, _topic: &str) -> SourceResult<Option<Value>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock();
            if responses.len() > 1 {
                responses.remove(0)
            } else {
                responses[0].clone()
            }
        }

        fn normalize(&self, raw: &Value) -> Payload {
            raw.as_object().cloned().unwrap_or_default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_result_falls_back_to_expired_entry() {
        let source = Scripted::new(10, vec![Ok(Some(json!({"v": 1}))), Ok(Some(json!([])))]);
        let cached = CachedSource::new(source.clone(), Duration::from_secs(5));
        let cache = CacheStore::new();

        assert_eq!(cached.fetch_with_cache("t", &cache).await, FetchOutcome::fetched(json!({"v": 1})));

        // Past the stale window, an empty fetch still serves the old entry
        tokio::time::advance(Duration::from_secs(7200)).await;
        let outcome = cached.fetch_with_cache("t", &cache).await;
        assert_eq!(outcome.data, Some(json!({"v": 1})));
        assert_eq!(outcome.error, Some(FetchError::EmptyResult));
        assert_eq!(outcome.cache_age, Some(Duration::from_secs(7200)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_result_without_cache() {
        let source = Scripted::new(10, vec![Ok(None)]);
        let cached = CachedSource::new(source, Duration::from_secs(5));
        let outcome = cached.fetch_with_cache("t", &CacheStore::new()).await;
        assert_eq!(outcome, FetchOutcome::failed(FetchError::EmptyResult));
        assert_eq!(outcome.error.unwrap().to_string(), "fetch_empty");
    }

    #[tokio::test(start_paused = true)]
    async fn test_envelope_without_items_is_empty() {
        let source = Scripted::new(
            10,
            vec![Ok(Some(json!({"v": 1}))), Ok(Some(json!({"total_count": 0, "items": []})))],
        );
        // Drops the count and empty lists the way the real adapters do
        struct ItemsOnly(Arc<Scripted>);

        #[async_trait]
        impl Source for ItemsOnly {
            fn descriptor(&self) -> &SourceDescriptor {
                self.0.descriptor()
            }

            async fn fetch(&self, topic: &str) -> SourceResult<Option<Value>> {
                self.0.fetch(topic).await
            }

            fn normalize(&self, raw: &Value) -> Payload {
                let mut payload = self.0.normalize(raw);
                payload.retain(|k, v| k != "total_count" && !is_empty_payload(v));
                payload
            }
        }

        let cached = CachedSource::new(Arc::new(ItemsOnly(source.clone())), Duration::from_secs(5));
        let cache = CacheStore::new();
        cached.fetch_with_cache("t", &cache).await;

        tokio::time::advance(Duration::from_secs(600)).await;
        let outcome = cached.fetch_with_cache("t", &cache).await;

        assert_eq!(outcome.error, Some(FetchError::EmptyResult));
        assert_eq!(outcome.data, Some(json!({"v": 1})));
        // The empty envelope never replaced the good entry
        assert_eq!(cache.get("scripted:t"), Some(json!({"v": 1})));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_past_stale_window_returns_nothing() {
        let source = Scripted::new(
            10,
            vec![Ok(Some(json!({"v": 1}))), Err(SourceError::http(503, "Service Unavailable"))],
        );
        let cached = CachedSource::new(source, Duration::from_secs(5));
        let cache = CacheStore::new();
        cached.fetch_with_cache("t", &cache).await;

        tokio::time::advance(Duration::from_secs(3600)).await;
        let outcome = cached.fetch_with_cache("t", &cache).await;
        assert_eq!(outcome.data, None);
        assert_eq!(
            outcome.error,
            Some(FetchError::Network("HTTP error (status 503): Service Unavailable".to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_a_network_failure() {
        struct Hanging(SourceDescriptor);

        #[async_trait]
        impl Source for Hanging {
            fn descriptor(&self) -> &SourceDescriptor {
                &self.0
            }

            async fn fetch(&self, _topic: &str) -> SourceResult<Option<Value>> {
                std::future::pending().await
            }

            fn normalize(&self, _raw: &Value) -> Payload {
                Payload::new()
            }
        }

        let descriptor = SourceDescriptor::new(
            "hanging",
            PriorityTier::Primary,
            Duration::from_secs(60),
            Duration::from_secs(60),
            RateBudget::per_minute(1),
        );
        let cached = CachedSource::new(Arc::new(Hanging(descriptor)), Duration::from_secs(2));
        let outcome = cached.fetch_with_cache("t", &CacheStore::new()).await;
        assert_eq!(outcome.error, Some(FetchError::Network("timed out after 2s".to_string())));
        assert_eq!(cached.limiter().stats().total_requests, 1);
    }
}
