//! Topic registry and tiered orchestration
//!
//! Sources are registered per topic and kept sorted by tier (stable on
//! registration order). `fetch_topic` fans out over the primary tier, falls
//! back to the secondary tier only when no primary source yielded data, and
//! finally walks the fallback tier one source at a time.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use pulse_core::{
    FetchError, FetchOutcome, Payload, PriorityTier, Source, SourceContribution, SourceFailure,
    TopicResult,
};

use crate::cache_store::CacheStore;
use crate::cached_source::CachedSource;
use crate::merge::merge_payloads;
use crate::rate_limiter::RateLimiterStats;

/// Pseudo-source name used for errors raised by the registry itself
pub const REGISTRY_SOURCE: &str = "registry";

pub struct SourceRegistry {
    cache: CacheStore,
    fetch_timeout: Duration,
    topics: HashMap<String, Vec<Arc<CachedSource>>>,
}

impl SourceRegistry {
    pub fn new(cache: CacheStore, fetch_timeout: Duration) -> Self {
        Self {
            cache,
            fetch_timeout,
            topics: HashMap::new(),
        }
    }

    /// Register `source` for `topic`
    ///
    /// Registering the same instance under several topics shares one rate
    /// limiter between them.
    pub fn register_source(&mut self, topic: &str, source: Arc<dyn Source>) {
        let existing = self
            .topics
            .values()
            .flatten()
            .find(|cached| Arc::ptr_eq(cached.source(), &source))
            .cloned();

        let cached = match existing {
            Some(cached) => cached,
            None => {
                if self.all_sources().any(|s| s.name() == source.name()) {
                    warn!(
                        "Source name {:?} registered twice with different instances, cache keys will collide",
                        source.name()
                    );
                }
                Arc::new(CachedSource::new(source, self.fetch_timeout))
            }
        };

        debug!(
            "Registered {} ({}) for topic {}",
            cached.name(),
            cached.descriptor().tier,
            topic
        );

        let sources = self.topics.entry(topic.to_string()).or_default();
        sources.push(cached);
        // Stable sort keeps registration order within a tier
        sources.sort_by_key(|s| s.descriptor().tier);
    }

    /// Convenience wrapper taking ownership of a concrete source
    pub fn register(&mut self, topic: &str, source: impl Source + 'static) {
        self.register_source(topic, Arc::new(source));
    }

    /// Registered topics, sorted
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.topics.keys().cloned().collect();
        topics.sort();
        topics
    }

    /// Source names for `topic` in fetch order
    pub fn sources_for(&self, topic: &str) -> Vec<String> {
        self.topics
            .get(topic)
            .map(|sources| sources.iter().map(|s| s.name().to_string()).collect())
            .unwrap_or_default()
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    fn all_sources(&self) -> impl Iterator<Item = &Arc<CachedSource>> {
        self.topics.values().flatten()
    }

    /// Rate limiter usage of every distinct source
    pub fn rate_limiter_stats(&self) -> Vec<RateLimiterStats> {
        let mut seen: Vec<&Arc<CachedSource>> = Vec::new();
        for source in self.all_sources() {
            if !seen.iter().any(|s| Arc::ptr_eq(s, source)) {
                seen.push(source);
            }
        }
        let mut stats: Vec<RateLimiterStats> = seen.iter().map(|s| s.limiter().stats()).collect();
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }

    /// Fetch and merge one topic. Never fails: problems end up in `errors`.
    #[instrument(skip(self))]
    pub async fn fetch_topic(&self, topic: &str) -> TopicResult {
        let mut result = TopicResult::new(topic);

        let Some(sources) = self.topics.get(topic).filter(|s| !s.is_empty()) else {
            warn!("No sources registered for topic {}", topic);
            result.errors.push(SourceFailure {
                source_name: REGISTRY_SOURCE.to_string(),
                error: FetchError::EmptyResult,
            });
            return result;
        };

        let mut yielded: Vec<(&CachedSource, serde_json::Value)> = Vec::new();

        for tier in PriorityTier::ALL {
            if !yielded.is_empty() {
                break;
            }
            let tier_sources: Vec<&CachedSource> = sources
                .iter()
                .filter(|s| s.descriptor().tier == tier)
                .map(|s| &**s)
                .collect();

            match tier {
                PriorityTier::Primary | PriorityTier::Secondary => {
                    let outcomes = join_all(
                        tier_sources
                            .iter()
                            .map(|s| s.fetch_with_cache(topic, &self.cache)),
                    )
                    .await;

                    for (source, outcome) in tier_sources.into_iter().zip(outcomes) {
                        record(&mut result, &mut yielded, source, outcome);
                    }
                }
                PriorityTier::Fallback => {
                    for source in tier_sources {
                        let outcome = source.fetch_with_cache(topic, &self.cache).await;
                        if record(&mut result, &mut yielded, source, outcome) {
                            break;
                        }
                    }
                }
            }
        }

        if !yielded.is_empty() {
            let normalized: Vec<Payload> = yielded
                .iter()
                .map(|(source, raw)| source.source().normalize(raw))
                .collect();
            result.data = Some(merge_payloads(normalized));
        }

        info!(
            "Topic {}: {} sources contributed {:?}, {} errors",
            topic,
            result.sources.len(),
            result.source_names(),
            result.errors.len()
        );
        result
    }

    /// Fetch several topics concurrently, results in input order
    pub async fn fetch_all_topics<S: AsRef<str>>(&self, topics: &[S]) -> Vec<TopicResult> {
        join_all(topics.iter().map(|t| self.fetch_topic(t.as_ref()))).await
    }
}

/// Fold one outcome into the topic result, returning whether it carried data
fn record<'a>(
    result: &mut TopicResult,
    yielded: &mut Vec<(&'a CachedSource, serde_json::Value)>,
    source: &'a CachedSource,
    outcome: FetchOutcome,
) -> bool {
    let has_data = outcome.has_data();
    if outcome.is_degraded() {
        debug!("{} served stale data for {}", source.name(), result.topic);
    }

    if let Some(error) = outcome.error {
        result.errors.push(SourceFailure {
            source_name: source.name().to_string(),
            error,
        });
    }

    if let Some(data) = outcome.data {
        result.sources.push(SourceContribution {
            source_name: source.name().to_string(),
            tier: source.descriptor().tier,
            from_cache: outcome.from_cache,
            cache_age: outcome.cache_age,
        });
        yielded.push((source, data));
    }
    has_data
}
