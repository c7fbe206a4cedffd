//! The contract every upstream adapter implements

use async_trait::async_trait;
use serde_json::Value;

use crate::descriptor::SourceDescriptor;
use crate::error::SourceResult;
use crate::payload::Payload;

/// A unit of data acquisition
///
/// `fetch` returns `Ok(None)` for recoverable conditions such as a missing
/// credential or an upstream that answered with nothing usable. `Err` is
/// reserved for transport-level failures. Caching, rate limiting and
/// timeouts are applied by the caller, never inside `fetch`.
#[async_trait]
pub trait Source: Send + Sync {
    /// Static metadata: name, tier, cache windows, rate budget
    fn descriptor(&self) -> &SourceDescriptor;

    /// Fetch the raw payload for a topic
    async fn fetch(&self, topic: &str) -> SourceResult<Option<Value>>;

    /// Transform a raw payload into the canonical field mapping
    fn normalize(&self, raw: &Value) -> Payload;

    fn name(&self) -> &str {
        &self.descriptor().name
    }

    /// Deterministic cache key for one (source, topic) pair
    fn cache_key(&self, topic: &str) -> String {
        format!("{}:{}", self.name(), topic)
    }
}
