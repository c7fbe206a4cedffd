//! Pulse Services
//!
//! Caching, rate limiting and orchestration on top of the source adapters:
//! - `CacheStore`: shared in-memory cache keyed by source and topic
//! - `RateLimiter`: per-source fixed window request budget
//! - `CachedSource`: the cache-aware fetch state machine
//! - `SourceRegistry`: tiered fan-out and merge per topic

pub mod cache_store;
pub mod cached_source;
pub mod catalog;
pub mod config;
pub mod housekeeping;
pub mod merge;
pub mod rate_limiter;
pub mod registry;

pub use cache_store::CacheStore;
pub use cached_source::CachedSource;
pub use catalog::{build_default_registry, DEFAULT_TOPICS};
pub use config::{ConfigError, EngineConfig};
pub use housekeeping::spawn_cache_cleanup;
pub use merge::{item_identity, merge_payloads};
pub use rate_limiter::{RateLimiter, RateLimiterStats};
pub use registry::SourceRegistry;
