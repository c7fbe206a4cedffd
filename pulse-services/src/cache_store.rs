//! Shared in-memory cache
//!
//! Keys are `source:topic` strings, values are raw source payloads. The
//! store has no notion of TTL: every caller supplies the window it cares
//! about. Ages use `tokio::time::Instant` so a paused clock can age entries.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    inserted_at: Instant,
}

impl CacheEntry {
    fn age(&self) -> Duration {
        self.inserted_at.elapsed()
    }
}

/// Cheaply cloneable handle to one process-wide cache
#[derive(Debug, Clone, Default)]
pub struct CacheStore {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the entry for `key`, resetting its age to zero
    pub fn set(&self, key: impl Into<String>, value: Value) {
        let entry = CacheEntry {
            value,
            inserted_at: Instant::now(),
        };
        self.entries.write().insert(key.into(), entry);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().get(key).map(|e| e.value.clone())
    }

    /// Value and age read under one lock
    pub fn get_with_age(&self, key: &str) -> Option<(Value, Duration)> {
        self.entries
            .read()
            .get(key)
            .map(|e| (e.value.clone(), e.age()))
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Time since the last `set`, `Duration::MAX` if the key was never set
    pub fn age(&self, key: &str) -> Duration {
        self.entries
            .read()
            .get(key)
            .map(CacheEntry::age)
            .unwrap_or(Duration::MAX)
    }

    /// Entry exists and is younger than `ttl`
    pub fn is_fresh(&self, key: &str, ttl: Duration) -> bool {
        self.age(key) < ttl
    }

    /// Entry exists and is younger than `ttl`; callers pass the stale window
    pub fn is_stale(&self, key: &str, ttl: Duration) -> bool {
        self.age(key) < ttl
    }

    pub fn delete(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Remove every key starting with `prefix`, returning how many were removed
    pub fn clear_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - entries.len();
        debug!("Cleared {} cache entries with prefix {:?}", removed, prefix);
        removed
    }

    /// Remove entries older than `max_age`, returning how many were removed
    pub fn cleanup(&self, max_age: Duration) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.age() <= max_age);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Teardown hook
    pub fn flush(&self) {
        let count = self.len();
        self.clear();
        info!("Flushed {} cache entries", count);
    }
}
