//! Merged per-topic result

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::descriptor::PriorityTier;
use crate::error::FetchError;
use crate::payload::Payload;

/// A source that contributed data to a topic result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceContribution {
    pub source_name: String,
    pub tier: PriorityTier,
    pub from_cache: bool,
    #[serde(rename = "cache_age_ms", serialize_with = "serialize_age_ms")]
    pub cache_age: Option<Duration>,
}

/// A source that reported an error while fetching a topic
///
/// Sources served from a stale cache appear both here and in
/// [`TopicResult::sources`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFailure {
    pub source_name: String,
    #[serde(serialize_with = "serialize_error")]
    pub error: FetchError,
}

/// Transient result of one orchestration call for a topic
#[derive(Debug, Clone, Serialize)]
pub struct TopicResult {
    pub topic: String,
    /// Contributing sources in merge order
    pub sources: Vec<SourceContribution>,
    pub errors: Vec<SourceFailure>,
    /// `None` when no source yielded data
    pub data: Option<Payload>,
    pub fetched_at: DateTime<Utc>,
}

impl TopicResult {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            sources: Vec::new(),
            errors: Vec::new(),
            data: None,
            fetched_at: Utc::now(),
        }
    }

    /// Names of contributing sources in merge order
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.source_name.as_str()).collect()
    }

    /// True when no source yielded data
    pub fn is_empty(&self) -> bool {
        self.data.as_ref().map(|d| d.is_empty()).unwrap_or(true)
    }

    pub fn error_for(&self, source_name: &str) -> Option<&FetchError> {
        self.errors
            .iter()
            .find(|f| f.source_name == source_name)
            .map(|f| &f.error)
    }
}

fn serialize_age_ms<S: Serializer>(age: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
    match age {
        Some(age) => s.serialize_some(&(age.as_millis() as u64)),
        None => s.serialize_none(),
    }
}

fn serialize_error<S: Serializer>(error: &FetchError, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&error.to_string())
}
