//! Crypto Fear & Greed index from alternative.me

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use pulse_core::{Payload, PriorityTier, RateBudget, Source, SourceDescriptor, SourceResult};

use crate::http::get_json;

const FEAR_GREED_API: &str = "https://api.alternative.me/fng/";

/// Days of history requested alongside the current reading
const HISTORY_DAYS: usize = 7;

#[derive(Debug, Deserialize)]
struct FearGreedResponse {
    #[serde(default)]
    data: Vec<FearGreedReading>,
}

/// Upstream reports every number as a string
#[derive(Debug, Deserialize)]
struct FearGreedReading {
    value: String,
    value_classification: String,
    timestamp: String,
}

impl FearGreedReading {
    fn to_json(&self) -> Option<Value> {
        let value: u32 = self.value.trim().parse().ok()?;
        let date = self
            .timestamp
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .map(|dt| dt.to_rfc3339());

        Some(json!({
            "value": value,
            "classification": self.value_classification,
            "date": date,
        }))
    }
}

pub struct FearGreedSource {
    http: Client,
    pub(crate) descriptor: SourceDescriptor,
    url: String,
}

impl FearGreedSource {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            descriptor: Self::default_descriptor(),
            url: FEAR_GREED_API.to_string(),
        }
    }

    pub fn default_descriptor() -> SourceDescriptor {
        SourceDescriptor::new(
            "fear_greed",
            PriorityTier::Primary,
            Duration::from_secs(30 * 60),
            Duration::from_secs(24 * 60 * 60),
            RateBudget::per_minute(30),
        )
    }
}

#[async_trait]
impl Source for FearGreedSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    async fn fetch(&self, _topic: &str) -> SourceResult<Option<Value>> {
        debug!("[FearGreed] Fetching index with {} days of history", HISTORY_DAYS);

        let body: Value = get_json(
            self.http
                .get(&self.url)
                .query(&[("limit", HISTORY_DAYS.to_string())]),
        )
        .await?;

        Ok(Some(body))
    }

    fn normalize(&self, raw: &Value) -> Payload {
        let mut payload = Payload::new();

        let Ok(response) = FearGreedResponse::deserialize(raw) else {
            return payload;
        };

        // Newest reading first
        let mut readings = response.data.iter().filter_map(FearGreedReading::to_json);
        let Some(current) = readings.next() else {
            return payload;
        };

        payload.insert("sentiment".to_string(), current);
        let history: Vec<Value> = readings.collect();
        if !history.is_empty() {
            payload.insert("sentiment_history".to_string(), Value::Array(history));
        }
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_current_and_history() {
        let raw = json!({
            "name": "Fear and Greed Index",
            "data": [
                {"value": "72", "value_classification": "Greed", "timestamp": "1717200000"},
                {"value": "n/a", "value_classification": "Broken", "timestamp": "1717113600"},
                {"value": "65", "value_classification": "Greed", "timestamp": "1717027200"}
            ]
        });

        let payload = FearGreedSource::new(Client::new()).normalize(&raw);
        assert_eq!(payload["sentiment"]["value"], 72);
        assert_eq!(payload["sentiment"]["classification"], "Greed");
        assert_eq!(payload["sentiment"]["date"], "2024-06-01T00:00:00+00:00");
        assert_eq!(payload["sentiment_history"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_normalize_empty_data() {
        let source = FearGreedSource::new(Client::new());
        assert!(source.normalize(&json!({"data": []})).is_empty());
        assert!(source.normalize(&json!("unexpected")).is_empty());
    }
}
