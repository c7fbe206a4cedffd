//! CryptoPanic news aggregator API
//!
//! Requires an auth token. Without one `fetch` returns `Ok(None)` so the
//! orchestrator records an empty result instead of an upstream failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use pulse_core::{Payload, PriorityTier, RateBudget, Source, SourceDescriptor, SourceResult};

use crate::http::get_json;
use crate::text::{generate_id, host_label};

const CRYPTOPANIC_API: &str = "https://cryptopanic.com/api/v1/posts/";

#[derive(Debug, Deserialize)]
struct PostsResponse {
    #[serde(default)]
    results: Vec<Post>,
}

#[derive(Debug, Deserialize)]
struct Post {
    title: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
    source: Option<PostSource>,
    #[serde(default)]
    currencies: Vec<Currency>,
    votes: Option<Votes>,
}

#[derive(Debug, Deserialize)]
struct PostSource {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Currency {
    code: String,
}

#[derive(Debug, Default, Deserialize)]
struct Votes {
    #[serde(default)]
    positive: i64,
    #[serde(default)]
    negative: i64,
}

impl Votes {
    fn sentiment(&self) -> &'static str {
        match self.positive.cmp(&self.negative) {
            std::cmp::Ordering::Greater => "bullish",
            std::cmp::Ordering::Less => "bearish",
            std::cmp::Ordering::Equal => "neutral",
        }
    }
}

pub struct CryptoPanicSource {
    http: Client,
    pub(crate) descriptor: SourceDescriptor,
    url: String,
    api_key: Option<String>,
}

impl CryptoPanicSource {
    pub fn new(http: Client, api_key: Option<String>) -> Self {
        Self {
            http,
            descriptor: Self::default_descriptor(),
            url: CRYPTOPANIC_API.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    pub fn default_descriptor() -> SourceDescriptor {
        SourceDescriptor::new(
            "cryptopanic",
            PriorityTier::Secondary,
            Duration::from_secs(15 * 60),
            Duration::from_secs(6 * 60 * 60),
            RateBudget::per_minute(5),
        )
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl Source for CryptoPanicSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    async fn fetch(&self, topic: &str) -> SourceResult<Option<Value>> {
        let Some(api_key) = &self.api_key else {
            info!("[CryptoPanic] No API key configured, skipping fetch for {}", topic);
            return Ok(None);
        };

        debug!("[CryptoPanic] Fetching public posts for {}", topic);
        let body: Value = get_json(self.http.get(&self.url).query(&[
            ("auth_token", api_key.as_str()),
            ("public", "true"),
            ("kind", "news"),
        ]))
        .await?;

        Ok(Some(body))
    }

    fn normalize(&self, raw: &Value) -> Payload {
        let mut payload = Payload::new();
        let Ok(response) = PostsResponse::deserialize(raw) else {
            return payload;
        };

        let headlines: Vec<Value> = response
            .results
            .into_iter()
            .filter_map(|post| {
                let title = post.title?.trim().to_string();
                let url = post.url?;
                if title.is_empty() {
                    return None;
                }
                let source = post
                    .source
                    .and_then(|s| s.title)
                    .or_else(|| host_label(&url))
                    .unwrap_or_else(|| "cryptopanic".to_string());
                let votes = post.votes.unwrap_or_default();

                Some(json!({
                    "id": generate_id("cp", &url),
                    "title": title,
                    "url": url,
                    "source": source,
                    "published_at": post.published_at,
                    "currencies": post.currencies.into_iter().map(|c| c.code).collect::<Vec<_>>(),
                    "sentiment": votes.sentiment(),
                }))
            })
            .collect();

        if !headlines.is_empty() {
            payload.insert("headlines".to_string(), Value::Array(headlines));
        }
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_short_circuits() {
        let source = CryptoPanicSource::new(Client::new(), Some("  ".to_string()));
        assert!(!source.has_credentials());
        assert_eq!(source.fetch("crypto").await, Ok(None));
    }

    #[test]
    fn test_normalize_posts() {
        let raw = json!({
            "count": 3,
            "results": [
                {
                    "title": "Bitcoin ETF inflows hit record",
                    "url": "https://www.coindesk.com/markets/etf",
                    "published_at": "2024-06-01T10:00:00Z",
                    "source": {"title": "CoinDesk", "domain": "coindesk.com"},
                    "currencies": [{"code": "BTC", "title": "Bitcoin"}],
                    "votes": {"positive": 10, "negative": 2}
                },
                {
                    "title": "Untitled without source",
                    "url": "https://www.theblock.co/post/1"
                },
                {"title": "", "url": "https://example.com/empty"}
            ]
        });

        let payload = CryptoPanicSource::new(Client::new(), None).normalize(&raw);
        let headlines = payload["headlines"].as_array().unwrap();
        assert_eq!(headlines.len(), 2);
        assert_eq!(headlines[0]["source"], "CoinDesk");
        assert_eq!(headlines[0]["currencies"][0], "BTC");
        assert_eq!(headlines[0]["sentiment"], "bullish");
        assert_eq!(headlines[1]["source"], "theblock");
        assert_eq!(headlines[1]["sentiment"], "neutral");
        assert!(headlines[0]["id"].as_str().unwrap().starts_with("cp_"));
    }
}
