//! Hacker News stories via the Algolia search API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use pulse_core::{Payload, PriorityTier, RateBudget, Source, SourceDescriptor, SourceResult};

use crate::http::get_json;

const HN_SEARCH_API: &str = "https://hn.algolia.com/api/v1/search_by_date";
const HN_ITEM_URL: &str = "https://news.ycombinator.com/item?id=";

/// Stories below this score are noise
const MIN_POINTS: i64 = 10;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "objectID")]
    object_id: String,
    title: Option<String>,
    url: Option<String>,
    author: Option<String>,
    points: Option<i64>,
    num_comments: Option<i64>,
    created_at: Option<String>,
}

pub struct HackerNewsSource {
    http: Client,
    pub(crate) descriptor: SourceDescriptor,
    url: String,
    hits_per_page: u32,
}

impl HackerNewsSource {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            descriptor: Self::default_descriptor(),
            url: HN_SEARCH_API.to_string(),
            hits_per_page: 30,
        }
    }

    pub fn default_descriptor() -> SourceDescriptor {
        SourceDescriptor::new(
            "hacker_news",
            PriorityTier::Secondary,
            Duration::from_secs(10 * 60),
            Duration::from_secs(2 * 60 * 60),
            RateBudget::per_minute(30),
        )
    }

    /// Search query for a topic; short topic names expand to a few keywords
    fn query_for(topic: &str) -> String {
        match topic {
            "ai" => "AI OR LLM OR GPT".to_string(),
            "crypto" => "bitcoin OR ethereum OR crypto".to_string(),
            other => other.to_string(),
        }
    }
}

#[async_trait]
impl Source for HackerNewsSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    async fn fetch(&self, topic: &str) -> SourceResult<Option<Value>> {
        let query = Self::query_for(topic);
        debug!("[HackerNews] Searching stories for {:?}", query);

        let body: Value = get_json(self.http.get(&self.url).query(&[
            ("query", query),
            ("tags", "story".to_string()),
            ("numericFilters", format!("points>{}", MIN_POINTS)),
            ("hitsPerPage", self.hits_per_page.to_string()),
        ]))
        .await?;

        Ok(Some(body))
    }

    fn normalize(&self, raw: &Value) -> Payload {
        let mut payload = Payload::new();
        let Ok(response) = SearchResponse::deserialize(raw) else {
            return payload;
        };

        let discussions: Vec<Value> = response
            .hits
            .into_iter()
            .filter_map(|hit| {
                let title = hit.title.filter(|t| !t.trim().is_empty())?;
                let comments_url = format!("{}{}", HN_ITEM_URL, hit.object_id);
                Some(json!({
                    "title": title.trim(),
                    // Ask HN and similar posts have no external link
                    "url": hit.url.unwrap_or_else(|| comments_url.clone()),
                    "comments_url": comments_url,
                    "author": hit.author,
                    "score": hit.points.unwrap_or(0),
                    "comments": hit.num_comments.unwrap_or(0),
                    "published_at": hit.created_at,
                    "source": "hacker_news",
                }))
            })
            .collect();

        if !discussions.is_empty() {
            payload.insert("discussions".to_string(), Value::Array(discussions));
        }
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_hits() {
        let raw = json!({
            "hits": [
                {"objectID": "101", "title": "Show HN: A tiny LLM", "url": "https://example.com/llm",
                 "author": "pg", "points": 120, "num_comments": 45, "created_at": "2024-06-01T12:00:00Z"},
                {"objectID": "102", "title": "Ask HN: Best AI tools?", "points": 33},
                {"objectID": "103", "title": null}
            ]
        });

        let payload = HackerNewsSource::new(Client::new()).normalize(&raw);
        let discussions = payload["discussions"].as_array().unwrap();
        assert_eq!(discussions.len(), 2);
        assert_eq!(discussions[0]["score"], 120);
        assert_eq!(discussions[1]["url"], "https://news.ycombinator.com/item?id=102");
        assert_eq!(discussions[1]["comments"], 0);
    }

    #[test]
    fn test_query_expansion() {
        assert_eq!(HackerNewsSource::query_for("rust"), "rust");
        assert!(HackerNewsSource::query_for("ai").contains("LLM"));
    }
}
