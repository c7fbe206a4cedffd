//! Generic RSS/Atom feed list
//!
//! Fetches every configured feed concurrently and extracts items with the
//! tolerant parser in [`crate::feed`]. A feed that fails to download or parse
//! is dropped; the source only fails when every feed failed.

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use futures::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use pulse_core::{
    Payload, PriorityTier, RateBudget, Source, SourceDescriptor, SourceError, SourceResult,
};

use crate::feed::{parse_feed, FeedItem};
use crate::http::get_text;
use crate::text::{generate_id, truncate_chars};

const SUMMARY_MAX_CHARS: usize = 300;

/// One configured feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSpec {
    /// Display name attached to every item from this feed
    pub name: String,
    pub url: String,
}

impl FeedSpec {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Items of one feed as cached
#[derive(Debug, Serialize, Deserialize)]
struct FeedBatch {
    feed: String,
    items: Vec<FeedItem>,
}

pub struct SyndicationSource {
    http: Client,
    pub(crate) descriptor: SourceDescriptor,
    feeds: Vec<FeedSpec>,
}

impl SyndicationSource {
    pub fn new(http: Client, feeds: Vec<FeedSpec>) -> Self {
        Self {
            http,
            descriptor: Self::default_descriptor(),
            feeds,
        }
    }

    pub fn default_descriptor() -> SourceDescriptor {
        SourceDescriptor::new(
            "syndication",
            PriorityTier::Fallback,
            Duration::from_secs(15 * 60),
            Duration::from_secs(6 * 60 * 60),
            RateBudget::per_minute(20),
        )
    }

    async fn fetch_feed(&self, feed: &FeedSpec) -> SourceResult<FeedBatch> {
        let xml = get_text(self.http.get(&feed.url)).await?;
        let parsed = parse_feed(&xml);
        if parsed.skipped > 0 {
            debug!(
                "[Syndication] {} dropped {} malformed items",
                feed.name, parsed.skipped
            );
        }
        Ok(FeedBatch {
            feed: feed.name.clone(),
            items: parsed.items,
        })
    }
}

#[async_trait]
impl Source for SyndicationSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    async fn fetch(&self, topic: &str) -> SourceResult<Option<Value>> {
        debug!("[Syndication] Fetching {} feeds for {}", self.feeds.len(), topic);

        let results = join_all(self.feeds.iter().map(|feed| self.fetch_feed(feed))).await;

        let mut batches = Vec::new();
        let mut first_error = None;
        for (feed, result) in self.feeds.iter().zip(results) {
            match result {
                Ok(batch) if !batch.items.is_empty() => batches.push(batch),
                Ok(_) => debug!("[Syndication] {} had no usable items", feed.name),
                Err(e) => {
                    warn!("[Syndication] Failed to fetch {}: {}", feed.name, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        if batches.is_empty() {
            return match first_error {
                Some(e) => Err(e),
                None => Ok(None),
            };
        }

        serde_json::to_value(&batches)
            .map(Some)
            .map_err(|e| SourceError::parse(e.to_string()))
    }

    fn normalize(&self, raw: &Value) -> Payload {
        let mut payload = Payload::new();
        let Ok(batches) = serde_json::from_value::<Vec<FeedBatch>>(raw.clone()) else {
            return payload;
        };

        let mut items: Vec<(String, FeedItem)> = batches
            .into_iter()
            .flat_map(|batch| {
                let feed = batch.feed;
                batch.items.into_iter().map(move |item| (feed.clone(), item))
            })
            .collect();

        // Newest first, undated items last; stable so feed order breaks ties
        items.sort_by_key(|(_, item)| {
            std::cmp::Reverse(
                item.published
                    .as_deref()
                    .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
                    .map(|d| d.timestamp()),
            )
        });

        let headlines: Vec<Value> = items
            .into_iter()
            .map(|(feed, item)| {
                json!({
                    "id": generate_id("feed", &item.link),
                    "title": item.title,
                    "url": item.link,
                    "summary": truncate_chars(&item.summary, SUMMARY_MAX_CHARS),
                    "source": feed,
                    "published_at": item.published,
                })
            })
            .collect();

        if !headlines.is_empty() {
            payload.insert("headlines".to_string(), Value::Array(headlines));
        }
        payload
    }
}
