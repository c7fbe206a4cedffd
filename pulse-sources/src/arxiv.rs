//! Recent papers from the arXiv export API (Atom)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use pulse_core::{
    Payload, PriorityTier, RateBudget, Source, SourceDescriptor, SourceError, SourceResult,
};

use crate::feed::{parse_feed, FeedItem};
use crate::http::get_text;
use crate::text::truncate_chars;

const ARXIV_API: &str = "https://export.arxiv.org/api/query";
const SUMMARY_MAX_CHARS: usize = 500;

pub struct ArxivSource {
    http: Client,
    pub(crate) descriptor: SourceDescriptor,
    url: String,
    categories: Vec<String>,
    max_results: u32,
}

impl ArxivSource {
    pub fn new(http: Client, categories: &[&str]) -> Self {
        Self {
            http,
            descriptor: Self::default_descriptor(),
            url: ARXIV_API.to_string(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            max_results: 25,
        }
    }

    pub fn default_descriptor() -> SourceDescriptor {
        SourceDescriptor::new(
            "arxiv",
            PriorityTier::Secondary,
            Duration::from_secs(6 * 60 * 60),
            Duration::from_secs(48 * 60 * 60),
            RateBudget::per_minute(3),
        )
    }

    fn search_query(&self) -> String {
        self.categories
            .iter()
            .map(|c| format!("cat:{}", c))
            .collect::<Vec<_>>()
            .join(" OR ")
    }
}

/// "https://arxiv.org/abs/2401.01234v2" -> "2401.01234v2"
fn arxiv_id(link: &str) -> Option<&str> {
    link.rsplit_once("/abs/").map(|(_, id)| id).filter(|id| !id.is_empty())
}

#[async_trait]
impl Source for ArxivSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    async fn fetch(&self, topic: &str) -> SourceResult<Option<Value>> {
        let query = self.search_query();
        debug!("[arXiv] Querying {:?} for {}", query, topic);

        let xml = get_text(self.http.get(&self.url).query(&[
            ("search_query", query),
            ("sortBy", "submittedDate".to_string()),
            ("sortOrder", "descending".to_string()),
            ("max_results", self.max_results.to_string()),
        ]))
        .await?;

        let feed = parse_feed(&xml);
        if feed.skipped > 0 {
            debug!("[arXiv] Skipped {} malformed entries", feed.skipped);
        }

        // Cache parsed entries rather than the raw document
        let items = serde_json::to_value(&feed.items).map_err(|e| SourceError::parse(e.to_string()))?;
        Ok(Some(items))
    }

    fn normalize(&self, raw: &Value) -> Payload {
        let mut payload = Payload::new();
        let Ok(items) = serde_json::from_value::<Vec<FeedItem>>(raw.clone()) else {
            return payload;
        };

        let papers: Vec<Value> = items
            .into_iter()
            .map(|item| {
                json!({
                    "id": arxiv_id(&item.link),
                    "title": item.title,
                    "url": item.link,
                    "summary": truncate_chars(&item.summary, SUMMARY_MAX_CHARS),
                    "authors": item.authors,
                    "categories": item.categories,
                    "published_at": item.published,
                })
            })
            .collect();

        if !papers.is_empty() {
            payload.insert("papers".to_string(), Value::Array(papers));
        }
        payload
    }
}
