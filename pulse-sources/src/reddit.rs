//! Reddit hot listings across a set of subreddits

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use pulse_core::{Payload, PriorityTier, RateBudget, Source, SourceDescriptor, SourceResult};

use crate::http::get_json;

const REDDIT_BASE: &str = "https://www.reddit.com";

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    title: String,
    permalink: String,
    url: Option<String>,
    subreddit: Option<String>,
    author: Option<String>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    num_comments: i64,
    created_utc: Option<f64>,
    #[serde(default)]
    stickied: bool,
}

pub struct RedditSource {
    http: Client,
    pub(crate) descriptor: SourceDescriptor,
    base_url: String,
    subreddits: Vec<String>,
    limit: u32,
}

impl RedditSource {
    pub fn new(http: Client, subreddits: &[&str]) -> Self {
        Self {
            http,
            descriptor: Self::default_descriptor(),
            base_url: REDDIT_BASE.to_string(),
            subreddits: subreddits.iter().map(|s| s.to_string()).collect(),
            limit: 25,
        }
    }

    pub fn default_descriptor() -> SourceDescriptor {
        SourceDescriptor::new(
            "reddit",
            PriorityTier::Secondary,
            Duration::from_secs(10 * 60),
            Duration::from_secs(2 * 60 * 60),
            RateBudget::per_minute(10),
        )
    }

    async fn fetch_subreddit(&self, subreddit: &str) -> SourceResult<Value> {
        let url = format!("{}/r/{}/hot.json", self.base_url, subreddit);
        get_json(
            self.http
                .get(url)
                .query(&[("limit", self.limit.to_string()), ("raw_json", "1".to_string())]),
        )
        .await
    }
}

#[async_trait]
impl Source for RedditSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    async fn fetch(&self, topic: &str) -> SourceResult<Option<Value>> {
        debug!("[Reddit] Fetching {:?} for {}", self.subreddits, topic);

        let results = join_all(self.subreddits.iter().map(|s| self.fetch_subreddit(s))).await;

        let mut listings = Map::new();
        let mut first_error = None;
        for (subreddit, result) in self.subreddits.iter().zip(results) {
            match result {
                Ok(listing) => {
                    listings.insert(subreddit.clone(), listing);
                }
                Err(e) => {
                    warn!("[Reddit] r/{} failed: {}", subreddit, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match (listings.is_empty(), first_error) {
            (true, Some(e)) => Err(e),
            (true, None) => Ok(None),
            _ => Ok(Some(Value::Object(listings))),
        }
    }

    fn normalize(&self, raw: &Value) -> Payload {
        let mut payload = Payload::new();
        let Some(listings) = raw.as_object() else {
            return payload;
        };

        let mut posts: Vec<Post> = listings
            .values()
            .filter_map(|listing| Listing::deserialize(listing).ok())
            .flat_map(|listing| listing.data.children)
            .map(|child| child.data)
            .filter(|post| !post.stickied && !post.title.trim().is_empty())
            .collect();
        posts.sort_by(|a, b| b.score.cmp(&a.score));

        let discussions: Vec<Value> = posts
            .into_iter()
            .map(|post| {
                let comments_url = format!("{}{}", self.base_url, post.permalink);
                json!({
                    "title": post.title.trim(),
                    "url": post.url.unwrap_or_else(|| comments_url.clone()),
                    "comments_url": comments_url,
                    "author": post.author,
                    "score": post.score,
                    "comments": post.num_comments,
                    "published_at": post.created_utc
                        .and_then(|secs| chrono::DateTime::from_timestamp(secs as i64, 0))
                        .map(|dt| dt.to_rfc3339()),
                    "source": post.subreddit.map(|s| format!("r/{}", s)),
                })
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

    fn listing(posts: Value) -> Value {
        json!({"kind": "Listing", "data": {"children": posts}})
    }

    #[test]
    fn test_normalize_merges_and_sorts_by_score() {
        let raw = json!({
            "MachineLearning": listing(json!([
                {"kind": "t3", "data": {"title": "Weekly thread", "permalink": "/r/MachineLearning/1", "stickied": true, "score": 999}},
                {"kind": "t3", "data": {"title": "New paper", "permalink": "/r/MachineLearning/2", "url": "https://arxiv.org/abs/1",
                 "subreddit": "MachineLearning", "score": 40, "num_comments": 3, "created_utc": 1717200000.0}}
            ])),
            "LocalLLaMA": listing(json!([
                {"kind": "t3", "data": {"title": "Llama release", "permalink": "/r/LocalLLaMA/3", "subreddit": "LocalLLaMA", "score": 300}}
            ])),
            "broken": {"error": 404}
        });

        let source = RedditSource::new(Client::new(), &["MachineLearning", "LocalLLaMA"]);
        let payload = source.normalize(&raw);
        let discussions = payload["discussions"].as_array().unwrap();
        assert_eq!(discussions.len(), 2);
        assert_eq!(discussions[0]["title"], "Llama release");
        assert_eq!(discussions[0]["url"], "https://www.reddit.com/r/LocalLLaMA/3");
        assert_eq!(discussions[1]["source"], "r/MachineLearning");
        assert_eq!(discussions[1]["published_at"], "2024-06-01T00:00:00+00:00");
    }
}
