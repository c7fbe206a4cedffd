//! Trending GitHub repositories
//!
//! GitHub has no official trending endpoint, so trending is approximated
//! with the search API: repositories created in the last week, sorted by
//! stars.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use pulse_core::{Payload, PriorityTier, RateBudget, Source, SourceDescriptor, SourceResult};

use crate::http::get_json;

const GITHUB_SEARCH_API: &str = "https://api.github.com/search/repositories";
const LOOKBACK_DAYS: i64 = 7;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Repository>,
}

#[derive(Debug, Deserialize)]
struct Repository {
    full_name: String,
    html_url: String,
    description: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    language: Option<String>,
    created_at: Option<String>,
    #[serde(default)]
    topics: Vec<String>,
}

pub struct GitHubTrendingSource {
    http: Client,
    pub(crate) descriptor: SourceDescriptor,
    url: String,
    token: Option<String>,
    per_page: u32,
}

impl GitHubTrendingSource {
    pub fn new(http: Client, token: Option<String>) -> Self {
        Self {
            http,
            descriptor: Self::default_descriptor(),
            url: GITHUB_SEARCH_API.to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
            per_page: 30,
        }
    }

    pub fn default_descriptor() -> SourceDescriptor {
        SourceDescriptor::new(
            "github_trending",
            PriorityTier::Primary,
            Duration::from_secs(60 * 60),
            Duration::from_secs(12 * 60 * 60),
            RateBudget::per_minute(10),
        )
    }

    /// Search qualifier for a topic
    fn search_query(topic: &str) -> String {
        let since = (Utc::now() - chrono::Duration::days(LOOKBACK_DAYS)).format("%Y-%m-%d");
        let subject = match topic {
            "ai" => "topic:machine-learning".to_string(),
            "crypto" => "topic:blockchain".to_string(),
            "tech" => String::new(),
            other => other.to_string(),
        };
        format!("{} created:>{}", subject, since).trim().to_string()
    }
}

#[async_trait]
impl Source for GitHubTrendingSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    async fn fetch(&self, topic: &str) -> SourceResult<Option<Value>> {
        let query = Self::search_query(topic);
        debug!(
            "[GitHub] Searching {:?} (authenticated: {})",
            query,
            self.token.is_some()
        );

        let mut request = self
            .http
            .get(&self.url)
            .header("Accept", "application/vnd.github+json")
            .query(&[
                ("q", query),
                ("sort", "stars".to_string()),
                ("order", "desc".to_string()),
                ("per_page", self.per_page.to_string()),
            ]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let body: Value = get_json(request).await?;
        Ok(Some(body))
    }

    fn normalize(&self, raw: &Value) -> Payload {
        let mut payload = Payload::new();
        let Ok(response) = SearchResponse::deserialize(raw) else {
            return payload;
        };

        let repositories: Vec<Value> = response
            .items
            .into_iter()
            .map(|repo| {
                json!({
                    "full_name": repo.full_name,
                    "url": repo.html_url,
                    "description": repo.description.unwrap_or_default(),
                    "stars": repo.stargazers_count,
                    "forks": repo.forks_count,
                    "language": repo.language,
                    "topics": repo.topics,
                    "created_at": repo.created_at,
                })
            })
            .collect();

        if !repositories.is_empty() {
            payload.insert("repositories".to_string(), Value::Array(repositories));
        }
        payload
    }
}
