//! Trending models on the Hugging Face hub

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use pulse_core::{Payload, PriorityTier, RateBudget, Source, SourceDescriptor, SourceResult};

use crate::http::get_json;

const HF_BASE: &str = "https://huggingface.co";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Model {
    id: String,
    #[serde(default)]
    likes: u64,
    #[serde(default)]
    downloads: u64,
    #[serde(rename = "pipeline_tag")]
    pipeline_tag: Option<String>,
    trending_score: Option<f64>,
    created_at: Option<String>,
}

pub struct HuggingFaceSource {
    http: Client,
    pub(crate) descriptor: SourceDescriptor,
    base_url: String,
    limit: u32,
}

impl HuggingFaceSource {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            descriptor: Self::default_descriptor(),
            base_url: HF_BASE.to_string(),
            limit: 30,
        }
    }

    pub fn default_descriptor() -> SourceDescriptor {
        SourceDescriptor::new(
            "huggingface",
            PriorityTier::Primary,
            Duration::from_secs(60 * 60),
            Duration::from_secs(12 * 60 * 60),
            RateBudget::per_minute(30),
        )
    }
}

#[async_trait]
impl Source for HuggingFaceSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    async fn fetch(&self, _topic: &str) -> SourceResult<Option<Value>> {
        debug!("[HuggingFace] Fetching {} trending models", self.limit);

        // Upstream answers with a bare JSON array
        let body: Value = get_json(
            self.http
                .get(format!("{}/api/models", self.base_url))
                .query(&[("sort", "trendingScore".to_string()), ("limit", self.limit.to_string())]),
        )
        .await?;

        Ok(Some(body))
    }

    fn normalize(&self, raw: &Value) -> Payload {
        let mut payload = Payload::new();
        let Some(models) = raw.as_array() else {
            return payload;
        };

        let models: Vec<Value> = models
            .iter()
            .filter_map(|m| Model::deserialize(m).ok())
            .map(|model| {
                json!({
                    "url": format!("{}/{}", self.base_url, model.id),
                    "id": model.id,
                    "task": model.pipeline_tag,
                    "likes": model.likes,
                    "downloads": model.downloads,
                    "trending_score": model.trending_score,
                    "created_at": model.created_at,
                })
            })
            .collect();

        if !models.is_empty() {
            payload.insert("models".to_string(), Value::Array(models));
        }
        payload
    }
}
