//! Shared HTTP plumbing for source adapters

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use pulse_core::{SourceError, SourceResult};

/// Default user agent sent to every upstream
pub const DEFAULT_USER_AGENT: &str = "pulse-aggregator/0.1";

/// Build the client shared by all sources
///
/// Falls back to a default client when the builder fails so a bad TLS
/// backend never takes the whole engine down.
pub fn build_client(user_agent: &str, timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Send a request and decode a JSON body
pub async fn get_json<T: DeserializeOwned>(request: RequestBuilder) -> SourceResult<T> {
    let response = send(request).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| SourceError::parse(e.to_string()))
}

/// Send a request and return the body as text
pub async fn get_text(request: RequestBuilder) -> SourceResult<String> {
    let response = send(request).await?;
    response
        .text()
        .await
        .map_err(|e| SourceError::request_failed(e.to_string()))
}

async fn send(request: RequestBuilder) -> SourceResult<reqwest::Response> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            SourceError::request_failed(format!("timeout: {}", e))
        } else {
            SourceError::request_failed(e.to_string())
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        debug!("Upstream {} answered {}", response.url(), status);
        return Err(SourceError::http(
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown"),
        ));
    }

    Ok(response)
}
