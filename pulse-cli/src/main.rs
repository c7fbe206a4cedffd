//! Pulse CLI
//!
//! Fetches one or more topics through the aggregation engine and prints the
//! merged results as JSON.
//!
//! Usage: `pulse-cli [topic ...]` (defaults to `PULSE_TOPICS`)

use anyhow::Context;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pulse_core::TopicResult;
use pulse_services::{build_default_registry, spawn_cache_cleanup, CacheStore, EngineConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,pulse_services=debug")),
        )
        .init();

    let config = EngineConfig::from_env().context("Invalid engine configuration")?;

    let args: Vec<String> = std::env::args()
        .skip(1)
        .map(|a| a.trim().to_lowercase())
        .filter(|a| !a.is_empty())
        .collect();
    let topics = if args.is_empty() { config.topics.clone() } else { args };

    info!("Starting Pulse for topics {:?}", topics);

    let cache = CacheStore::new();
    let registry = build_default_registry(&config, cache.clone());

    for topic in &topics {
        if registry.sources_for(topic).is_empty() {
            warn!("Topic {} has no registered sources", topic);
        }
    }

    let housekeeping = spawn_cache_cleanup(cache.clone(), config.cleanup_interval, config.cache_max_age);

    let results: Vec<TopicResult> = registry.fetch_all_topics(&topics).await;

    for result in &results {
        info!(
            "{}: {} sources, {} errors{}",
            result.topic,
            result.sources.len(),
            result.errors.len(),
            if result.is_empty() { " (no data)" } else { "" }
        );
    }
    for stats in registry.rate_limiter_stats() {
        debug!(
            "[RATE_LIMITER:{}] {} requests, {} exhausted checks, {} remaining",
            stats.name, stats.total_requests, stats.exhausted_checks, stats.remaining
        );
    }

    let output = serde_json::to_string_pretty(&results).context("Failed to serialize results")?;
    println!("{}", output);

    housekeeping.abort();
    cache.flush();

    Ok(())
}
