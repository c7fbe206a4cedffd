//! Built-in topics and the sources that serve them

use std::sync::Arc;

use tracing::info;

use pulse_core::Source;
use pulse_sources::{
    build_client, ArxivSource, CoinGeckoSource, CryptoPanicSource, FearGreedSource, FeedSpec,
    GitHubTrendingSource, HackerNewsSource, HuggingFaceSource, RedditSource, SourceVariant,
    SyndicationSource,
};

use crate::cache_store::CacheStore;
use crate::config::EngineConfig;
use crate::registry::SourceRegistry;

pub const DEFAULT_TOPICS: &[&str] = &["crypto", "ai", "tech"];

fn shared(source: impl Into<SourceVariant>) -> Arc<dyn Source> {
    Arc::new(source.into())
}

fn feeds(list: &[(&str, &str)]) -> Vec<FeedSpec> {
    list.iter().map(|(name, url)| FeedSpec::new(*name, *url)).collect()
}

/// Registry with every built-in topic wired to its sources
pub fn build_default_registry(config: &EngineConfig, cache: CacheStore) -> SourceRegistry {
    let http = build_client(&config.user_agent, config.fetch_timeout);
    let mut registry = SourceRegistry::new(cache, config.fetch_timeout);

    info!(
        "Building source catalog (github token: {}, cryptopanic key: {}, coingecko key: {})",
        config.github_token.is_some(),
        config.cryptopanic_api_key.is_some(),
        config.coingecko_api_key.is_some()
    );

    // One instance per upstream shared across topics so they share a budget
    let github = shared(GitHubTrendingSource::new(http.clone(), config.github_token.clone()));
    let hacker_news = shared(HackerNewsSource::new(http.clone()));

    // crypto
    registry.register_source(
        "crypto",
        shared(CoinGeckoSource::new(http.clone(), &[], config.coingecko_api_key.clone())),
    );
    registry.register_source("crypto", shared(FearGreedSource::new(http.clone())));
    registry.register_source(
        "crypto",
        shared(CryptoPanicSource::new(http.clone(), config.cryptopanic_api_key.clone())),
    );
    registry.register_source(
        "crypto",
        shared(
            SourceVariant::from(RedditSource::new(
                http.clone(),
                &["CryptoCurrency", "Bitcoin", "ethereum"],
            ))
            .with_name("reddit_crypto"),
        ),
    );
    registry.register_source(
        "crypto",
        shared(
            SourceVariant::from(SyndicationSource::new(
                http.clone(),
                feeds(&[
                    ("CoinDesk", "https://www.coindesk.com/arc/outboundfeeds/rss/"),
                    ("Cointelegraph", "https://cointelegraph.com/rss"),
                    ("Decrypt", "https://decrypt.co/feed"),
                ]),
            ))
            .with_name("crypto_feeds"),
        ),
    );

    // ai
    registry.register_source("ai", shared(HuggingFaceSource::new(http.clone())));
    registry.register_source("ai", github.clone());
    registry.register_source(
        "ai",
        shared(ArxivSource::new(http.clone(), &["cs.AI", "cs.LG", "cs.CL"])),
    );
    registry.register_source("ai", hacker_news.clone());
    registry.register_source(
        "ai",
        shared(
            SourceVariant::from(RedditSource::new(
                http.clone(),
                &["MachineLearning", "LocalLLaMA", "artificial"],
            ))
            .with_name("reddit_ai"),
        ),
    );
    registry.register_source(
        "ai",
        shared(
            SourceVariant::from(SyndicationSource::new(
                http.clone(),
                feeds(&[
                    ("Hugging Face Blog", "https://huggingface.co/blog/feed.xml"),
                    (
                        "MIT Technology Review",
                        "https://www.technologyreview.com/topic/artificial-intelligence/feed",
                    ),
                ]),
            ))
            .with_name("ai_feeds"),
        ),
    );

    // tech
    registry.register_source("tech", github);
    registry.register_source("tech", hacker_news);
    registry.register_source(
        "tech",
        shared(
            SourceVariant::from(RedditSource::new(
                http.clone(),
                &["programming", "technology", "rust"],
            ))
            .with_name("reddit_tech"),
        ),
    );
    registry.register_source(
        "tech",
        shared(
            SourceVariant::from(SyndicationSource::new(
                http,
                feeds(&[
                    ("TechCrunch", "https://techcrunch.com/feed/"),
                    ("The Verge", "https://www.theverge.com/rss/index.xml"),
                    ("Ars Technica", "https://feeds.arstechnica.com/arstechnica/index"),
                ]),
            ))
            .with_name("tech_feeds"),
        ),
    );

    registry
}
