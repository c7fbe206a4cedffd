//! Upstream source adapters for the Pulse aggregation engine
//!
//! Each adapter implements [`pulse_core::Source`] for one family of upstream
//! services:
//! - Market data: CoinGecko prices and the Fear & Greed sentiment index
//! - News: CryptoPanic (credential required) and generic RSS/Atom feeds
//! - Forums: Hacker News and Reddit
//! - Trending lists: GitHub repositories and Hugging Face models
//! - Research: arXiv category feeds

pub mod arxiv;
pub mod coingecko;
pub mod cryptopanic;
pub mod fear_greed;
pub mod feed;
pub mod github;
pub mod hacker_news;
pub mod http;
pub mod huggingface;
pub mod reddit;
pub mod syndication;
pub mod text;
pub mod variant;

pub use arxiv::ArxivSource;
pub use coingecko::CoinGeckoSource;
pub use cryptopanic::CryptoPanicSource;
pub use fear_greed::FearGreedSource;
pub use feed::{parse_feed, FeedItem, ParsedFeed};
pub use github::GitHubTrendingSource;
pub use hacker_news::HackerNewsSource;
pub use http::build_client;
pub use huggingface::HuggingFaceSource;
pub use reddit::RedditSource;
pub use syndication::{FeedSpec, SyndicationSource};
pub use variant::{SourceKind, SourceVariant};
