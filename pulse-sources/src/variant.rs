//! Closed set of source variants behind the shared [`Source`] interface

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use pulse_core::{Payload, PriorityTier, Source, SourceDescriptor, SourceResult};

use crate::{
    ArxivSource, CoinGeckoSource, CryptoPanicSource, FearGreedSource, GitHubTrendingSource,
    HackerNewsSource, HuggingFaceSource, RedditSource, SyndicationSource,
};

/// Kind of upstream a variant talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    CoinGecko,
    FearGreed,
    CryptoPanic,
    HackerNews,
    Reddit,
    GitHubTrending,
    HuggingFace,
    Arxiv,
    Syndication,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::CoinGecko => "coingecko",
            SourceKind::FearGreed => "fear_greed",
            SourceKind::CryptoPanic => "cryptopanic",
            SourceKind::HackerNews => "hacker_news",
            SourceKind::Reddit => "reddit",
            SourceKind::GitHubTrending => "github_trending",
            SourceKind::HuggingFace => "huggingface",
            SourceKind::Arxiv => "arxiv",
            SourceKind::Syndication => "syndication",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "coingecko" => Ok(SourceKind::CoinGecko),
            "fear_greed" | "feargreed" => Ok(SourceKind::FearGreed),
            "cryptopanic" => Ok(SourceKind::CryptoPanic),
            "hacker_news" | "hackernews" | "hn" => Ok(SourceKind::HackerNews),
            "reddit" => Ok(SourceKind::Reddit),
            "github_trending" | "github" => Ok(SourceKind::GitHubTrending),
            "huggingface" | "hf" => Ok(SourceKind::HuggingFace),
            "arxiv" => Ok(SourceKind::Arxiv),
            "syndication" | "rss" => Ok(SourceKind::Syndication),
            _ => Err(format!("Unknown source kind: {}", s)),
        }
    }
}

/// One configured source of any kind
pub enum SourceVariant {
    CoinGecko(CoinGeckoSource),
    FearGreed(FearGreedSource),
    CryptoPanic(CryptoPanicSource),
    HackerNews(HackerNewsSource),
    Reddit(RedditSource),
    GitHubTrending(GitHubTrendingSource),
    HuggingFace(HuggingFaceSource),
    Arxiv(ArxivSource),
    Syndication(SyndicationSource),
}

macro_rules! dispatch {
    ($self:expr, $inner:ident => $body:expr) => {
        match $self {
            SourceVariant::CoinGecko($inner) => $body,
            SourceVariant::FearGreed($inner) => $body,
            SourceVariant::CryptoPanic($inner) => $body,
            SourceVariant::HackerNews($inner) => $body,
            SourceVariant::Reddit($inner) => $body,
            SourceVariant::GitHubTrending($inner) => $body,
            SourceVariant::HuggingFace($inner) => $body,
            SourceVariant::Arxiv($inner) => $body,
            SourceVariant::Syndication($inner) => $body,
        }
    };
}

impl SourceVariant {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceVariant::CoinGecko(_) => SourceKind::CoinGecko,
            SourceVariant::FearGreed(_) => SourceKind::FearGreed,
            SourceVariant::CryptoPanic(_) => SourceKind::CryptoPanic,
            SourceVariant::HackerNews(_) => SourceKind::HackerNews,
            SourceVariant::Reddit(_) => SourceKind::Reddit,
            SourceVariant::GitHubTrending(_) => SourceKind::GitHubTrending,
            SourceVariant::HuggingFace(_) => SourceKind::HuggingFace,
            SourceVariant::Arxiv(_) => SourceKind::Arxiv,
            SourceVariant::Syndication(_) => SourceKind::Syndication,
        }
    }

    fn descriptor_mut(&mut self) -> &mut SourceDescriptor {
        dispatch!(self, s => &mut s.descriptor)
    }

    /// Override the default tier, e.g. to use a secondary source as primary for one topic
    pub fn with_tier(mut self, tier: PriorityTier) -> Self {
        self.descriptor_mut().tier = tier;
        self
    }

    /// Override the name, needed when two instances of one kind serve different topics
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.descriptor_mut().name = name.into();
        self
    }
}

#[async_trait]
impl Source for SourceVariant {
    fn descriptor(&self) -> &SourceDescriptor {
        dispatch!(self, s => s.descriptor())
    }

    async fn fetch(&self, topic: &str) -> SourceResult<Option<Value>> {
        dispatch!(self, s => s.fetch(topic).await)
    }

    fn normalize(&self, raw: &Value) -> Payload {
        dispatch!(self, s => s.normalize(raw))
    }
}

macro_rules! impl_from {
    ($($source:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for SourceVariant {
                fn from(source: $source) -> Self {
                    SourceVariant::$variant(source)
                }
            }
        )*
    };
}

impl_from!(
    CoinGeckoSource => CoinGecko,
    FearGreedSource => FearGreed,
    CryptoPanicSource => CryptoPanic,
    HackerNewsSource => HackerNews,
    RedditSource => Reddit,
    GitHubTrendingSource => GitHubTrending,
    HuggingFaceSource => HuggingFace,
    ArxivSource => Arxiv,
    SyndicationSource => Syndication,
);
