//! Static metadata every source declares

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Priority tier controlling fetch ordering and fan-out behaviour
///
/// Ordering follows fetch precedence: `Primary < Secondary < Fallback`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityTier {
    /// Queried first, concurrently
    Primary,
    /// Queried concurrently only when no primary source yielded data
    Secondary,
    /// Queried one at a time, stopping at the first source with data
    Fallback,
}

impl PriorityTier {
    pub const ALL: [PriorityTier; 3] = [
        PriorityTier::Primary,
        PriorityTier::Secondary,
        PriorityTier::Fallback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityTier::Primary => "primary",
            PriorityTier::Secondary => "secondary",
            PriorityTier::Fallback => "fallback",
        }
    }
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PriorityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "primary" => Ok(PriorityTier::Primary),
            "secondary" => Ok(PriorityTier::Secondary),
            "fallback" => Ok(PriorityTier::Fallback),
            _ => Err(format!("Unknown priority tier: {}", s)),
        }
    }
}

/// Request budget for a fixed window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateBudget {
    /// Requests allowed per window
    pub max_requests: u32,
    /// Window length
    pub window: Duration,
}

impl RateBudget {
    pub const fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    /// `max_requests` per 60 seconds
    pub const fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }
}

/// Source identity, tier, cache windows and rate budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Unique source name, also the cache key prefix
    pub name: String,
    pub tier: PriorityTier,
    /// Entries younger than this are served without touching the network
    pub fresh_ttl: Duration,
    /// Entries younger than this may stand in for a failed or rate limited fetch
    pub stale_ttl: Duration,
    pub rate_budget: RateBudget,
}

impl SourceDescriptor {
    /// Create a descriptor. A `stale_ttl` shorter than `fresh_ttl` is raised
    /// to `fresh_ttl` so the stale window always contains the fresh window.
    pub fn new(
        name: impl Into<String>,
        tier: PriorityTier,
        fresh_ttl: Duration,
        stale_ttl: Duration,
        rate_budget: RateBudget,
    ) -> Self {
        Self {
            name: name.into(),
            tier,
            fresh_ttl,
            stale_ttl: stale_ttl.max(fresh_ttl),
            rate_budget,
        }
    }

    pub fn with_tier(mut self, tier: PriorityTier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
