//! Engine configuration from environment variables

use std::env;
use std::time::Duration;

use thiserror::Error;

use pulse_sources::http::DEFAULT_USER_AGENT;

use crate::catalog::DEFAULT_TOPICS;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value:?} ({error})")]
    InvalidNumber {
        field: String,
        value: String,
        error: String,
    },

    #[error("{0} must list at least one topic")]
    EmptyTopicList(String),

    #[error("{0} must be at least one second")]
    ZeroDuration(String),
}

/// Runtime settings for the engine and its sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub topics: Vec<String>,
    /// Enforced around every upstream `fetch()`
    pub fetch_timeout: Duration,
    pub cleanup_interval: Duration,
    pub cache_max_age: Duration,
    pub user_agent: String,
    pub github_token: Option<String>,
    pub cryptopanic_api_key: Option<String>,
    pub coingecko_api_key: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            topics: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
            fetch_timeout: Duration::from_secs(20),
            cleanup_interval: Duration::from_secs(15 * 60),
            cache_max_age: Duration::from_secs(24 * 60 * 60),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            github_token: None,
            cryptopanic_api_key: None,
            coingecko_api_key: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    ///
    /// Reads:
    /// - PULSE_TOPICS: comma separated topic list
    /// - PULSE_FETCH_TIMEOUT_SECS, PULSE_CLEANUP_INTERVAL_SECS, PULSE_CACHE_MAX_AGE_SECS
    /// - PULSE_USER_AGENT
    /// - GITHUB_TOKEN, CRYPTOPANIC_API_KEY, COINGECKO_API_KEY (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let topics = match get("PULSE_TOPICS") {
            Some(raw) => {
                let topics: Vec<String> = raw
                    .split(',')
                    .map(|t| t.trim().to_lowercase())
                    .filter(|t| !t.is_empty())
                    .collect();
                if topics.is_empty() {
                    return Err(ConfigError::EmptyTopicList("PULSE_TOPICS".to_string()));
                }
                topics
            }
            None => defaults.topics,
        };

        let secs = |key: &str, default: Duration| -> Result<Duration, ConfigError> {
            match get(key) {
                Some(value) => value
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| ConfigError::InvalidNumber {
                        field: key.to_string(),
                        value,
                        error: e.to_string(),
                    }),
                None => Ok(default),
            }
        };

        // A zero timeout fails every fetch and a zero period cannot drive a ticker
        let nonzero_secs = |key: &str, default: Duration| -> Result<Duration, ConfigError> {
            let value = secs(key, default)?;
            if value.is_zero() {
                return Err(ConfigError::ZeroDuration(key.to_string()));
            }
            Ok(value)
        };

        Ok(Self {
            topics,
            fetch_timeout: nonzero_secs("PULSE_FETCH_TIMEOUT_SECS", defaults.fetch_timeout)?,
            cleanup_interval: nonzero_secs("PULSE_CLEANUP_INTERVAL_SECS", defaults.cleanup_interval)?,
            cache_max_age: secs("PULSE_CACHE_MAX_AGE_SECS", defaults.cache_max_age)?,
            user_agent: get("PULSE_USER_AGENT").unwrap_or(defaults.user_agent),
            github_token: get("GITHUB_TOKEN"),
            cryptopanic_api_key: get("CRYPTOPANIC_API_KEY"),
            coingecko_api_key: get("COINGECKO_API_KEY"),
        })
    }
}
