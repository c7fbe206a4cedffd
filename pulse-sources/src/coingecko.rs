//! CoinGecko market data source
//!
//! Combines three endpoints fetched concurrently: spot prices for a fixed
//! coin list, global market stats, and the trending search list. Free tier,
//! an optional demo key raises the upstream limit.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use pulse_core::{
    is_empty_payload, Payload, PriorityTier, RateBudget, Source, SourceDescriptor, SourceResult,
};

use crate::http::get_json;

const COINGECKO_API_BASE: &str = "https://api.coingecko.com/api/v3";

/// Coins priced when none are configured
pub const DEFAULT_COINS: &[&str] = &["bitcoin", "ethereum", "solana"];

/// CoinGecko price, global stats and trending source
pub struct CoinGeckoSource {
    http: Client,
    pub(crate) descriptor: SourceDescriptor,
    base_url: String,
    coins: Vec<String>,
    api_key: Option<String>,
}

impl CoinGeckoSource {
    pub fn new(http: Client, coins: &[&str], api_key: Option<String>) -> Self {
        let coins = if coins.is_empty() { DEFAULT_COINS } else { coins };
        Self {
            http,
            descriptor: Self::default_descriptor(),
            base_url: COINGECKO_API_BASE.to_string(),
            coins: coins.iter().map(|c| c.to_string()).collect(),
            api_key,
        }
    }

    pub fn default_descriptor() -> SourceDescriptor {
        SourceDescriptor::new(
            "coingecko",
            PriorityTier::Primary,
            Duration::from_secs(5 * 60),
            Duration::from_secs(60 * 60),
            RateBudget::per_minute(10),
        )
    }

    fn request(&self, path: &str) -> RequestBuilder {
        let request = self.http.get(format!("{}{}", self.base_url, path));
        match &self.api_key {
            Some(key) => request.header("x-cg-demo-api-key", key),
            None => request,
        }
    }

    async fn fetch_prices(&self) -> SourceResult<Value> {
        let path = format!(
            "/simple/price?ids={}&vs_currencies=usd&include_24hr_change=true&include_market_cap=true",
            urlencoding::encode(&self.coins.join(","))
        );
        get_json(self.request(&path)).await
    }

    async fn fetch_global(&self) -> SourceResult<Value> {
        let mut body: Value = get_json(self.request("/global")).await?;
        Ok(body.get_mut("data").map(Value::take).unwrap_or(Value::Null))
    }

    async fn fetch_trending(&self) -> SourceResult<Value> {
        let mut body: Value = get_json(self.request("/search/trending")).await?;
        Ok(body.get_mut("coins").map(Value::take).unwrap_or(Value::Null))
    }

    fn normalize_prices(&self, prices: &Value) -> Vec<Value> {
        let Some(prices) = prices.as_object() else {
            return Vec::new();
        };

        // Configured coins first, in configured order, then anything else upstream sent
        let mut ordered: Vec<&String> = self.coins.iter().filter(|c| prices.contains_key(*c)).collect();
        ordered.extend(prices.keys().filter(|k| !self.coins.contains(k)));

        ordered
            .into_iter()
            .filter_map(|coin| {
                let quote = prices.get(coin)?;
                Some(json!({
                    "name": coin,
                    "price_usd": quote.get("usd").cloned().unwrap_or(Value::Null),
                    "change_24h_pct": quote.get("usd_24h_change").cloned().unwrap_or(Value::Null),
                    "market_cap_usd": quote.get("usd_market_cap").cloned().unwrap_or(Value::Null),
                }))
            })
            .collect()
    }
}

#[async_trait]
impl Source for CoinGeckoSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    async fn fetch(&self, topic: &str) -> SourceResult<Option<Value>> {
        debug!("[CoinGecko] Fetching prices for {:?} (topic {})", self.coins, topic);

        let (prices, global, trending) = futures::join!(
            self.fetch_prices(),
            self.fetch_global(),
            self.fetch_trending()
        );

        let mut combined = Map::new();
        let mut first_error = None;

        for (field, result) in [("prices", prices), ("global", global), ("trending", trending)] {
            match result {
                Ok(value) if !is_empty_payload(&value) => {
                    combined.insert(field.to_string(), value);
                }
                Ok(_) => debug!("[CoinGecko] Empty {} response", field),
                Err(e) => {
                    warn!("[CoinGecko] Failed to fetch {}: {}", field, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        if combined.is_empty() {
            return match first_error {
                Some(e) => Err(e),
                None => Ok(None),
            };
        }

        info!("[CoinGecko] Fetched {} of 3 market endpoints", combined.len());
        Ok(Some(Value::Object(combined)))
    }

    fn normalize(&self, raw: &Value) -> Payload {
        let mut payload = Payload::new();

        if let Some(prices) = raw.get("prices") {
            let prices = self.normalize_prices(prices);
            if !prices.is_empty() {
                payload.insert("prices".to_string(), Value::Array(prices));
            }
        }

        if let Some(global) = raw.get("global").filter(|g| g.is_object()) {
            payload.insert(
                "market".to_string(),
                json!({
                    "total_market_cap_usd": global.pointer("/total_market_cap/usd").cloned().unwrap_or(Value::Null),
                    "btc_dominance_pct": global.pointer("/market_cap_percentage/btc").cloned().unwrap_or(Value::Null),
                    "eth_dominance_pct": global.pointer("/market_cap_percentage/eth").cloned().unwrap_or(Value::Null),
                    "market_cap_change_24h_pct": global.get("market_cap_change_percentage_24h_usd").cloned().unwrap_or(Value::Null),
                    "active_cryptocurrencies": global.get("active_cryptocurrencies").cloned().unwrap_or(Value::Null),
                }),
            );
        }

        if let Some(coins) = raw.get("trending").and_then(Value::as_array) {
            let trending: Vec<Value> = coins
                .iter()
                .filter_map(|coin| {
                    let item = coin.get("item")?;
                    Some(json!({
                        "name": item.get("name")?.as_str()?,
                        "symbol": item.get("symbol").cloned().unwrap_or(Value::Null),
                        "market_cap_rank": item.get("market_cap_rank").cloned().unwrap_or(Value::Null),
                    }))
                })
                .collect();
            if !trending.is_empty() {
                payload.insert("trending".to_string(), Value::Array(trending));
            }
        }

        payload
    }
}
