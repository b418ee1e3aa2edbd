//! Service configuration.
//!
//! Every field has a default, so an empty JSON object (or no environment at
//! all) yields a working keyless setup: Binance, Kraken and Yahoo.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use crate::models::AssetClass;

const DEFAULT_QUOTE_TTL_SECS: u64 = 15;
const DEFAULT_CANDLE_TTL_SECS: u64 = 300;
const DEFAULT_CACHE_CAPACITY: u64 = 10_000;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
const DEFAULT_HTTP_TIMEOUT_MS: u64 = 10_000;

/// Per-asset-class provider preference lists.
///
/// The selector starts from the list for the symbol's asset class and then
/// appends every other capable provider in registry order. Ids that are not
/// registered are ignored.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SelectionPolicy {
    pub crypto: Vec<String>,
    pub forex: Vec<String>,
    pub stock: Vec<String>,
    pub unknown: Vec<String>,
}

impl SelectionPolicy {
    pub fn preferred_for(&self, asset_class: AssetClass) -> &[String] {
        match asset_class {
            AssetClass::Crypto => &self.crypto,
            AssetClass::Forex => &self.forex,
            AssetClass::Stock => &self.stock,
            AssetClass::Unknown => &self.unknown,
        }
    }
}

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|id| id.to_string()).collect()
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            // Exchange-native venues before aggregators
            crypto: ids(&["BINANCE", "KRAKEN", "YAHOO"]),
            forex: ids(&["OANDA", "ALPHA_VANTAGE", "YAHOO", "KRAKEN"]),
            stock: ids(&["YAHOO", "FINNHUB", "ALPHA_VANTAGE"]),
            unknown: ids(&["YAHOO"]),
        }
    }
}

/// Configuration of an [`AggregationService`](crate::AggregationService).
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MarketDataConfig {
    /// Ordered provider ids. `None` enables every keyless provider plus each
    /// keyed provider whose credential is present.
    pub enabled_providers: Option<Vec<String>>,

    /// Provider id -> API key.
    pub api_keys: HashMap<String, String>,

    pub quote_ttl_secs: u64,
    pub candle_ttl_secs: u64,

    /// Maximum entries per cache store.
    pub cache_capacity: u64,

    /// Period of the background stale-entry sweep; `None` disables it.
    pub sweep_interval_secs: Option<u64>,

    /// Whether `limit` is part of the candle cache key. When off, a cached
    /// range serves any request whose `limit` it covers.
    pub candle_key_includes_limit: bool,

    pub preferences: SelectionPolicy,

    /// Provider id -> minimum spacing in milliseconds.
    pub min_spacing_overrides: HashMap<String, u64>,

    /// Per HTTP call, not per logical call.
    pub http_timeout_ms: u64,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            enabled_providers: None,
            api_keys: HashMap::new(),
            quote_ttl_secs: DEFAULT_QUOTE_TTL_SECS,
            candle_ttl_secs: DEFAULT_CANDLE_TTL_SECS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            sweep_interval_secs: Some(DEFAULT_SWEEP_INTERVAL_SECS),
            candle_key_includes_limit: true,
            preferences: SelectionPolicy::default(),
            min_spacing_overrides: HashMap::new(),
            http_timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
        }
    }
}

impl MarketDataConfig {
    /// Read `QUOTEHUB_*` environment variables over the defaults.
    ///
    /// Unparsable numbers fall back to their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(list) = lookup("QUOTEHUB_PROVIDERS") {
            let providers: Vec<String> = list
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
            if !providers.is_empty() {
                config.enabled_providers = Some(providers);
            }
        }

        for (provider, var) in [
            ("FINNHUB", "QUOTEHUB_FINNHUB_API_KEY"),
            ("ALPHA_VANTAGE", "QUOTEHUB_ALPHA_VANTAGE_API_KEY"),
            ("OANDA", "QUOTEHUB_OANDA_API_KEY"),
        ] {
            if let Some(key) = lookup(var).filter(|k| !k.trim().is_empty()) {
                config.api_keys.insert(provider.to_string(), key.trim().to_string());
            }
        }

        let number = |var: &str, default: u64| {
            lookup(var)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };
        config.quote_ttl_secs = number("QUOTEHUB_QUOTE_TTL_SECS", DEFAULT_QUOTE_TTL_SECS);
        config.candle_ttl_secs = number("QUOTEHUB_CANDLE_TTL_SECS", DEFAULT_CANDLE_TTL_SECS);
        config.http_timeout_ms = number("QUOTEHUB_HTTP_TIMEOUT_MS", DEFAULT_HTTP_TIMEOUT_MS);

        if let Some(flag) = lookup("QUOTEHUB_CACHE_KEY_INCLUDES_LIMIT") {
            match flag.trim().to_ascii_lowercase().as_str() {
                "false" | "0" | "no" => config.candle_key_includes_limit = false,
                "true" | "1" | "yes" => config.candle_key_includes_limit = true,
                _ => {}
            }
        }

        config
    }

    pub fn quote_ttl(&self) -> Duration {
        Duration::from_secs(self.quote_ttl_secs)
    }

    pub fn candle_ttl(&self) -> Duration {
        Duration::from_secs(self.candle_ttl_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        self.sweep_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// API key for a provider, ignoring blanks.
    pub fn api_key(&self, provider: &str) -> Option<&str> {
        self.api_keys
            .get(provider)
            .map(|k| k.as_str())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn with_providers<I, S>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enabled_providers = Some(providers.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_api_key(mut self, provider: &str, key: &str) -> Self {
        self.api_keys.insert(provider.to_string(), key.to_string());
        self
    }
}
