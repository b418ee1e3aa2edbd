//! Yahoo Finance API response models.
//!
//! Only the fields the normalizer reads are modelled. Every numeric column is
//! `Option` because Yahoo emits `null` for buckets without trades.

use serde::Deserialize;

/// Response wrapper for the v8 chart API
#[derive(Debug, Deserialize)]
pub struct YahooChartResponse {
    pub chart: YahooChart,
}

#[derive(Debug, Deserialize)]
pub struct YahooChart {
    #[serde(default)]
    pub result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    pub error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
pub struct YahooError {
    pub code: Option<String>,
    pub description: Option<String>,
}

/// One chart series
#[derive(Debug, Deserialize)]
pub struct YahooChartResult {
    pub meta: YahooChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Option<YahooIndicators>,
}

/// Series metadata, which also carries the latest market price
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooChartMeta {
    pub regular_market_price: Option<f64>,
    pub regular_market_time: Option<i64>,
    pub regular_market_volume: Option<f64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct YahooIndicators {
    #[serde(default)]
    pub quote: Vec<YahooQuoteColumns>,
}

/// Column-oriented OHLCV arrays, aligned with `timestamp`
#[derive(Debug, Default, Deserialize)]
pub struct YahooQuoteColumns {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

/// Response from the v1 search API
#[derive(Debug, Deserialize)]
pub struct YahooSearchResponse {
    #[serde(default)]
    pub quotes: Vec<YahooSearchQuote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooSearchQuote {
    pub symbol: Option<String>,
    #[serde(rename = "shortname")]
    pub short_name: Option<String>,
    #[serde(rename = "longname")]
    pub long_name: Option<String>,
    pub quote_type: Option<String>,
    pub exch_disp: Option<String>,
    pub exchange: Option<String>,
}
