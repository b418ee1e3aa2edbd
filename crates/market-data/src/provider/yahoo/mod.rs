//! Yahoo Finance market data provider.
//!
//! - Candles and the latest quote via the v8 chart API
//! - Symbol search via the v1 search API
//!
//! Covers equities on most exchanges (keeping Yahoo's exchange suffixes such
//! as `.TO` or `.L`), crypto as `BTC-USD` and forex as `EURUSD=X`. No API key.

mod models;

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::models::{AssetClass, CandleData, DataType, Interval, SymbolInfo, TickData};
use crate::provider::capabilities::{AuthStyle, IntervalTable, ProviderDescriptor};
use crate::provider::decode::{secs_to_millis, warn_dropped, warn_malformed};
use crate::provider::transport::HttpRequest;
use crate::provider::CandleQuery;
use crate::resolver::{classify, split_pair};

use models::{YahooChartResponse, YahooChartResult, YahooQuoteColumns, YahooSearchResponse};

const BASE_URL: &str = "https://query1.finance.yahoo.com";
pub(crate) const PROVIDER_ID: &str = "YAHOO";

pub(crate) static DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    id: PROVIDER_ID,
    host: "query1.finance.yahoo.com",
    asset_classes: &[AssetClass::Stock, AssetClass::Crypto, AssetClass::Forex],
    data_types: &[DataType::Candles, DataType::Quote, DataType::Search],
    intervals: IntervalTable {
        entries: &[
            (Interval::Minute1, "1m"),
            (Interval::Minute5, "5m"),
            (Interval::Minute15, "15m"),
            (Interval::Minute30, "30m"),
            (Interval::Hour1, "60m"),
            (Interval::Day1, "1d"),
            (Interval::Week1, "1wk"),
            (Interval::Month1, "1mo"),
        ],
        fallback: "60m",
    },
    min_spacing: Duration::from_millis(500),
    auth: AuthStyle::None,
};

/// Stable stablecoin quotes collapse to USD on Yahoo.
fn yahoo_quote_currency(quote: &str) -> &str {
    match quote {
        "USDT" | "USDC" | "BUSD" => "USD",
        other => other,
    }
}

pub(crate) fn map_symbol(symbol: &str) -> String {
    match (classify(symbol), split_pair(symbol)) {
        (AssetClass::Crypto, Some((base, quote))) => {
            format!("{}-{}", base, yahoo_quote_currency(quote))
        }
        (AssetClass::Forex, Some((base, quote))) => format!("{}{}=X", base, quote),
        _ => symbol.to_string(),
    }
}

pub(crate) fn candles_request(query: &CandleQuery) -> HttpRequest {
    let (from, to) = query.window_secs();
    HttpRequest::get(format!("{}/v8/finance/chart/{}", BASE_URL, query.native_symbol))
        .query("interval", query.native_interval)
        .query("period1", from)
        .query("period2", to)
        .query("includePrePost", "false")
}

pub(crate) fn quote_request(native_symbol: &str) -> HttpRequest {
    HttpRequest::get(format!("{}/v8/finance/chart/{}", BASE_URL, native_symbol))
        .query("interval", "1d")
        .query("range", "1d")
}

pub(crate) fn search_request(query: &str) -> HttpRequest {
    HttpRequest::get(format!("{}/v1/finance/search", BASE_URL))
        .query("q", query)
        .query("quotesCount", 10)
        .query("newsCount", 0)
}

fn to_decimal(value: Option<f64>) -> Option<Decimal> {
    value.and_then(|v| Decimal::try_from(v).ok())
}

/// First chart series, or `None` with a warning when Yahoo reported an error.
fn chart_result(raw: &Value) -> Option<YahooChartResult> {
    let response = match YahooChartResponse::deserialize(raw) {
        Ok(response) => response,
        Err(e) => {
            warn_malformed(PROVIDER_ID, "chart", &e.to_string());
            return None;
        }
    };

    if let Some(error) = response.chart.error {
        let reason = error
            .description
            .or(error.code)
            .unwrap_or_else(|| "unknown error".to_string());
        warn_malformed(PROVIDER_ID, "chart.error", &reason);
        return None;
    }

    let result = response.chart.result.and_then(|r| r.into_iter().next());
    if result.is_none() {
        warn_malformed(PROVIDER_ID, "chart.result", "empty result");
    }
    result
}

pub(crate) fn normalize_candles(raw: &Value, symbol: &str, interval: Interval) -> Vec<CandleData> {
    let Some(result) = chart_result(raw) else {
        return Vec::new();
    };

    let columns = result
        .indicators
        .and_then(|i| i.quote.into_iter().next())
        .unwrap_or_default();

    result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let candle = parse_row(&columns, i, *ts, symbol, interval);
            if candle.is_none() {
                warn_dropped(PROVIDER_ID, "indicators.quote", i);
            }
            candle
        })
        .collect()
}

fn parse_row(
    columns: &YahooQuoteColumns,
    i: usize,
    ts: i64,
    symbol: &str,
    interval: Interval,
) -> Option<CandleData> {
    let column = |values: &[Option<f64>]| to_decimal(values.get(i).copied().flatten());
    Some(CandleData {
        symbol: symbol.to_string(),
        interval,
        timestamp_ms: secs_to_millis(ts)?,
        open: column(&columns.open)?,
        high: column(&columns.high)?,
        low: column(&columns.low)?,
        close: column(&columns.close)?,
        // Forex series carry no volume
        volume: column(&columns.volume).unwrap_or(Decimal::ZERO),
        source: PROVIDER_ID.to_string(),
    })
}

pub(crate) fn normalize_tick(raw: &Value, symbol: &str, now_ms: i64) -> Option<TickData> {
    let meta = chart_result(raw)?.meta;

    let Some(price) = to_decimal(meta.regular_market_price) else {
        warn_malformed(PROVIDER_ID, "meta.regularMarketPrice", "missing or not numeric");
        return None;
    };

    let timestamp_ms = match meta.regular_market_time {
        Some(secs) => {
            let Some(ms) = secs_to_millis(secs) else {
                warn_malformed(PROVIDER_ID, "meta.regularMarketTime", "out of range");
                return None;
            };
            ms
        }
        None => now_ms,
    };

    Some(
        TickData::new(symbol, timestamp_ms, price, PROVIDER_ID)
            .with_book(to_decimal(meta.bid), to_decimal(meta.ask))
            .with_volume(to_decimal(meta.regular_market_volume)),
    )
}

fn asset_type_label(quote_type: &str) -> String {
    match quote_type {
        "EQUITY" => "Stock".to_string(),
        "ETF" => "ETF".to_string(),
        "MUTUALFUND" => "Mutual Fund".to_string(),
        "CRYPTOCURRENCY" => "Crypto".to_string(),
        "CURRENCY" => "Forex".to_string(),
        "INDEX" => "Index".to_string(),
        other => other.to_string(),
    }
}

pub(crate) fn normalize_search(raw: &Value) -> Vec<SymbolInfo> {
    let response = match YahooSearchResponse::deserialize(raw) {
        Ok(response) => response,
        Err(e) => {
            warn_malformed(PROVIDER_ID, "quotes", &e.to_string());
            return Vec::new();
        }
    };

    response
        .quotes
        .into_iter()
        .filter_map(|quote| {
            let symbol = quote.symbol?;
            let name = quote
                .short_name
                .or(quote.long_name)
                .unwrap_or_else(|| symbol.clone());
            let asset_type = quote
                .quote_type
                .as_deref()
                .map(asset_type_label)
                .unwrap_or_default();
            let exchange = quote.exch_disp.or(quote.exchange);

            Some(
                SymbolInfo::new(symbol, name, asset_type, PROVIDER_ID)
                    .with_exchange(exchange.as_deref()),
            )
        })
        .collect()
}
