//! Alpha Vantage market data provider.
//!
//! One endpoint (`/query`) multiplexed by the `function` parameter:
//! - Equities: TIME_SERIES_INTRADAY / DAILY / WEEKLY / MONTHLY, GLOBAL_QUOTE
//! - Forex: FX_INTRADAY / DAILY / WEEKLY / MONTHLY, CURRENCY_EXCHANGE_RATE
//! - Search: SYMBOL_SEARCH
//!
//! Free tier: 5 requests per minute, 25 per day. Throttling is reported in a
//! 200 response carrying a `Note` or `Information` key instead of data.
//! Series keys are naive `YYYY-MM-DD[ HH:MM:SS]` strings, read as UTC.

use std::time::Duration;

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::models::{AssetClass, CandleData, DataType, Interval, SymbolInfo, TickData};
use crate::provider::capabilities::{AuthStyle, IntervalTable, ProviderDescriptor};
use crate::provider::decode::{decimal, naive_millis, warn_dropped, warn_malformed};
use crate::provider::transport::HttpRequest;
use crate::provider::CandleQuery;
use crate::resolver::{classify, split_pair, strip_exchange_suffix};

const BASE_URL: &str = "https://www.alphavantage.co/query";
pub(crate) const PROVIDER_ID: &str = "ALPHA_VANTAGE";

/// Intraday `outputsize=compact` returns the latest 100 points.
const COMPACT_SIZE: u32 = 100;

pub(crate) static DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    id: PROVIDER_ID,
    host: "www.alphavantage.co",
    asset_classes: &[AssetClass::Stock, AssetClass::Forex],
    data_types: &[DataType::Candles, DataType::Quote, DataType::Search],
    intervals: IntervalTable {
        entries: &[
            (Interval::Minute1, "1min"),
            (Interval::Minute5, "5min"),
            (Interval::Minute15, "15min"),
            (Interval::Minute30, "30min"),
            (Interval::Hour1, "60min"),
            (Interval::Day1, "daily"),
            (Interval::Week1, "weekly"),
            (Interval::Month1, "monthly"),
        ],
        fallback: "60min",
    },
    min_spacing: Duration::from_millis(12_000),
    auth: AuthStyle::QueryParam("apikey"),
};

/// Forex pairs become `EUR/USD` (split again when building the request);
/// equities lose their exchange suffix.
pub(crate) fn map_symbol(symbol: &str) -> String {
    match (classify(symbol), split_pair(symbol)) {
        (AssetClass::Forex, Some((base, quote))) => format!("{}/{}", base, quote),
        _ => strip_exchange_suffix(symbol).to_string(),
    }
}

fn fx_legs(native_symbol: &str) -> Option<(&str, &str)> {
    native_symbol.split_once('/')
}

fn series_function(native_interval: &str, fx: bool) -> &'static str {
    match (fx, native_interval) {
        (false, "daily") => "TIME_SERIES_DAILY",
        (false, "weekly") => "TIME_SERIES_WEEKLY",
        (false, "monthly") => "TIME_SERIES_MONTHLY",
        (false, _) => "TIME_SERIES_INTRADAY",
        (true, "daily") => "FX_DAILY",
        (true, "weekly") => "FX_WEEKLY",
        (true, "monthly") => "FX_MONTHLY",
        (true, _) => "FX_INTRADAY",
    }
}

pub(crate) fn candles_request(query: &CandleQuery) -> HttpRequest {
    let legs = fx_legs(&query.native_symbol);
    let function = series_function(query.native_interval, legs.is_some());

    let mut request = HttpRequest::get(BASE_URL).query("function", function);
    request = match legs {
        Some((from, to)) => request.query("from_symbol", from).query("to_symbol", to),
        None => request.query("symbol", &query.native_symbol),
    };
    if function.ends_with("INTRADAY") {
        request = request.query("interval", query.native_interval);
    }
    if !function.ends_with("WEEKLY") && !function.ends_with("MONTHLY") {
        let size = if query.limit <= COMPACT_SIZE { "compact" } else { "full" };
        request = request.query("outputsize", size);
    }
    request
}

pub(crate) fn quote_request(native_symbol: &str) -> HttpRequest {
    match fx_legs(native_symbol) {
        Some((from, to)) => HttpRequest::get(BASE_URL)
            .query("function", "CURRENCY_EXCHANGE_RATE")
            .query("from_currency", from)
            .query("to_currency", to),
        None => HttpRequest::get(BASE_URL)
            .query("function", "GLOBAL_QUOTE")
            .query("symbol", native_symbol),
    }
}

pub(crate) fn search_request(query: &str) -> HttpRequest {
    HttpRequest::get(BASE_URL)
        .query("function", "SYMBOL_SEARCH")
        .query("keywords", query)
}

/// Alpha Vantage reports errors and throttling in-band.
fn api_message(raw: &Value) -> Option<&str> {
    ["Error Message", "Note", "Information"]
        .iter()
        .find_map(|key| raw.get(*key).and_then(Value::as_str))
}

fn checked_object<'a>(raw: &'a Value, field: &str) -> Option<&'a Map<String, Value>> {
    if let Some(message) = api_message(raw) {
        warn_malformed(PROVIDER_ID, field, message);
        return None;
    }
    raw.as_object()
}

pub(crate) fn normalize_candles(raw: &Value, symbol: &str, interval: Interval) -> Vec<CandleData> {
    let series = checked_object(raw, "Time Series").and_then(|body| {
        body.iter()
            .find(|(key, _)| key.starts_with("Time Series"))
            .and_then(|(_, value)| value.as_object())
    });
    let Some(series) = series else {
        warn_malformed(PROVIDER_ID, "Time Series", "no time series in payload");
        return Vec::new();
    };

    let mut candles: Vec<CandleData> = series
        .iter()
        .enumerate()
        .filter_map(|(index, (stamp, row))| {
            let candle = parse_bar(stamp, row, symbol, interval);
            if candle.is_none() {
                warn_dropped(PROVIDER_ID, "Time Series", index);
            }
            candle
        })
        .collect();

    // Series come newest first
    candles.sort_by_key(|c| c.timestamp_ms);
    candles
}

fn parse_bar(stamp: &str, row: &Value, symbol: &str, interval: Interval) -> Option<CandleData> {
    let field = |name: &str| row.get(name).and_then(decimal);
    Some(CandleData {
        symbol: symbol.to_string(),
        interval,
        timestamp_ms: naive_millis(stamp)?,
        open: field("1. open")?,
        high: field("2. high")?,
        low: field("3. low")?,
        close: field("4. close")?,
        // FX series have no volume column
        volume: field("5. volume").unwrap_or(Decimal::ZERO),
        source: PROVIDER_ID.to_string(),
    })
}

pub(crate) fn normalize_tick(raw: &Value, symbol: &str, now_ms: i64) -> Option<TickData> {
    let body = checked_object(raw, "quote")?;

    if let Some(rate) = body.get("Realtime Currency Exchange Rate") {
        let field = |name: &str| rate.get(name).and_then(decimal);
        let Some(price) = field("5. Exchange Rate") else {
            warn_malformed(PROVIDER_ID, "5. Exchange Rate", "missing or not numeric");
            return None;
        };
        let timestamp_ms = rate
            .get("6. Last Refreshed")
            .and_then(Value::as_str)
            .and_then(naive_millis)
            .unwrap_or(now_ms);
        return Some(
            TickData::new(symbol, timestamp_ms, price, PROVIDER_ID)
                .with_book(field("8. Bid Price"), field("9. Ask Price")),
        );
    }

    let quote = body.get("Global Quote")?;
    let field = |name: &str| quote.get(name).and_then(decimal);
    // Unknown symbols come back as an empty "Global Quote" object
    let Some(price) = field("05. price") else {
        warn_malformed(PROVIDER_ID, "05. price", "empty quote, symbol may be unknown");
        return None;
    };
    let timestamp_ms = quote
        .get("07. latest trading day")
        .and_then(Value::as_str)
        .and_then(naive_millis)
        .unwrap_or(now_ms);

    Some(TickData::new(symbol, timestamp_ms, price, PROVIDER_ID).with_volume(field("06. volume")))
}

pub(crate) fn normalize_search(raw: &Value) -> Vec<SymbolInfo> {
    let Some(matches) = checked_object(raw, "bestMatches")
        .and_then(|body| body.get("bestMatches"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    matches
        .iter()
        .filter_map(|item| {
            let text = |name: &str| item.get(name).and_then(Value::as_str);
            let symbol = text("1. symbol")?;
            let asset_type = match text("3. type") {
                Some("Equity") => "Stock",
                Some(other) => other,
                None => "Unknown",
            };
            Some(
                SymbolInfo::new(symbol, text("2. name").unwrap_or(symbol), asset_type, PROVIDER_ID)
                    .with_exchange(text("4. region")),
            )
        })
        .collect()
}
