use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::ProviderId;

/// Latest trade/quote snapshot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickData {
    pub symbol: String,

    /// Quote time in epoch milliseconds
    pub timestamp_ms: i64,

    /// Last traded or mid price (required)
    pub price: Decimal,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ask: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<Decimal>,

    /// Source of the quote (BINANCE, YAHOO, ...)
    pub source: String,
}

impl TickData {
    /// Create a tick with only the required fields
    pub fn new(symbol: impl Into<String>, timestamp_ms: i64, price: Decimal, source: &str) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp_ms,
            price,
            bid: None,
            ask: None,
            volume: None,
            source: source.to_string(),
        }
    }

    pub fn with_book(mut self, bid: Option<Decimal>, ask: Option<Decimal>) -> Self {
        self.bid = bid;
        self.ask = ask;
        self
    }

    pub fn with_volume(mut self, volume: Option<Decimal>) -> Self {
        self.volume = volume;
        self
    }
}

/// Parameters of a latest-quote request
#[derive(Clone, Debug)]
pub struct QuoteRequest {
    pub symbol: String,
    pub preferred_provider: Option<ProviderId>,
}

impl QuoteRequest {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            preferred_provider: None,
        }
    }

    pub fn with_preferred_provider(mut self, provider: impl Into<ProviderId>) -> Self {
        self.preferred_provider = Some(provider.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tick_builder() {
        let tick = TickData::new("BTCUSDT", 1_700_000_000_000, dec!(65000.5), "BINANCE")
            .with_book(Some(dec!(65000.0)), Some(dec!(65001.0)));
        assert_eq!(tick.price, dec!(65000.5));
        assert_eq!(tick.bid, Some(dec!(65000)));
        assert!(tick.volume.is_none());
    }

    #[test]
    fn test_optional_fields_are_skipped() {
        let tick = TickData::new("AAPL", 0, dec!(150.25), "YAHOO");
        let json = serde_json::to_value(&tick).unwrap();
        assert!(json.get("bid").is_none());
        assert_eq!(json["source"], "YAHOO");
    }
}
