//! Search result models for symbol lookup.

use serde::{Deserialize, Serialize};

/// Result from a ticker/symbol search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    /// Symbol/ticker as the provider lists it (e.g., "AAPL", "SHOP.TO")
    pub symbol: String,

    /// Short display name (e.g., "Apple Inc")
    pub name: String,

    /// Asset type (e.g., "Stock", "ETF", "Crypto")
    pub asset_type: String,

    /// Exchange name (e.g., "NASDAQ")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,

    /// Provider that returned the match
    pub source: String,
}

impl SymbolInfo {
    /// Create a new search result with required fields.
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        asset_type: impl Into<String>,
        source: &str,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            asset_type: asset_type.into(),
            exchange: None,
            source: source.to_string(),
        }
    }

    /// Set the exchange, ignoring blanks.
    pub fn with_exchange(mut self, exchange: Option<&str>) -> Self {
        self.exchange = exchange
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string);
        self
    }
}
