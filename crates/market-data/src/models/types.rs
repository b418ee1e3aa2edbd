use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Provider identifier - mostly static constants
pub type ProviderId = Cow<'static, str>;

/// Categorical grouping used to bias provider preference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Crypto,
    Forex,
    Stock,
    Unknown,
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Crypto => write!(f, "crypto"),
            Self::Forex => write!(f, "forex"),
            Self::Stock => write!(f, "stock"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Kind of data a caller asks for; providers declare which they serve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Candles,
    Quote,
    Search,
    OrderBook,
    Stream,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Candles => write!(f, "candles"),
            Self::Quote => write!(f, "quote"),
            Self::Search => write!(f, "search"),
            Self::OrderBook => write!(f, "order_book"),
            Self::Stream => write!(f, "stream"),
        }
    }
}
