//! Market data models
//!
//! This module contains the canonical data types returned by the engine:
//! - `types` - Type aliases and small enums (ProviderId, AssetClass, DataType)
//! - `interval` - Canonical candle interval vocabulary
//! - `candle` - OHLCV bars and candle range requests
//! - `tick` - Latest quote snapshots and quote requests
//! - `search` - Search result data (SymbolInfo)

mod candle;
mod interval;
mod search;
mod tick;
mod types;

pub use candle::{CandleData, CandleRequest, MAX_CANDLE_LIMIT};
pub use interval::Interval;
pub use search::SymbolInfo;
pub use tick::{QuoteRequest, TickData};
pub use types::{AssetClass, DataType, ProviderId};
