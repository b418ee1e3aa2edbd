//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The `MarketDataProvider` trait every provider implements
//! - Provider descriptors (capabilities, interval tables, spacing, auth)
//! - The `HttpTransport` seam and its `reqwest` implementation
//! - Concrete providers: Binance, Kraken, Yahoo, Finnhub, Alpha Vantage, OANDA
//!
//! # Architecture
//!
//! Providers never perform I/O. The service asks a provider for an
//! `HttpRequest`, runs it through the rate limiter and the transport, then
//! hands the JSON body back to the provider's normalizer. [`ProviderKind`]
//! has one variant per provider module; adding a provider means adding a
//! module with its descriptor, request builders and normalizers, plus a
//! variant.

mod capabilities;
mod decode;
mod kind;
mod traits;
mod transport;

pub mod alpha_vantage;
pub mod binance;
pub mod finnhub;
pub mod kraken;
pub mod oanda;
pub mod yahoo;

pub use capabilities::{AuthStyle, IntervalTable, ProviderDescriptor};
pub use kind::ProviderKind;
pub use traits::{CandleQuery, MarketDataProvider};
pub use transport::{HttpRequest, HttpTransport, ReqwestTransport};
