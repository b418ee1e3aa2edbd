//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all market data operations
//! - [`RetryClass`]: Classification for determining fallback behavior

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

use crate::models::DataType;
use crate::registry::FetchDiagnostics;

/// Errors that can occur during market data operations.
///
/// Each variant is classified into a [`RetryClass`] via the [`retry_class`](Self::retry_class)
/// method, which determines how the aggregation loop handles the error.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// A provider was enabled without the credential it requires.
    /// Raised while building the service, before any network attempt.
    #[error("Configuration error for {provider}: {message}")]
    Configuration {
        /// The provider whose configuration is incomplete
        provider: String,
        /// What is missing or invalid
        message: String,
    },

    /// The requested or preferred provider id is not registered.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// No registered provider offers this capability (order books, streaming).
    #[error("Unsupported operation: {operation}")]
    UnsupportedOperation {
        /// The capability that was requested
        operation: DataType,
    },

    /// The interval string is not one of the canonical intervals.
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    /// Network or HTTP failure for a single attempt.
    /// Try the next provider in the chain.
    #[error("Request to {provider} failed: {message}")]
    ProviderRequest {
        /// The provider that was called
        provider: String,
        /// Transport or status details
        message: String,
    },

    /// The payload did not have the expected shape or held no usable rows.
    /// Try the next provider in the chain.
    #[error("Normalization failed for {provider}: {message}")]
    Normalization {
        /// The provider whose payload was rejected
        provider: String,
        /// Which part of the payload was unusable
        message: String,
    },

    /// Every provider in the fallback sequence was tried and none succeeded.
    #[error("All providers failed for {operation} of '{symbol}': {}", diagnostics.summary())]
    AllProvidersFailed {
        /// The data type that was requested
        operation: DataType,
        /// The canonical symbol of the request
        symbol: String,
        /// Ordered per-provider attempt log
        diagnostics: FetchDiagnostics,
    },
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use quotehub_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::ProviderRequest {
    ///     provider: "BINANCE".to_string(),
    ///     message: "HTTP 502".to_string(),
    /// };
    /// assert_eq!(error.retry_class(), RetryClass::NextProvider);
    ///
    /// let error = MarketDataError::UnknownProvider("NOPE".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::ProviderRequest { .. } | Self::Normalization { .. } => RetryClass::NextProvider,

            Self::Configuration { .. }
            | Self::UnknownProvider(_)
            | Self::UnsupportedOperation { .. }
            | Self::InvalidInterval(_)
            | Self::AllProvidersFailed { .. } => RetryClass::Never,
        }
    }

    /// The attempt log, when the error carries one.
    pub fn diagnostics(&self) -> Option<&FetchDiagnostics> {
        match self {
            Self::AllProvidersFailed { diagnostics, .. } => Some(diagnostics),
            _ => None,
        }
    }

    pub(crate) fn request(provider: &str, message: impl Into<String>) -> Self {
        Self::ProviderRequest {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn normalization(provider: &str, message: impl Into<String>) -> Self {
        Self::Normalization {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}
