//! Fallback sequence computation.
//!
//! The sequence for a call is built from three sources, in order:
//! 1. The caller's preferred provider, if any
//! 2. The configured preference list for the symbol's asset class
//! 3. Every other registered provider, in registry order
//!
//! Providers that cannot serve the requested data type are left out, and
//! each id appears at most once. The result only depends on its inputs.

use log::debug;

use super::ProviderRegistry;
use crate::config::SelectionPolicy;
use crate::errors::MarketDataError;
use crate::models::DataType;
use crate::resolver::classify;

/// Orders registered providers for a single logical call.
#[derive(Clone, Debug, Default)]
pub struct ProviderSelector {
    policy: SelectionPolicy,
}

impl ProviderSelector {
    pub fn new(policy: SelectionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    /// Ordered provider ids to try for `symbol` and `data_type`.
    ///
    /// Fails with [`MarketDataError::UnknownProvider`] when `preferred` is
    /// not registered. Unregistered ids in the preference lists are ignored.
    /// An empty sequence means no registered provider offers `data_type`.
    pub fn select_sequence(
        &self,
        registry: &ProviderRegistry,
        symbol: &str,
        data_type: DataType,
        preferred: Option<&str>,
    ) -> Result<Vec<&'static str>, MarketDataError> {
        let mut sequence: Vec<&'static str> = Vec::new();
        let mut push = |id: &'static str| {
            if !sequence.contains(&id) {
                sequence.push(id);
            }
        };

        if let Some(preferred) = preferred {
            let provider = registry
                .get(preferred)
                .ok_or_else(|| MarketDataError::UnknownProvider(preferred.to_string()))?;
            if provider.descriptor().supports(data_type) {
                push(provider.id());
            } else {
                debug!(
                    "Preferred provider '{}' does not serve {}, ignoring preference",
                    provider.id(),
                    data_type
                );
            }
        }

        let asset_class = classify(symbol);
        for id in self.policy.preferred_for(asset_class) {
            match registry.get(id) {
                Some(provider) if provider.descriptor().supports(data_type) => push(provider.id()),
                Some(_) => {}
                None => debug!("Preference list names unregistered provider '{}'", id),
            }
        }

        for provider in registry.supporting(data_type) {
            push(provider.id());
        }

        debug!(
            "Fallback sequence for {} '{}' ({}): {:?}",
            data_type, symbol, asset_class, sequence
        );
        Ok(sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarketDataConfig;

    fn registry(ids: &[&str]) -> ProviderRegistry {
        let config = MarketDataConfig::default()
            .with_providers(ids.iter().copied())
            .with_api_key("FINNHUB", "f")
            .with_api_key("ALPHA_VANTAGE", "a")
            .with_api_key("OANDA", "o");
        ProviderRegistry::from_config(&config).unwrap()
    }

    fn all_providers() -> ProviderRegistry {
        registry(&["BINANCE", "KRAKEN", "YAHOO", "FINNHUB", "ALPHA_VANTAGE", "OANDA"])
    }

    #[test]
    fn test_crypto_prefers_exchanges() {
        let registry = all_providers();
        let selector = ProviderSelector::default();

        let sequence = selector
            .select_sequence(&registry, "BTCUSDT", DataType::Candles, None)
            .unwrap();
        assert_eq!(
            sequence,
            vec!["BINANCE", "KRAKEN", "YAHOO", "FINNHUB", "ALPHA_VANTAGE", "OANDA"]
        );
    }

    #[test]
    fn test_forex_order() {
        let registry = all_providers();
        let selector = ProviderSelector::default();

        let sequence = selector
            .select_sequence(&registry, "EUR/USD", DataType::Quote, None)
            .unwrap();
        assert_eq!(
            sequence,
            vec!["OANDA", "ALPHA_VANTAGE", "YAHOO", "KRAKEN", "BINANCE", "FINNHUB"]
        );
    }

    #[test]
    fn test_preferred_goes_first_without_duplicates() {
        let registry = all_providers();
        let selector = ProviderSelector::default();

        let sequence = selector
            .select_sequence(&registry, "AAPL", DataType::Candles, Some("kraken"))
            .unwrap();
        assert_eq!(sequence[0], "KRAKEN");
        assert_eq!(sequence[1], "YAHOO");
        assert_eq!(sequence.iter().filter(|id| **id == "KRAKEN").count(), 1);
        assert_eq!(sequence.len(), 6);
    }

    #[test]
    fn test_unknown_preferred_provider_fails() {
        let registry = all_providers();
        let selector = ProviderSelector::default();

        let err = selector
            .select_sequence(&registry, "AAPL", DataType::Quote, Some("POLYGON"))
            .unwrap_err();
        assert!(matches!(err, MarketDataError::UnknownProvider(ref id) if id == "POLYGON"));
    }

    #[test]
    fn test_unregistered_preference_ids_are_ignored() {
        let registry = registry(&["KRAKEN", "YAHOO"]);
        let selector = ProviderSelector::default();

        let sequence = selector
            .select_sequence(&registry, "BTCUSDT", DataType::Candles, None)
            .unwrap();
        assert_eq!(sequence, vec!["KRAKEN", "YAHOO"]);
    }

    #[test]
    fn test_filters_by_data_type() {
        let registry = all_providers();
        let selector = ProviderSelector::default();

        let sequence = selector
            .select_sequence(&registry, "apple", DataType::Search, Some("BINANCE"))
            .unwrap();
        assert_eq!(sequence, vec!["YAHOO", "FINNHUB", "ALPHA_VANTAGE"]);

        let sequence = selector
            .select_sequence(&registry, "BTCUSDT", DataType::OrderBook, None)
            .unwrap();
        assert!(sequence.is_empty());
    }

    #[test]
    fn test_custom_policy() {
        let registry = all_providers();
        let selector = ProviderSelector::new(SelectionPolicy {
            crypto: vec!["YAHOO".to_string(), "NOPE".to_string()],
            ..SelectionPolicy::default()
        });

        let sequence = selector
            .select_sequence(&registry, "ETHBTC", DataType::Candles, None)
            .unwrap();
        assert_eq!(sequence[..3], ["YAHOO", "BINANCE", "KRAKEN"]);
    }

    #[test]
    fn test_sequence_is_deterministic() {
        let registry = all_providers();
        let selector = ProviderSelector::default();

        let first = selector
            .select_sequence(&registry, "SHOP.TO", DataType::Candles, None)
            .unwrap();
        let second = selector
            .select_sequence(&registry, "SHOP.TO", DataType::Candles, None)
            .unwrap();
        assert_eq!(first, second);
    }
}
