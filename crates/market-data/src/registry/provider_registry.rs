//! Registry of enabled market data providers.
//!
//! Built once from [`MarketDataConfig`] when the service is constructed:
//! - Resolves enabled provider ids against the built-in provider set
//! - Checks credentials before any network attempt
//! - Applies configured spacing overrides to the descriptors
//!
//! Read-only after construction.

use std::time::Duration;

use log::{debug, info};

use crate::config::MarketDataConfig;
use crate::errors::MarketDataError;
use crate::models::DataType;
use crate::provider::{MarketDataProvider, ProviderDescriptor, ProviderKind};

/// A provider enabled for this service, with its effective settings.
#[derive(Clone, Debug)]
pub struct RegisteredProvider {
    kind: ProviderKind,
    descriptor: ProviderDescriptor,
    api_key: Option<String>,
}

impl RegisteredProvider {
    pub fn id(&self) -> &'static str {
        self.descriptor.id
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Descriptor with the configured spacing override applied.
    pub fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }
}

/// Enabled providers in registry order.
#[derive(Clone, Debug)]
pub struct ProviderRegistry {
    providers: Vec<RegisteredProvider>,
}

impl ProviderRegistry {
    /// Build the registry from configuration.
    ///
    /// With an explicit provider list, an unknown id fails with
    /// `UnknownProvider` and a keyed provider without its key fails with
    /// `Configuration`. Without one, every keyless provider is enabled plus
    /// each keyed provider whose key is present.
    pub fn from_config(config: &MarketDataConfig) -> Result<Self, MarketDataError> {
        let kinds: Vec<ProviderKind> = match &config.enabled_providers {
            Some(ids) => {
                let mut kinds = Vec::with_capacity(ids.len());
                for id in ids {
                    let kind = ProviderKind::from_id(id)
                        .ok_or_else(|| MarketDataError::UnknownProvider(id.clone()))?;
                    if kind.descriptor().requires_api_key() && config.api_key(kind.id()).is_none() {
                        return Err(MarketDataError::Configuration {
                            provider: kind.id().to_string(),
                            message: "provider requires an API key but none is configured".to_string(),
                        });
                    }
                    if !kinds.contains(&kind) {
                        kinds.push(kind);
                    }
                }
                kinds
            }
            None => ProviderKind::ALL
                .into_iter()
                .filter(|kind| {
                    let keep = !kind.descriptor().requires_api_key()
                        || config.api_key(kind.id()).is_some();
                    if !keep {
                        debug!("Provider '{}' disabled: no API key configured", kind);
                    }
                    keep
                })
                .collect(),
        };

        let providers: Vec<RegisteredProvider> = kinds
            .into_iter()
            .map(|kind| {
                let mut descriptor = kind.descriptor().clone();
                if let Some(ms) = config.min_spacing_overrides.get(kind.id()) {
                    descriptor.min_spacing = Duration::from_millis(*ms);
                }
                RegisteredProvider {
                    kind,
                    descriptor,
                    api_key: config.api_key(kind.id()).map(str::to_string),
                }
            })
            .collect();

        info!(
            "Registered providers: {:?}",
            providers.iter().map(|p| p.id()).collect::<Vec<_>>()
        );

        Ok(Self { providers })
    }

    /// Descriptor of a registered provider.
    pub fn lookup(&self, id: &str) -> Result<&ProviderDescriptor, MarketDataError> {
        self.get(id)
            .map(RegisteredProvider::descriptor)
            .ok_or_else(|| MarketDataError::UnknownProvider(id.to_string()))
    }

    /// Registered provider by id, case-insensitive.
    pub fn get(&self, id: &str) -> Option<&RegisteredProvider> {
        let id = id.trim();
        self.providers.iter().find(|p| p.id().eq_ignore_ascii_case(id))
    }

    pub fn all(&self) -> &[RegisteredProvider] {
        &self.providers
    }

    pub fn descriptors(&self) -> Vec<&ProviderDescriptor> {
        self.providers.iter().map(RegisteredProvider::descriptor).collect()
    }

    /// Providers that serve `data_type`, in registry order.
    pub fn supporting(&self, data_type: DataType) -> impl Iterator<Item = &RegisteredProvider> {
        self.providers
            .iter()
            .filter(move |p| p.descriptor.supports(data_type))
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_set_is_keyless() {
        let registry = ProviderRegistry::from_config(&MarketDataConfig::default()).unwrap();
        let ids: Vec<&str> = registry.all().iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["BINANCE", "KRAKEN", "YAHOO"]);
    }

    #[test]
    fn test_default_set_includes_keyed_with_key() {
        let config = MarketDataConfig::default().with_api_key("OANDA", "token");
        let registry = ProviderRegistry::from_config(&config).unwrap();

        let oanda = registry.get("OANDA").unwrap();
        assert_eq!(oanda.api_key(), Some("token"));
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_explicit_keyed_provider_without_key_fails() {
        let config = MarketDataConfig::default().with_providers(["YAHOO", "FINNHUB"]);
        let err = ProviderRegistry::from_config(&config).unwrap_err();
        assert!(matches!(err, MarketDataError::Configuration { ref provider, .. } if provider == "FINNHUB"));
    }

    #[test]
    fn test_explicit_unknown_provider_fails() {
        let config = MarketDataConfig::default().with_providers(["YAHOO", "POLYGON"]);
        let err = ProviderRegistry::from_config(&config).unwrap_err();
        assert!(matches!(err, MarketDataError::UnknownProvider(ref id) if id == "POLYGON"));
    }

    #[test]
    fn test_explicit_order_is_kept() {
        let config = MarketDataConfig::default().with_providers(["yahoo", "BINANCE", "YAHOO"]);
        let registry = ProviderRegistry::from_config(&config).unwrap();
        let ids: Vec<&str> = registry.all().iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["YAHOO", "BINANCE"]);
    }

    #[test]
    fn test_lookup() {
        let registry = ProviderRegistry::from_config(&MarketDataConfig::default()).unwrap();
        assert_eq!(registry.lookup("KRAKEN").unwrap().host, "api.kraken.com");
        assert!(matches!(
            registry.lookup("FINNHUB"),
            Err(MarketDataError::UnknownProvider(_))
        ));
    }

    #[test]
    fn test_spacing_override() {
        let mut config = MarketDataConfig::default();
        config.min_spacing_overrides.insert("BINANCE".to_string(), 250);
        let registry = ProviderRegistry::from_config(&config).unwrap();

        assert_eq!(
            registry.lookup("BINANCE").unwrap().min_spacing,
            Duration::from_millis(250)
        );
        assert_eq!(
            registry.lookup("KRAKEN").unwrap().min_spacing,
            Duration::from_millis(1000)
        );
    }

    #[test]
    fn test_supporting() {
        let registry = ProviderRegistry::from_config(&MarketDataConfig::default()).unwrap();
        let search: Vec<&str> = registry.supporting(DataType::Search).map(|p| p.id()).collect();
        assert_eq!(search, vec!["YAHOO"]);
        assert_eq!(registry.supporting(DataType::Stream).count(), 0);
    }
}
