//! Provider descriptors, interval tables and authentication styles.
//!
//! This module defines the static facts the registry, selector and rate
//! limiter need about a provider, without any I/O.

use std::time::Duration;

use serde::Serialize;

use crate::models::{AssetClass, DataType, Interval};

/// How a provider expects its credential.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum AuthStyle {
    /// Public endpoints, no credential.
    None,
    /// Credential sent in the named header.
    Header(&'static str),
    /// `Authorization: Bearer <key>`.
    Bearer,
    /// Credential sent as the named query parameter.
    QueryParam(&'static str),
}

/// Per-provider interval vocabulary.
///
/// Intervals absent from `entries` map to the declared `fallback`, never to a
/// value computed on the fly.
#[derive(Clone, Copy, Debug)]
pub struct IntervalTable {
    pub entries: &'static [(Interval, &'static str)],
    pub fallback: &'static str,
}

impl IntervalTable {
    pub fn map(&self, interval: Interval) -> &'static str {
        self.entries
            .iter()
            .find(|(known, _)| *known == interval)
            .map(|(_, native)| *native)
            .unwrap_or(self.fallback)
    }

    pub fn supports(&self, interval: Interval) -> bool {
        self.entries.iter().any(|(known, _)| *known == interval)
    }

    /// Canonical intervals present in the table, in canonical order.
    pub fn supported(&self) -> Vec<Interval> {
        Interval::ALL
            .into_iter()
            .filter(|interval| self.supports(*interval))
            .collect()
    }
}

/// Static description of a registered provider.
///
/// Created at process start from the built-in table; read-only thereafter
/// except for a configured spacing override applied before registration.
#[derive(Clone, Debug, Serialize)]
pub struct ProviderDescriptor {
    /// Unique identifier ("BINANCE", "YAHOO", ...).
    pub id: &'static str,

    /// API host the provider is reached on.
    pub host: &'static str,

    /// Asset classes the provider carries.
    pub asset_classes: &'static [AssetClass],

    /// Data types the provider can serve.
    pub data_types: &'static [DataType],

    /// Native interval vocabulary, serialized as the canonical intervals it
    /// covers.
    #[serde(rename = "supported_intervals", serialize_with = "serialize_intervals")]
    pub intervals: IntervalTable,

    /// Minimum spacing between two requests to this provider.
    #[serde(serialize_with = "serialize_millis")]
    pub min_spacing: Duration,

    /// Credential placement.
    pub auth: AuthStyle,
}

impl ProviderDescriptor {
    pub fn requires_api_key(&self) -> bool {
        self.auth != AuthStyle::None
    }

    pub fn supports(&self, data_type: DataType) -> bool {
        self.data_types.contains(&data_type)
    }

    pub fn supports_asset_class(&self, asset_class: AssetClass) -> bool {
        self.asset_classes.contains(&asset_class)
    }

    /// Canonical intervals present in the provider's table.
    pub fn supported_intervals(&self) -> Vec<Interval> {
        self.intervals.supported()
    }
}

fn serialize_intervals<S: serde::Serializer>(
    table: &IntervalTable,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(table.supported())
}

fn serialize_millis<S: serde::Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_millis() as u64)
}
