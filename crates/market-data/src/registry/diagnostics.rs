//! Per-call attempt log for provider fallback diagnostics.

use std::fmt;

use serde::Serialize;

use crate::errors::MarketDataError;
use crate::models::ProviderId;

/// What happened when a provider was considered for a call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptOutcome {
    Success,
    /// Not attempted: the provider cannot serve this symbol.
    Skipped,
    RequestFailed,
    NormalizationFailed,
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Success => "SUCCESS",
            Self::Skipped => "SKIPPED",
            Self::RequestFailed => "REQUEST_FAILED",
            Self::NormalizationFailed => "NORMALIZATION_FAILED",
        };
        f.write_str(label)
    }
}

/// Record of a single provider attempt during a fetch.
#[derive(Clone, Debug, Serialize)]
pub struct ProviderAttempt {
    pub provider_id: ProviderId,
    pub outcome: AttemptOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Ordered attempt log of one logical call.
///
/// Lives only for the duration of the call (or inside the error it ends
/// with); nothing here feeds into later calls.
#[derive(Clone, Debug, Default, Serialize)]
pub struct FetchDiagnostics {
    pub attempts: Vec<ProviderAttempt>,
}

impl FetchDiagnostics {
    pub fn new() -> Self {
        Self {
            attempts: Vec::new(),
        }
    }

    pub fn record_skip(&mut self, provider_id: ProviderId, reason: impl Into<String>) {
        self.attempts.push(ProviderAttempt {
            provider_id,
            outcome: AttemptOutcome::Skipped,
            message: Some(reason.into()),
        });
    }

    pub fn record_error(&mut self, provider_id: ProviderId, error: &MarketDataError) {
        let (outcome, message) = match error {
            MarketDataError::Normalization { message, .. } => {
                (AttemptOutcome::NormalizationFailed, message.clone())
            }
            MarketDataError::ProviderRequest { message, .. } => {
                (AttemptOutcome::RequestFailed, message.clone())
            }
            other => (AttemptOutcome::RequestFailed, other.to_string()),
        };
        self.attempts.push(ProviderAttempt {
            provider_id,
            outcome,
            message: Some(message),
        });
    }

    pub fn record_success(&mut self, provider_id: ProviderId) {
        self.attempts.push(ProviderAttempt {
            provider_id,
            outcome: AttemptOutcome::Success,
            message: None,
        });
    }

    /// Summary for logging/debugging.
    pub fn summary(&self) -> String {
        self.attempts
            .iter()
            .map(|a| match &a.message {
                Some(message) => format!("{}: {} ({})", a.provider_id, a.outcome, message),
                None => format!("{}: {}", a.provider_id, a.outcome),
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Check if any provider succeeded.
    pub fn has_success(&self) -> bool {
        self.attempts
            .iter()
            .any(|a| a.outcome == AttemptOutcome::Success)
    }

    /// Providers actually called, in order (skips excluded).
    pub fn attempted(&self) -> Vec<&str> {
        self.attempts
            .iter()
            .filter(|a| a.outcome != AttemptOutcome::Skipped)
            .map(|a| a.provider_id.as_ref())
            .collect()
    }
}
