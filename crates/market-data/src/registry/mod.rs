//! Provider registry module.
//!
//! This module provides the per-call orchestration pieces, including:
//! - Provider registration from configuration
//! - Fallback sequence selection per asset class
//! - Rate limiting per provider
//! - Candle and tick validation
//! - Attempt diagnostics for failed calls

mod diagnostics;
mod provider_registry;
mod rate_limiter;
mod selector;
mod validator;

pub use diagnostics::{AttemptOutcome, FetchDiagnostics, ProviderAttempt};
pub use provider_registry::{ProviderRegistry, RegisteredProvider};
pub use rate_limiter::RateLimiter;
pub use selector::ProviderSelector;
pub use validator::{CandleValidator, ValidationIssue, ValidationSeverity, ValidatorConfig};
