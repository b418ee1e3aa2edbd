//! Candle and tick data validation.
//!
//! Validates normalized records before they can be returned or cached:
//! - OHLC invariants (high >= max(open, close), low <= min(open, close))
//! - Strictly positive prices, non-negative volume
//! - Reasonable value ranges

use log::warn;
use rust_decimal::Decimal;

use crate::models::{CandleData, TickData};

/// Validation severity levels.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationSeverity {
    /// Hard failure - drop the record.
    Hard,
    /// Soft warning - keep the record but log a warning.
    Soft,
}

/// Validation result details.
#[derive(Clone, Debug)]
pub struct ValidationIssue {
    pub severity: ValidationSeverity,
    pub message: String,
}

/// Candle validator configuration.
#[derive(Clone, Debug)]
pub struct ValidatorConfig {
    /// Maximum allowed price value (for sanity check).
    pub max_price: Option<Decimal>,
    /// Whether to warn on zero volume. Off by default: forex series carry none.
    pub warn_on_zero_volume: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_price: Some(Decimal::from(1_000_000_000i64)), // 1 billion as sanity check
            warn_on_zero_volume: false,
        }
    }
}

/// Candle and tick validator.
pub struct CandleValidator {
    config: ValidatorConfig,
}

impl CandleValidator {
    /// Create a new validator with default configuration.
    pub fn new() -> Self {
        Self {
            config: ValidatorConfig::default(),
        }
    }

    /// Create a validator with custom configuration.
    pub fn with_config(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Validate a candle.
    ///
    /// Returns the hard issues joined into one message. Soft issues are
    /// logged but do not cause rejection.
    pub fn validate(&self, candle: &CandleData) -> Result<(), String> {
        let mut issues: Vec<ValidationIssue> = Vec::new();

        self.validate_prices(
            &[candle.open, candle.high, candle.low, candle.close],
            &mut issues,
        );
        self.validate_ohlc_invariants(candle, &mut issues);
        self.validate_volume(candle.volume, &mut issues);

        self.finish(&issues, || {
            format!("{} @ {} from {}", candle.symbol, candle.timestamp_ms, candle.source)
        })
    }

    /// Validate a tick: positive price, sane bid/ask.
    pub fn validate_tick(&self, tick: &TickData) -> Result<(), String> {
        let mut issues: Vec<ValidationIssue> = Vec::new();

        let mut prices = vec![tick.price];
        prices.extend(tick.bid);
        prices.extend(tick.ask);
        self.validate_prices(&prices, &mut issues);

        if let Some(volume) = tick.volume {
            self.validate_volume(volume, &mut issues);
        }
        if let (Some(bid), Some(ask)) = (tick.bid, tick.ask) {
            if bid > ask {
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Soft,
                    message: format!("Crossed book: bid {} > ask {}", bid, ask),
                });
            }
        }

        self.finish(&issues, || format!("{} tick from {}", tick.symbol, tick.source))
    }

    /// Validate all candles in a batch.
    ///
    /// Returns the accepted candles; rejected ones are logged and dropped.
    pub fn validate_batch(&self, candles: Vec<CandleData>) -> Vec<CandleData> {
        candles
            .into_iter()
            .filter(|candle| match self.validate(candle) {
                Ok(()) => true,
                Err(message) => {
                    warn!(
                        "Dropping candle {} @ {} from {}: {}",
                        candle.symbol, candle.timestamp_ms, candle.source, message
                    );
                    false
                }
            })
            .collect()
    }

    fn finish(&self, issues: &[ValidationIssue], subject: impl Fn() -> String) -> Result<(), String> {
        let errors: Vec<&str> = issues
            .iter()
            .filter(|i| i.severity == ValidationSeverity::Hard)
            .map(|i| i.message.as_str())
            .collect();

        if !errors.is_empty() {
            return Err(errors.join("; "));
        }

        for issue in issues.iter().filter(|i| i.severity == ValidationSeverity::Soft) {
            warn!("Validation warning for {}: {}", subject(), issue.message);
        }

        Ok(())
    }

    fn validate_prices(&self, prices: &[Decimal], issues: &mut Vec<ValidationIssue>) {
        for price in prices {
            if *price <= Decimal::ZERO {
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Hard,
                    message: format!("Non-positive price: {}", price),
                });
            }
            if let Some(max) = self.config.max_price {
                if *price > max {
                    issues.push(ValidationIssue {
                        severity: ValidationSeverity::Hard,
                        message: format!("Price {} exceeds sanity limit {}", price, max),
                    });
                }
            }
        }
    }

    fn validate_ohlc_invariants(&self, candle: &CandleData, issues: &mut Vec<ValidationIssue>) {
        if candle.high < candle.open.max(candle.close) {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Hard,
                message: format!(
                    "High {} below max(open {}, close {})",
                    candle.high, candle.open, candle.close
                ),
            });
        }
        if candle.low > candle.open.min(candle.close) {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Hard,
                message: format!(
                    "Low {} above min(open {}, close {})",
                    candle.low, candle.open, candle.close
                ),
            });
        }
    }

    fn validate_volume(&self, volume: Decimal, issues: &mut Vec<ValidationIssue>) {
        if volume < Decimal::ZERO {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Hard,
                message: format!("Negative volume: {}", volume),
            });
        } else if volume == Decimal::ZERO && self.config.warn_on_zero_volume {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Soft,
                message: "Zero volume".to_string(),
            });
        }
    }
}

impl Default for CandleValidator {
    fn default() -> Self {
        Self::new()
    }
}
