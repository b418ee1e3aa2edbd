//! Minimum-spacing rate limiter for market data providers.
//!
//! Each provider has a minimum interval between two consecutive requests.
//! Callers reserve the next free slot under a short lock and then sleep until
//! that slot outside of it, so concurrent callers for the same provider are
//! serialized in reservation order and never observe a gap shorter than the
//! spacing. Callers for different providers never wait on each other.
//!
//! The limiter only delays; it never fails a call.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, warn};
use tokio::time::Instant;

/// Spacing state of a single provider.
#[derive(Debug)]
struct ProviderSlot {
    /// Minimum gap between two requests.
    spacing: Duration,
    /// Start time of the most recently reserved request.
    last_reserved: Option<Instant>,
}

impl ProviderSlot {
    fn new(spacing: Duration) -> Self {
        Self {
            spacing,
            last_reserved: None,
        }
    }

    /// Reserve the earliest slot at or after `now`.
    fn reserve(&mut self, now: Instant) -> Instant {
        let slot = match self.last_reserved {
            Some(last) => now.max(last + self.spacing),
            None => now,
        };
        self.last_reserved = Some(slot);
        slot
    }
}

/// Per-provider spacing guard.
///
/// Thread-safe; shared by every call of the service. Providers that were
/// never configured are not delayed.
pub struct RateLimiter {
    slots: Mutex<HashMap<String, ProviderSlot>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Lock the slots mutex, recovering from poison if necessary.
    ///
    /// The guarded state is a timestamp per provider; a panic while holding
    /// the lock cannot leave it inconsistent.
    fn lock_slots(&self) -> MutexGuard<'_, HashMap<String, ProviderSlot>> {
        self.slots.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter slots mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Set the minimum spacing for a provider.
    ///
    /// Reconfiguring keeps the last reservation so an in-flight schedule is
    /// not reset.
    pub fn configure(&self, provider: &str, spacing: Duration) {
        let mut slots = self.lock_slots();
        slots
            .entry(provider.to_string())
            .and_modify(|slot| slot.spacing = spacing)
            .or_insert_with(|| ProviderSlot::new(spacing));
    }

    /// Configured spacing for a provider, if any.
    pub fn spacing(&self, provider: &str) -> Option<Duration> {
        self.lock_slots().get(provider).map(|slot| slot.spacing)
    }

    /// Wait until a request to `provider` may be issued.
    ///
    /// Returns how long the caller was delayed.
    pub async fn acquire(&self, provider: &str) -> Duration {
        let now = Instant::now();
        let slot = {
            let mut slots = self.lock_slots();
            match slots.get_mut(provider) {
                Some(state) => state.reserve(now),
                None => return Duration::ZERO,
            }
        };

        let wait = slot.saturating_duration_since(now);
        if wait > Duration::ZERO {
            debug!("Rate limiter: waiting {:?} for provider '{}'", wait, provider);
            tokio::time::sleep_until(slot).await;
        }
        wait
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_request_is_immediate() {
        let limiter = RateLimiter::new();
        limiter.configure("BINANCE", Duration::from_millis(100));

        assert_eq!(limiter.acquire("BINANCE").await, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_request_waits_for_spacing() {
        let limiter = RateLimiter::new();
        limiter.configure("KRAKEN", Duration::from_millis(1000));

        let start = Instant::now();
        limiter.acquire("KRAKEN").await;
        limiter.acquire("KRAKEN").await;

        assert_eq!(start.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_spacing_elapsed() {
        let limiter = RateLimiter::new();
        limiter.configure("YAHOO", Duration::from_millis(500));

        limiter.acquire("YAHOO").await;
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(limiter.acquire("YAHOO").await, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_are_serialized() {
        let limiter = Arc::new(RateLimiter::new());
        limiter.configure("OANDA", Duration::from_millis(200));

        let start = Instant::now();
        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move {
                    limiter.acquire("OANDA").await;
                    Instant::now()
                })
            })
            .collect();

        let mut issued = Vec::new();
        for task in tasks {
            issued.push(task.await.unwrap());
        }
        issued.sort();

        for pair in issued.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(200));
        }
        assert_eq!(issued[3] - start, Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_providers_are_isolated() {
        let limiter = RateLimiter::new();
        limiter.configure("ALPHA_VANTAGE", Duration::from_secs(12));
        limiter.configure("BINANCE", Duration::from_millis(100));

        limiter.acquire("ALPHA_VANTAGE").await;
        let start = Instant::now();
        assert_eq!(limiter.acquire("BINANCE").await, Duration::ZERO);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unconfigured_provider_is_not_delayed() {
        let limiter = RateLimiter::new();
        assert_eq!(limiter.acquire("UNKNOWN").await, Duration::ZERO);
        assert_eq!(limiter.acquire("UNKNOWN").await, Duration::ZERO);
        assert!(limiter.spacing("UNKNOWN").is_none());
    }
}
