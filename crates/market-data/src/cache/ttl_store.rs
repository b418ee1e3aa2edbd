//! TTL-bounded key/value store over `moka`.
//!
//! `moka` bounds capacity and evicts in the background; freshness is decided
//! here, on every read, against the entry's own insertion time. Time comes
//! from `tokio::time::Instant`, so paused-clock tests can step past a TTL.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::time::Instant;

/// A cached payload and when it was stored.
#[derive(Debug)]
pub struct CacheEntry<K, V> {
    pub key: K,
    pub payload: V,
    pub inserted_at: Instant,
}

impl<K, V> CacheEntry<K, V> {
    pub fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) < ttl
    }
}

/// A single TTL store.
pub struct TtlStore<K, V> {
    entries: Cache<K, Arc<CacheEntry<K, V>>>,
    ttl: Duration,
}

impl<K, V> TtlStore<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration, capacity: u64) -> Self {
        let mut builder = Cache::builder().max_capacity(capacity);
        if !ttl.is_zero() {
            builder = builder.time_to_live(ttl);
        }
        Self {
            entries: builder.build(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh payload for `key`. A stale entry is evicted and reported absent.
    pub async fn get(&self, key: &K) -> Option<V> {
        let entry = self.entries.get(key).await?;
        if entry.is_fresh(self.ttl, Instant::now()) {
            Some(entry.payload.clone())
        } else {
            self.entries.invalidate(key).await;
            None
        }
    }

    /// Store `payload`, replacing any previous entry.
    pub async fn set(&self, key: K, payload: V) {
        let entry = Arc::new(CacheEntry {
            key: key.clone(),
            payload,
            inserted_at: Instant::now(),
        });
        self.entries.insert(key, entry).await;
    }

    pub async fn invalidate(&self, key: &K) {
        self.entries.invalidate(key).await;
    }

    /// Drop every stale entry. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let stale: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_fresh(self.ttl, now))
            .map(|(_, entry)| entry.key.clone())
            .collect();

        for key in &stale {
            self.entries.invalidate(key).await;
        }
        self.entries.run_pending_tasks().await;
        stale.len()
    }

    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fresh_entry_is_returned() {
        let store: TtlStore<String, u32> = TtlStore::new(Duration::from_secs(10), 100);
        store.set("a".to_string(), 1).await;

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(store.get(&"a".to_string()).await, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_at_ttl() {
        let store: TtlStore<String, u32> = TtlStore::new(Duration::from_secs(10), 100);
        store.set("a".to_string(), 1).await;

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(store.get(&"a".to_string()).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_overwrites_and_refreshes() {
        let store: TtlStore<String, u32> = TtlStore::new(Duration::from_secs(10), 100);
        store.set("a".to_string(), 1).await;
        tokio::time::advance(Duration::from_secs(8)).await;
        store.set("a".to_string(), 2).await;
        tokio::time::advance(Duration::from_secs(8)).await;

        assert_eq!(store.get(&"a".to_string()).await, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let store: TtlStore<String, u32> = TtlStore::new(Duration::from_secs(10), 100);
        store.set("old".to_string(), 1).await;
        tokio::time::advance(Duration::from_secs(6)).await;
        store.set("new".to_string(), 2).await;
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(store.purge_expired().await, 1);
        assert_eq!(store.get(&"new".to_string()).await, Some(2));
    }

    #[tokio::test]
    async fn test_zero_ttl_never_hits() {
        let store: TtlStore<String, u32> = TtlStore::new(Duration::ZERO, 100);
        store.set("a".to_string(), 1).await;
        assert_eq!(store.get(&"a".to_string()).await, None);
    }
}
