//! Time-bounded query cache with lazy eviction
//!
//! Entries expire by TTL but are not proactively removed: an expired entry
//! reads as a miss and stays resident until a sweep runs. A sweep runs
//! after any insert that leaves the store above its entry bound, and only
//! reclaims expired entries. Unexpired entries are never evicted, so the
//! store is bounded by expiry pressure, not by a hard cap; see the design
//! notes before "fixing" this with an LRU.
//!
//! Owned by the service instance and shared across request tasks;
//! constructed once at startup, contents are disposable on shutdown.

use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

struct CacheEntry {
    payload: Value,
    expires_at: Instant,
}

pub struct QueryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    max_entries: usize,
}

impl QueryCache {
    pub const DEFAULT_MAX_ENTRIES: usize = 1000;

    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries,
        }
    }

    /// Cache key convention: lowercase-normalized query text namespaced by
    /// provider, so distinct providers never collide.
    pub fn cache_key(provider: &str, query: &str) -> String {
        format!("{}:{}", provider, query.trim().to_lowercase())
    }

    /// A hit requires the entry to exist *and* be unexpired. Expired
    /// entries are left in place (lazy expiry).
    pub async fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.lock().await;
        let entry = entries.get(key)?;
        if Instant::now() < entry.expires_at {
            Some(entry.payload.clone())
        } else {
            None
        }
    }

    /// Insert or overwrite unconditionally, then sweep expired entries if
    /// the store has grown past its bound.
    pub async fn set(&self, key: String, payload: Value, ttl: Duration) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key,
            CacheEntry {
                payload,
                expires_at: Instant::now() + ttl,
            },
        );

        if entries.len() > self.max_entries {
            let now = Instant::now();
            let before = entries.len();
            entries.retain(|_, entry| entry.expires_at >= now);
            tracing::debug!(
                swept = before - entries.len(),
                remaining = entries.len(),
                "Query cache sweep"
            );
        }
    }

    /// Number of resident entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache = QueryCache::new(QueryCache::DEFAULT_MAX_ENTRIES);
        let key = QueryCache::cache_key("geoapify", "Lisbon");

        assert!(cache.get(&key).await.is_none());
        cache.set(key.clone(), json!({"features": []}), TTL).await;
        assert_eq!(cache.get(&key).await.unwrap(), json!({"features": []}));
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss_but_stays_resident() {
        let cache = QueryCache::new(QueryCache::DEFAULT_MAX_ENTRIES);
        let key = QueryCache::cache_key("geoapify", "Lisbon");

        cache
            .set(key.clone(), json!({"features": []}), Duration::ZERO)
            .await;
        // Expired: reads as a miss...
        assert!(cache.get(&key).await.is_none());
        // ...but no sweep has run, so the entry is still resident.
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_wholesale() {
        let cache = QueryCache::new(QueryCache::DEFAULT_MAX_ENTRIES);
        let key = QueryCache::cache_key("geoapify", "Lisbon");

        cache.set(key.clone(), json!({"v": 1}), TTL).await;
        cache.set(key.clone(), json!({"v": 2}), TTL).await;
        assert_eq!(cache.get(&key).await.unwrap(), json!({"v": 2}));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_sweep_reclaims_expired_and_retains_live_entries() {
        let cache = QueryCache::new(QueryCache::DEFAULT_MAX_ENTRIES);

        // E1 is live and must survive the sweep.
        cache
            .set("geoapify:e1".to_string(), json!({"keep": true}), TTL)
            .await;

        // 1000 distinct, already-expired entries. The insert that pushes
        // the store past the bound triggers the sweep.
        for i in 0..1000 {
            cache
                .set(format!("geoapify:expired-{}", i), json!(i), Duration::ZERO)
                .await;
        }

        assert_eq!(cache.len().await, 1);
        assert_eq!(
            cache.get("geoapify:e1").await.unwrap(),
            json!({"keep": true})
        );
    }

    #[tokio::test]
    async fn test_sweep_never_evicts_live_entries_past_the_bound() {
        // All-live store above the bound: sweep runs but reclaims nothing.
        let cache = QueryCache::new(10);
        for i in 0..20 {
            cache.set(format!("geoapify:q{}", i), json!(i), TTL).await;
        }
        assert_eq!(cache.len().await, 20);
    }

    #[test]
    fn test_cache_key_normalization() {
        assert_eq!(
            QueryCache::cache_key("geoapify", "  LiSbOn  "),
            "geoapify:lisbon"
        );
        // Distinct providers never collide on the same text.
        assert_ne!(
            QueryCache::cache_key("geoapify", "lisbon"),
            QueryCache::cache_key("other", "lisbon")
        );
    }
}
