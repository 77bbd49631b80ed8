// Namespaced in-process cache with TTL, a capacity bound and a periodic
// cleanup sweep. Constructed explicitly and injected through AppState so
// tests can substitute a fresh instance per run.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::utils::error_handler::ApiError;

/// Capacity bound on the number of live entries.
pub const MAX_ENTRIES: usize = 1000;

/// Default entry lifetime: 30 days.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Expired-entry sweep interval: 24 hours.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Key partitions. The namespace is part of the storage key, not the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    Product,
    User,
    Order,
    RateLimit,
}

impl CacheNamespace {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheNamespace::Product => "product",
            CacheNamespace::User => "user",
            CacheNamespace::Order => "order",
            CacheNamespace::RateLimit => "rate-limit",
        }
    }
}

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

/// Shared in-process cache. Cloning shares the underlying store.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn storage_key(namespace: CacheNamespace, key: &str) -> String {
        format!("{}:{}", namespace, key)
    }

    /// Stores a value. Rejects empty keys and JSON null values; refuses new
    /// keys once the capacity bound is reached (expired entries are purged
    /// first).
    pub async fn set(
        &self,
        namespace: CacheNamespace,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> Result<(), ApiError> {
        if key.trim().is_empty() {
            return Err(ApiError::bad_request("Cache key must be a non-empty string."));
        }
        if value.is_null() {
            return Err(ApiError::bad_request("Cache value must not be null."));
        }

        let storage_key: String = Self::storage_key(namespace, key);
        let mut entries = self.entries.write().await;

        if !entries.contains_key(&storage_key) && entries.len() >= MAX_ENTRIES {
            let now: Instant = Instant::now();
            entries.retain(|_, entry| entry.expires_at > now);

            if entries.len() >= MAX_ENTRIES {
                return Err(ApiError::database("Cache capacity exceeded."));
            }
        }

        let expires_at: Instant = Instant::now() + ttl.unwrap_or(DEFAULT_TTL);
        entries.insert(storage_key, CacheEntry { value, expires_at });
        Ok(())
    }

    /// Fetches a value; expired entries are treated as absent and removed.
    pub async fn get(&self, namespace: CacheNamespace, key: &str) -> Option<Value> {
        let storage_key: String = Self::storage_key(namespace, key);
        let mut entries = self.entries.write().await;

        match entries.get(&storage_key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(&storage_key);
                None
            }
            None => None,
        }
    }

    /// Removes a value; returns whether an entry existed.
    pub async fn delete(&self, namespace: CacheNamespace, key: &str) -> bool {
        let storage_key: String = Self::storage_key(namespace, key);
        self.entries.write().await.remove(&storage_key).is_some()
    }

    /// Fixed-window counter used by rate limiting: the first hit in a window
    /// sets the expiry, later hits increment without extending it.
    pub async fn incr(&self, namespace: CacheNamespace, key: &str, window: Duration) -> u64 {
        let storage_key: String = Self::storage_key(namespace, key);
        let mut entries = self.entries.write().await;
        let now: Instant = Instant::now();

        if let Some(entry) = entries.get_mut(&storage_key) {
            if entry.expires_at > now {
                let count: u64 = entry.value.as_u64().unwrap_or(0) + 1;
                entry.value = Value::from(count);
                return count;
            }
        }

        entries.insert(
            storage_key,
            CacheEntry {
                value: Value::from(1u64),
                expires_at: now + window,
            },
        );
        1
    }

    /// Number of stored entries, expired ones included until the next sweep.
    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Spawns the background sweep that purges expired entries.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let entries: Arc<RwLock<HashMap<String, CacheEntry>>> = Arc::clone(&self.entries);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            interval.tick().await; // first tick fires immediately

            loop {
                interval.tick().await;

                let now: Instant = Instant::now();
                let mut map = entries.write().await;
                let before: usize = map.len();
                map.retain(|_, entry| entry.expires_at > now);

                debug!(removed = before - map.len(), remaining = map.len(), "cache sweep complete");
            }
        })
    }

    /// Logs a shutdown marker; entries are process-local and simply dropped.
    pub fn shutdown(&self) {
        info!("Memory cache shutdown");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_then_get_round_trips_within_a_namespace() {
        let cache: MemoryCache = MemoryCache::new();
        cache
            .set(CacheNamespace::Product, "widget", json!({"price": 9.5}), None)
            .await
            .unwrap();

        assert_eq!(
            cache.get(CacheNamespace::Product, "widget").await,
            Some(json!({"price": 9.5}))
        );
        // Same key in another namespace is a different entry.
        assert_eq!(cache.get(CacheNamespace::Order, "widget").await, None);
    }

    #[tokio::test]
    async fn rejects_null_values_and_empty_keys() {
        let cache: MemoryCache = MemoryCache::new();

        let err: ApiError = cache
            .set(CacheNamespace::User, "u1", Value::Null, None)
            .await
            .unwrap_err();
        assert_eq!(err.message, "Cache value must not be null.");

        let err: ApiError = cache
            .set(CacheNamespace::User, "  ", json!(1), None)
            .await
            .unwrap_err();
        assert_eq!(err.message, "Cache key must be a non-empty string.");
    }

    #[tokio::test]
    async fn expired_entries_read_as_absent() {
        let cache: MemoryCache = MemoryCache::new();
        cache
            .set(CacheNamespace::User, "ephemeral", json!(1), Some(Duration::from_millis(10)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.get(CacheNamespace::User, "ephemeral").await, None);
        // The expired read also removed the entry.
        assert_eq!(cache.entry_count().await, 0);
    }

    #[tokio::test]
    async fn refuses_new_keys_once_full() {
        let cache: MemoryCache = MemoryCache::new();
        for i in 0..MAX_ENTRIES {
            cache
                .set(CacheNamespace::Product, &format!("p{}", i), json!(i), None)
                .await
                .unwrap();
        }

        let err: ApiError = cache
            .set(CacheNamespace::Product, "one-too-many", json!(0), None)
            .await
            .unwrap_err();
        assert_eq!(err.message, "Cache capacity exceeded.");

        // Overwriting an existing key is still allowed.
        assert!(cache.set(CacheNamespace::Product, "p0", json!("new"), None).await.is_ok());
    }

    #[tokio::test]
    async fn full_cache_accepts_new_keys_after_expiries() {
        let cache: MemoryCache = MemoryCache::new();
        cache
            .set(CacheNamespace::User, "short", json!(1), Some(Duration::from_millis(5)))
            .await
            .unwrap();
        for i in 0..MAX_ENTRIES - 1 {
            cache
                .set(CacheNamespace::Product, &format!("p{}", i), json!(i), None)
                .await
                .unwrap();
        }

        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(cache.set(CacheNamespace::Order, "fresh", json!(1), None).await.is_ok());
    }

    #[tokio::test]
    async fn incr_counts_within_a_fixed_window() {
        let cache: MemoryCache = MemoryCache::new();

        assert_eq!(cache.incr(CacheNamespace::RateLimit, "auth:ip", Duration::from_secs(60)).await, 1);
        assert_eq!(cache.incr(CacheNamespace::RateLimit, "auth:ip", Duration::from_secs(60)).await, 2);
        assert_eq!(cache.incr(CacheNamespace::RateLimit, "auth:ip", Duration::from_secs(60)).await, 3);
    }

    #[tokio::test]
    async fn incr_resets_after_the_window_elapses() {
        let cache: MemoryCache = MemoryCache::new();
        let window: Duration = Duration::from_millis(10);

        assert_eq!(cache.incr(CacheNamespace::RateLimit, "k", window).await, 1);
        assert_eq!(cache.incr(CacheNamespace::RateLimit, "k", window).await, 2);

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.incr(CacheNamespace::RateLimit, "k", window).await, 1);
    }

    #[tokio::test]
    async fn delete_reports_whether_an_entry_existed() {
        let cache: MemoryCache = MemoryCache::new();
        cache.set(CacheNamespace::Order, "o1", json!(1), None).await.unwrap();

        assert!(cache.delete(CacheNamespace::Order, "o1").await);
        assert!(!cache.delete(CacheNamespace::Order, "o1").await);
    }
}
