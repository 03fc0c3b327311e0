//! Deterministic in-memory cache for tests.
//!
//! Deadlines use the tokio clock, so tests running with a paused runtime can
//! expire entries with `tokio::time::advance`. The cache can be switched
//! offline to exercise the engine's fallback paths.

use std::{
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use super::{CacheError, CacheGateway};

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, (String, Instant)>,
    offline: AtomicBool,
    hits: AtomicUsize,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every call fails with [`CacheError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of successful `get` calls.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Read a live value without counting a hit.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.entries
            .get(key)
            .filter(|entry| entry.1 > Instant::now())
            .map(|entry| entry.0.clone())
    }

    fn ensure_online(&self) -> Result<(), CacheError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("memory cache is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheGateway for MemoryCache {
    async fn get(&self, key: &str) -> Result<String, CacheError> {
        self.ensure_online()?;
        let value = self.peek(key).ok_or(CacheError::Miss)?;
        self.hits.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.ensure_online()?;
        self.entries
            .insert(key.to_string(), (value, Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.ensure_online()?;
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = MemoryCache::new();
        cache
            .set("rate:USD", "0.013".to_string(), Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(cache.get("rate:USD").await.unwrap(), "0.013");

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(cache.get("rate:USD").await, Err(CacheError::Miss));
        assert_eq!(cache.hits(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn set_rearms_expiry() {
        let cache = MemoryCache::new();
        cache
            .set("balance:1", "1".to_string(), Duration::from_secs(10))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;
        cache
            .set("balance:1", "2".to_string(), Duration::from_secs(10))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get("balance:1").await.unwrap(), "2");
    }

    #[tokio::test]
    async fn offline_cache_reports_unavailable() {
        let cache = MemoryCache::new();
        cache.set_offline(true);
        assert!(matches!(
            cache.get("balance:1").await,
            Err(CacheError::Unavailable(_))
        ));
        assert!(cache.delete("balance:1").await.is_err());

        cache.set_offline(false);
        assert!(cache.delete("balance:1").await.is_ok());
    }
}
