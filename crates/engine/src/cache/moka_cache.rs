//! In-process cache backed by `moka`, with a TTL chosen per entry.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::{Expiry, future::Cache};

use super::{CacheError, CacheGateway};

#[derive(Clone, Debug)]
struct Entry {
    value: String,
    ttl: Duration,
}

/// Each entry expires after the TTL it was last written with.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// Production cache gateway shared by every request of the process.
#[derive(Clone)]
pub struct MokaCache {
    inner: Cache<String, Entry>,
}

impl MokaCache {
    /// Create a cache holding at most `capacity` entries.
    pub fn new(capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(capacity)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl std::fmt::Debug for MokaCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaCache")
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

#[async_trait]
impl CacheGateway for MokaCache {
    async fn get(&self, key: &str) -> Result<String, CacheError> {
        let entry = self.inner.get(key).await.ok_or(CacheError::Miss)?;
        tracing::trace!("cache get {key}: {}", entry.value);
        Ok(entry.value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        tracing::trace!("cache set {key}: {value} (ttl {}s)", ttl.as_secs());
        self.inner.insert(key.to_string(), Entry { value, ttl }).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.inner.invalidate(key).await;
        Ok(())
    }
}
