//! Cache gateway: a best-effort, TTL-bounded key/value store.
//!
//! The cache is never a source of truth. Every read path tolerates a miss or
//! an unavailable backend by falling back to the ledger (or the rate source),
//! and every write path that changes a cached quantity deletes the key.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryCache;
pub use moka_cache::MokaCache;

mod memory;
mod moka_cache;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The key is absent or its TTL elapsed.
    #[error("cache miss")]
    Miss,
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

/// Keys the engine stores in the cache.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CacheKey<'a> {
    Balance(i64),
    Rate(&'a str),
}

impl fmt::Display for CacheKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Balance(user_id) => write!(f, "balance:{user_id}"),
            CacheKey::Rate(code) => write!(f, "rate:{code}"),
        }
    }
}

#[async_trait]
pub trait CacheGateway: Send + Sync {
    /// Fails with [`CacheError::Miss`] when the key is absent or expired.
    async fn get(&self, key: &str) -> Result<String, CacheError>;

    /// Overwrites the value and re-arms its expiry.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Idempotent: deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
