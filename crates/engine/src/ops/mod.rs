use std::{sync::Arc, time::Duration};

use crate::{
    EngineError, ResultEngine,
    cache::{CacheGateway, CacheKey},
    ledger::LedgerStore,
    rates::{RateResolver, RateSource},
};

mod balances;
mod history;

pub use balances::BalanceView;
pub use history::HistoryPage;

pub const DEFAULT_BALANCE_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_RATE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;

/// Balance engine: validates requests, keeps the cache coherent with the
/// ledger and converts balances for display.
///
/// The engine holds no lock of its own; ordering between concurrent
/// mutations is the ledger store's job.
pub struct Engine {
    ledger: Arc<dyn LedgerStore>,
    cache: Arc<dyn CacheGateway>,
    rates: RateResolver,
    balance_ttl: Duration,
    max_conflict_retries: u32,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Best-effort delete of a cached balance.
    async fn invalidate_balance(&self, user_id: i64) {
        let key = CacheKey::Balance(user_id).to_string();
        if let Err(err) = self.cache.delete(&key).await {
            tracing::warn!("failed to invalidate {key}: {err}");
        }
    }

    /// Run `attempt` again while it fails with a serialization conflict, at
    /// most `max_conflict_retries` extra times.
    async fn retry_conflicts<T, F, Fut>(&self, op: &str, mut attempt: F) -> ResultEngine<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ResultEngine<T>>,
    {
        let mut retries = 0;
        loop {
            match attempt().await {
                Err(err) if err.is_retryable() && retries < self.max_conflict_retries => {
                    retries += 1;
                    tracing::debug!(
                        "{op} conflicted, retry {retries}/{}: {err}",
                        self.max_conflict_retries
                    );
                }
                Err(err) if err.is_retryable() => {
                    tracing::warn!("{op} still conflicting after {retries} retries: {err}");
                    return Err(err);
                }
                result => return result,
            }
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("rates", &self.rates)
            .field("balance_ttl", &self.balance_ttl)
            .field("max_conflict_retries", &self.max_conflict_retries)
            .finish_non_exhaustive()
    }
}

fn ensure_user_id(user_id: i64) -> ResultEngine<()> {
    if user_id < 0 {
        return Err(EngineError::InvalidOperation(format!(
            "user id must be non-negative, got {user_id}"
        )));
    }
    Ok(())
}

/// The builder for `Engine`
pub struct EngineBuilder {
    ledger: Option<Arc<dyn LedgerStore>>,
    cache: Option<Arc<dyn CacheGateway>>,
    rates: Option<Arc<dyn RateSource>>,
    balance_ttl: Duration,
    rate_ttl: Duration,
    max_conflict_retries: u32,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            ledger: None,
            cache: None,
            rates: None,
            balance_ttl: DEFAULT_BALANCE_TTL,
            rate_ttl: DEFAULT_RATE_TTL,
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }
}

impl EngineBuilder {
    /// Pass the required ledger store
    pub fn ledger(mut self, ledger: Arc<dyn LedgerStore>) -> EngineBuilder {
        self.ledger = Some(ledger);
        self
    }

    /// Pass the required cache
    pub fn cache(mut self, cache: Arc<dyn CacheGateway>) -> EngineBuilder {
        self.cache = Some(cache);
        self
    }

    /// Pass the required rate source
    pub fn rates(mut self, rates: Arc<dyn RateSource>) -> EngineBuilder {
        self.rates = Some(rates);
        self
    }

    pub fn balance_ttl(mut self, ttl: Duration) -> EngineBuilder {
        self.balance_ttl = ttl;
        self
    }

    /// Upper bound for a cached rate; rates never outlive the UTC day anyway.
    pub fn rate_ttl(mut self, ttl: Duration) -> EngineBuilder {
        self.rate_ttl = ttl;
        self
    }

    pub fn max_conflict_retries(mut self, retries: u32) -> EngineBuilder {
        self.max_conflict_retries = retries;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let ledger = self
            .ledger
            .ok_or_else(|| EngineError::InvalidOperation("missing ledger store".to_string()))?;
        let cache = self
            .cache
            .ok_or_else(|| EngineError::InvalidOperation("missing cache".to_string()))?;
        let source = self
            .rates
            .ok_or_else(|| EngineError::InvalidOperation("missing rate source".to_string()))?;

        Ok(Engine {
            ledger,
            rates: RateResolver::new(cache.clone(), source, self.rate_ttl),
            cache,
            balance_ttl: self.balance_ttl,
            max_conflict_retries: self.max_conflict_retries,
        })
    }
}
