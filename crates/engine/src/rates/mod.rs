//! Currency rates used to display a balance in another currency.
//!
//! Rates are looked up in the cache first. On a miss the whole table is
//! fetched from the [`RateSource`], the requested rate is extracted and cached
//! until the end of the current UTC day at the latest, so no rate survives a
//! midnight boundary.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    Currency, EngineError, ResultEngine,
    cache::{CacheError, CacheGateway, CacheKey},
};

pub use fixed::StaticRates;
pub use http::HttpRateSource;

mod fixed;
mod http;

/// Rates keyed by upper case currency code, relative to the base currency.
pub type RateTable = HashMap<String, f64>;

#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetch the full rate table. Fails with [`EngineError::RateUnavailable`].
    async fn fetch_rates(&self) -> ResultEngine<RateTable>;
}

/// Time a rate fetched at `now` may be cached: at most `max`, and never past
/// the next UTC midnight.
pub fn ttl_for_today(now: DateTime<Utc>, max: Duration) -> Duration {
    let Some(midnight) = now
        .date_naive()
        .succ_opt()
        .and_then(|tomorrow| tomorrow.and_hms_opt(0, 0, 0))
    else {
        return Duration::ZERO;
    };
    let remaining = (midnight.and_utc() - now)
        .to_std()
        .unwrap_or(Duration::ZERO);
    remaining.min(max)
}

fn usable(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

pub struct RateResolver {
    cache: Arc<dyn CacheGateway>,
    source: Arc<dyn RateSource>,
    max_ttl: Duration,
}

impl RateResolver {
    pub fn new(
        cache: Arc<dyn CacheGateway>,
        source: Arc<dyn RateSource>,
        max_ttl: Duration,
    ) -> Self {
        Self {
            cache,
            source,
            max_ttl,
        }
    }

    /// Multiplier converting a base currency amount into `currency`.
    pub async fn resolve(&self, currency: &Currency) -> ResultEngine<f64> {
        if currency.is_base() {
            return Ok(1.0);
        }

        let key = CacheKey::Rate(currency.code()).to_string();
        match self.cache.get(&key).await {
            Ok(raw) => match raw.parse::<f64>() {
                Ok(rate) if usable(rate) => {
                    tracing::debug!("rate cache hit {key}");
                    return Ok(rate);
                }
                _ => tracing::warn!("ignoring malformed cached rate {key}: {raw:?}"),
            },
            Err(CacheError::Miss) => tracing::debug!("rate cache miss {key}"),
            Err(err) => tracing::warn!("rate cache lookup for {key} failed: {err}"),
        }

        let table = self.source.fetch_rates().await?;
        let rate = table
            .get(currency.code())
            .copied()
            .filter(|rate| usable(*rate))
            .ok_or_else(|| EngineError::RateUnavailable(format!("no rate for {currency}")))?;

        let ttl = ttl_for_today(Utc::now(), self.max_ttl);
        if !ttl.is_zero()
            && let Err(err) = self.cache.set(&key, rate.to_string(), ttl).await
        {
            tracing::warn!("failed to cache {key}: {err}");
        }
        Ok(rate)
    }
}

impl std::fmt::Debug for RateResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateResolver")
            .field("max_ttl", &self.max_ttl)
            .finish_non_exhaustive()
    }
}
