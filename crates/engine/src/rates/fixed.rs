use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::{EngineError, ResultEngine};

use super::{RateSource, RateTable};

/// Rate source serving a fixed table; counts fetches so tests can assert
/// caching behavior.
#[derive(Debug, Default)]
pub struct StaticRates {
    table: RateTable,
    fetches: AtomicUsize,
    offline: AtomicBool,
}

impl StaticRates {
    pub fn new<'a>(rates: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self {
            table: rates
                .into_iter()
                .map(|(code, rate)| (code.to_ascii_uppercase(), rate))
                .collect(),
            ..Self::default()
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// While offline every fetch fails as an unreachable source would.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl RateSource for StaticRates {
    async fn fetch_rates(&self) -> ResultEngine<RateTable> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(EngineError::RateUnavailable(
                "rate source is offline".to_string(),
            ));
        }
        Ok(self.table.clone())
    }
}
