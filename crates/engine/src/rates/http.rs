//! Rate source reached over HTTP.
//!
//! The endpoint answers `GET <url>` with a JSON table such as
//! `{"base": "RUB", "date": "2009-11-17", "rates": {"USD": 0.0345, ...}}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{BASE_CURRENCY, EngineError, ResultEngine};

use super::{RateSource, RateTable};

#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(default)]
    base: Option<String>,
    rates: RateTable,
}

#[derive(Clone, Debug)]
pub struct HttpRateSource {
    client: Client,
    url: String,
}

impl HttpRateSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> ResultEngine<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| EngineError::RateUnavailable(format!("http client: {err}")))?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    async fn fetch_rates(&self) -> ResultEngine<RateTable> {
        tracing::debug!("fetching rates from {}", self.url);
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|err| EngineError::RateUnavailable(format!("network error: {err}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(EngineError::RateUnavailable(format!(
                "rate source answered {status}"
            )));
        }

        let body: RatesResponse = resp
            .json()
            .await
            .map_err(|err| EngineError::RateUnavailable(format!("invalid rate table: {err}")))?;
        if let Some(base) = body.base
            && !base.eq_ignore_ascii_case(BASE_CURRENCY)
        {
            return Err(EngineError::RateUnavailable(format!(
                "rate table is based on {base}, expected {BASE_CURRENCY}"
            )));
        }

        Ok(body
            .rates
            .into_iter()
            .map(|(code, rate)| (code.to_ascii_uppercase(), rate))
            .collect())
    }
}
