//! Conversion of stored amounts into the reporting currency.
//!
//! Rates are looked up in a process-wide cache, then in the `exchange_rates`
//! table, and only then fetched from the remote [`RateSource`]. Fetched rates
//! are written back to both.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;
use tokio::sync::Mutex;

use cashtrack_core::REPORTING_CURRENCY;
use cashtrack_storage::{self as storage, DbPool};

use crate::config::RatesConfig;

#[derive(Debug, Error)]
pub enum RateError {
    #[error("Rate request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Rate request for {base} on {date} failed: {status}")]
    Status {
        base: String,
        date: NaiveDate,
        status: reqwest::StatusCode,
    },
    #[error("Missing CHF rate for {base} on {date}")]
    MissingRate { base: String, date: NaiveDate },
    #[error("Invalid rate {value:?} for {base} on {date}")]
    InvalidRate {
        base: String,
        date: NaiveDate,
        value: String,
    },
}

/// Where rates come from when neither the cache nor the database has them.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Rate converting one unit of `base` into the reporting currency on `date`.
    async fn fetch_rate(&self, base: &str, date: NaiveDate) -> Result<Decimal, RateError>;
}

/// Historical rates from an exchangerate.host compatible API.
pub struct ExchangeRateHost {
    client: reqwest::Client,
    base_url: String,
    access_key: Option<String>,
}

impl ExchangeRateHost {
    pub fn new(config: &RatesConfig) -> Result<Self, RateError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_key: config.access_key.clone(),
        })
    }

    /// `GET {base_url}/{date}?base=..&symbols=CHF[&access_key=..]`
    fn build_request(&self, base: &str, date: NaiveDate) -> Result<reqwest::Request, RateError> {
        let url = format!("{}/{}", self.base_url, date.format("%Y-%m-%d"));
        let mut request = self
            .client
            .get(&url)
            .query(&[("base", base), ("symbols", REPORTING_CURRENCY)]);
        if let Some(key) = &self.access_key {
            request = request.query(&[("access_key", key.as_str())]);
        }
        Ok(request.build()?)
    }
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(default)]
    rates: HashMap<String, serde_json::Number>,
}

impl RatesResponse {
    fn reporting_rate(&self, base: &str, date: NaiveDate) -> Result<Decimal, RateError> {
        let number = self
            .rates
            .get(REPORTING_CURRENCY)
            .ok_or_else(|| RateError::MissingRate {
                base: base.to_string(),
                date,
            })?;
        let text = number.to_string();
        let rate = Decimal::from_str(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .map_err(|_| RateError::InvalidRate {
                base: base.to_string(),
                date,
                value: text.clone(),
            })?;
        if rate <= Decimal::ZERO {
            return Err(RateError::MissingRate {
                base: base.to_string(),
                date,
            });
        }
        Ok(rate)
    }
}

#[async_trait]
impl RateSource for ExchangeRateHost {
    async fn fetch_rate(&self, base: &str, date: NaiveDate) -> Result<Decimal, RateError> {
        let request = self.build_request(base, date)?;
        let response = self.client.execute(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RateError::Status {
                base: base.to_string(),
                date,
                status,
            });
        }
        let body: RatesResponse = response.json().await?;
        body.reporting_rate(base, date)
    }
}

pub struct CurrencyConverter<S> {
    pool: DbPool,
    source: S,
    cache: Mutex<HashMap<(String, NaiveDate), Decimal>>,
}

impl<S: RateSource> CurrencyConverter<S> {
    pub fn new(pool: DbPool, source: S) -> Self {
        Self {
            pool,
            source,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Rate for one unit of `currency` in the reporting currency on `date`.
    ///
    /// The reporting currency itself and a blank currency convert at 1. Each
    /// call makes at most one request to the rate source.
    pub async fn rate_to_reporting(
        &self,
        currency: &str,
        date: NaiveDate,
    ) -> Result<Decimal, RateError> {
        let base = currency.trim().to_uppercase();
        if base.is_empty() || base == REPORTING_CURRENCY {
            return Ok(Decimal::ONE);
        }
        let key = (base, date);

        let cached = self.cache.lock().await.get(&key).copied();
        if let Some(rate) = cached {
            return Ok(rate);
        }
        let base = key.0.as_str();

        match storage::get_exchange_rate(&self.pool, date, base, REPORTING_CURRENCY).await {
            Ok(Some(rate)) if rate > Decimal::ZERO => {
                self.cache.lock().await.insert(key.clone(), rate);
                return Ok(rate);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(currency = base, %date, "Stored rate lookup failed: {e}");
            }
        }

        let rate = self.source.fetch_rate(base, date).await?;
        tracing::debug!(currency = base, %date, %rate, "fetched exchange rate");

        let stored =
            storage::upsert_exchange_rate(&self.pool, date, base, REPORTING_CURRENCY, rate).await;
        if let Err(e) = stored {
            tracing::warn!(currency = base, %date, "Failed to store exchange rate: {e}");
        }
        self.cache.lock().await.insert(key.clone(), rate);
        Ok(rate)
    }

    /// `amount` in `currency` expressed in the reporting currency, unrounded.
    pub async fn convert(
        &self,
        amount: Decimal,
        currency: &str,
        date: NaiveDate,
    ) -> Result<Decimal, RateError> {
        let rate = self.rate_to_reporting(currency, date).await?;
        Ok(amount * rate)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed rate and counts how often it was asked.
    pub struct CountingSource {
        pub rate: Decimal,
        pub calls: AtomicUsize,
    }

    impl CountingSource {
        pub fn new(rate: Decimal) -> Self {
            Self {
                rate,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateSource for CountingSource {
        async fn fetch_rate(&self, _base: &str, _date: NaiveDate) -> Result<Decimal, RateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.rate)
        }
    }

    /// Always fails, as an unreachable rate API would.
    pub struct FailingSource;

    #[async_trait]
    impl RateSource for FailingSource {
        async fn fetch_rate(&self, base: &str, date: NaiveDate) -> Result<Decimal, RateError> {
            Err(RateError::MissingRate {
                base: base.to_string(),
                date,
            })
        }
    }
}
