use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::BillingError;
use crate::{
    config::ExchangeRateConfig,
    db::{
        DbPool,
        models::{ExchangeRate, SyncResult},
        repositories::exchange_rates::ExchangeRateRepo,
    },
    error::{AppError, AppResult},
};

/// Latest rates for one base currency, as returned by a provider.
#[derive(Debug, Clone, Deserialize)]
pub struct LatestRates {
    pub base: String,
    pub rates: HashMap<String, f64>,
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn latest(&self, base: &str) -> Result<LatestRates, BillingError>;
}

/// Frankfurter-compatible HTTP API: `GET {base_url}/latest?base=XXX`.
pub struct HttpRateProvider {
    client: Client,
    base_url: String,
}

impl HttpRateProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    async fn latest(&self, base: &str) -> Result<LatestRates, BillingError> {
        let url = format!("{}/latest", self.base_url);
        debug!(url = %url, base = %base, "Fetching exchange rates");

        let response = self
            .client
            .get(&url)
            .query(&[("base", base)])
            .send()
            .await
            .map_err(|e| BillingError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BillingError::Provider(format!(
                "rate provider returned {}",
                response.status()
            )));
        }

        response
            .json::<LatestRates>()
            .await
            .map_err(|e| BillingError::Provider(e.to_string()))
    }
}

/// Fetches rates once and upserts them. Returns the number of stored pairs.
pub async fn sync_once(
    pool: &DbPool,
    provider: &dyn RateProvider,
    base_currency: &str,
) -> AppResult<SyncResult> {
    let latest = provider.latest(base_currency).await?;
    let fetched_at = Utc::now();
    let base = latest.base.to_ascii_uppercase();

    let rows: Vec<ExchangeRate> = latest
        .rates
        .into_iter()
        .filter(|(quote, rate)| rate.is_finite() && *rate > 0.0 && !quote.eq_ignore_ascii_case(&base))
        .map(|(quote, rate)| ExchangeRate {
            base_currency: base.clone(),
            quote_currency: quote.to_ascii_uppercase(),
            rate,
            fetched_at,
        })
        .collect();

    let mut conn = pool.get()?;
    let updated = ExchangeRateRepo::upsert_many(&mut conn, &rows).map_err(AppError::from)?;

    info!(base = %base, updated, "Exchange rates synchronized");

    Ok(SyncResult {
        base_currency: base,
        updated,
        fetched_at,
    })
}

/// Periodic exchange-rate synchronization on a tokio interval.
pub struct RateSyncScheduler {
    pool: DbPool,
    provider: Arc<dyn RateProvider>,
    config: ExchangeRateConfig,
}

impl RateSyncScheduler {
    pub fn new(pool: DbPool, provider: Arc<dyn RateProvider>, config: ExchangeRateConfig) -> Self {
        Self {
            pool,
            provider,
            config,
        }
    }

    /// Runs forever; the first sync happens immediately and failures wait for
    /// the next tick.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.config.sync_interval_secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!(
            base = %self.config.base_currency,
            every_secs = self.config.sync_interval_secs,
            "Exchange rate scheduler started"
        );

        loop {
            interval.tick().await;
            if let Err(e) = sync_once(&self.pool, self.provider.as_ref(), &self.config.base_currency).await {
                error!(error = %e, "Exchange rate sync failed");
            }
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider;

    #[async_trait]
    impl RateProvider for FixedProvider {
        async fn latest(&self, base: &str) -> Result<LatestRates, BillingError> {
            Ok(LatestRates {
                base: base.to_string(),
                rates: HashMap::from([("EUR".to_string(), 0.92)]),
            })
        }
    }

    #[test]
    fn parses_frankfurter_payload() {
        let body = r#"{"amount":1.0,"base":"USD","date":"2026-10-16","rates":{"EUR":0.92,"GBP":0.79}}"#;
        let latest: LatestRates = serde_json::from_str(body).unwrap();
        assert_eq!(latest.base, "USD");
        assert_eq!(latest.rates.len(), 2);
        assert_eq!(latest.rates["GBP"], 0.79);
    }

    #[test]
    fn provider_trait_objects_are_usable() {
        let provider: Arc<dyn RateProvider> = Arc::new(FixedProvider);
        let latest = tokio_test::block_on(provider.latest("USD")).unwrap();
        assert_eq!(latest.rates["EUR"], 0.92);
    }
}
