//! Birdeye market-data client.
//!
//! Wraps the overview, volume-series, recent-trades and price endpoints.
//! Rate-limit and server-side statuses are retried with bounded exponential
//! backoff; 401/403 surfaces as a typed auth/plan error that is never
//! retried, so overview callers can fall back to the coarser price endpoint.

use crate::config::AppConfig;
use crate::error::SourceError;
use crate::pipeline::{OverviewData, TradeStats, VolumeSeries};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::{debug, instrument, warn};

const PROVIDER: &str = "birdeye";
const RETRY_BASE_DELAY_MS: u64 = 500;
const RETRY_MAX_DELAY: Duration = Duration::from_secs(4);

/// Interval and depth of the short-window volume series.
const VOLUME_INTERVAL: &str = "5m";
const VOLUME_POINT_LIMIT: u32 = 12;
const RECENT_TRADES_LIMIT: u32 = 100;

/// Client for the market-data provider.
#[derive(Debug, Clone)]
pub struct BirdeyeClient {
    http_client: Client,
    base_url: String,
    api_key: String,
    chain: String,
    dry_run: bool,
    max_retries: usize,
}

/// Reduced payload of the price endpoint, used as the overview fallback.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct PriceData {
    liquidity: Option<f64>,
}

impl BirdeyeClient {
    pub fn new(http_client: Client, config: &AppConfig) -> Self {
        Self {
            http_client,
            base_url: config.birdeye_base_url.clone(),
            api_key: config.birdeye_api_key.clone(),
            chain: config.chain.clone(),
            dry_run: config.birdeye_dry_run,
            max_retries: config.http_max_retries,
        }
    }

    /// Liquidity, valuation and daily volume for one token.
    #[instrument(skip(self), fields(mint = %address))]
    pub async fn token_overview(&self, address: &str) -> Result<OverviewData, SourceError> {
        if self.dry_run {
            return Ok(OverviewData::default());
        }
        let data = self
            .get_data(
                "/defi/token_overview",
                &[("address", address), ("chain", self.chain.as_str())],
            )
            .await?;
        Ok(parse_data(data))
    }

    /// Overview with the auth/plan fallback: when the full overview is not
    /// available on the configured plan, the price endpoint supplies at
    /// least liquidity. Returns the data plus whether the fallback was used.
    #[instrument(skip(self), fields(mint = %address))]
    pub async fn overview_with_fallback(
        &self,
        address: &str,
    ) -> Result<(OverviewData, bool), SourceError> {
        match self.token_overview(address).await {
            Ok(overview) => Ok((overview, false)),
            Err(e) if e.is_auth_or_plan() => {
                warn!("overview unavailable on this plan, using price fallback: {}", e);
                let price = self.price(address).await?;
                let overview = OverviewData {
                    liquidity: price.liquidity,
                    ..OverviewData::default()
                };
                Ok((overview, true))
            }
            Err(e) => Err(e),
        }
    }

    /// Ordered short-interval volume points, oldest first.
    #[instrument(skip(self), fields(mint = %address))]
    pub async fn volume_points(&self, address: &str) -> Result<VolumeSeries, SourceError> {
        if self.dry_run {
            return Ok(VolumeSeries::default());
        }
        let limit = VOLUME_POINT_LIMIT.to_string();
        let data = self
            .get_data(
                "/defi/history/market-trades",
                &[
                    ("address", address),
                    ("chain", self.chain.as_str()),
                    ("type", VOLUME_INTERVAL),
                    ("limit", limit.as_str()),
                ],
            )
            .await?;
        Ok(parse_data(data))
    }

    /// Buyer/seller and buy/sell aggregates over the recent-trades window.
    #[instrument(skip(self), fields(mint = %address))]
    pub async fn recent_trades(&self, address: &str) -> Result<TradeStats, SourceError> {
        if self.dry_run {
            return Ok(TradeStats::default());
        }
        let limit = RECENT_TRADES_LIMIT.to_string();
        let data = self
            .get_data(
                "/defi/token_trades_recent",
                &[
                    ("address", address),
                    ("chain", self.chain.as_str()),
                    ("limit", limit.as_str()),
                ],
            )
            .await?;
        Ok(parse_data(data))
    }

    async fn price(&self, address: &str) -> Result<PriceData, SourceError> {
        if self.dry_run {
            return Ok(PriceData::default());
        }
        let data = self
            .get_data(
                "/defi/price",
                &[
                    ("address", address),
                    ("chain", self.chain.as_str()),
                    ("include_liquidity", "true"),
                ],
            )
            .await?;
        Ok(parse_data(data))
    }

    /// One GET with bounded backoff on the retriable status class. Other
    /// failures surface immediately.
    async fn get_data(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, SourceError> {
        let retry_strategy = ExponentialBackoff::from_millis(RETRY_BASE_DELAY_MS)
            .max_delay(RETRY_MAX_DELAY)
            .map(jitter)
            .take(self.max_retries.saturating_sub(1));

        RetryIf::spawn(
            retry_strategy,
            || self.get_data_once(path, query),
            SourceError::is_retriable,
        )
        .await
    }

    async fn get_data_once(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, SourceError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http_client
            .get(&url)
            .query(query)
            .header("X-API-KEY", &self.api_key)
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            debug!("{} -> {}", path, status);
            return Err(classify_status(status));
        }

        let body: Value = response.json().await.map_err(|e| SourceError::BadPayload {
            provider: PROVIDER,
            detail: e.to_string(),
        })?;
        Ok(extract_data(body))
    }
}

/// Maps a non-success status into the retry taxonomy.
fn classify_status(status: StatusCode) -> SourceError {
    let code = status.as_u16();
    match code {
        401 | 403 => SourceError::AuthOrPlan {
            provider: PROVIDER,
            status: code,
        },
        429 | 500 | 502 | 503 | 504 => SourceError::Transient {
            provider: PROVIDER,
            status: code,
        },
        _ => SourceError::Status {
            provider: PROVIDER,
            status: code,
        },
    }
}

/// Pulls the `data` member out of the response envelope; a missing or null
/// member reads as the empty object.
fn extract_data(mut body: Value) -> Value {
    match body.get_mut("data") {
        Some(data) if !data.is_null() => data.take(),
        _ => Value::Object(Default::default()),
    }
}

/// Field-level tolerance: a shape mismatch reads as "all fields absent".
fn parse_data<T: serde::de::DeserializeOwned + Default>(data: Value) -> T {
    serde_json::from_value(data).unwrap_or_default()
}
