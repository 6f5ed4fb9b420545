//! Request-scoped orchestration: discovery, enrichment, scoring and the
//! optional decision oracle, stitched together behind a snapshot cache.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use moka::future::Cache;
use nonempty::NonEmpty;
use reqwest::Client;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::config::AppConfig;
use crate::error::{ApiError, SourceError};
use crate::oracle::{CompactToken, LlmOracle};
use crate::pipeline::{merge_enrichment, normalize_meta, ProfileFilter};
use crate::sources::{BirdeyeClient, DexScreenerClient, SolscanClient};
use crate::types::{normalize_chain_id, Signal, Snapshot, TokenAddress, Verdict};

/// Oracle batches take longer than market-data lookups; they get their own
/// client with a wider timeout.
const ORACLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Shared service state. Cloning is cheap: every field is either a handle
/// (HTTP clients, cache, limiter, semaphore) or small configuration.
#[derive(Clone)]
pub struct SignalEngine {
    solscan: SolscanClient,
    birdeye: BirdeyeClient,
    dexscreener: DexScreenerClient,
    oracle: Option<LlmOracle>,
    profile_filter: ProfileFilter,
    snapshot_cache: Cache<TokenAddress, Snapshot>,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    request_semaphore: Arc<Semaphore>,
}

impl SignalEngine {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let market_client = Client::builder()
            .timeout(config.http_timeout())
            .build()
            .context("building the market-data HTTP client")?;
        let meta_client = Client::builder()
            .timeout(config.solscan_timeout())
            .build()
            .context("building the token-meta HTTP client")?;
        let oracle_client = Client::builder()
            .timeout(ORACLE_TIMEOUT)
            .build()
            .context("building the oracle HTTP client")?;

        let oracle = LlmOracle::from_config(oracle_client, config);
        if oracle.is_none() {
            info!("decision oracle disabled; signals carry local scoring only");
        }

        let quota = Quota::per_second(
            NonZeroU32::new(config.rate_limit_requests_per_second).unwrap_or(NonZeroU32::MIN),
        );

        Ok(Self {
            solscan: SolscanClient::new(meta_client, config),
            birdeye: BirdeyeClient::new(market_client.clone(), config),
            dexscreener: DexScreenerClient::new(market_client, config),
            oracle,
            profile_filter: ProfileFilter::new()
                .context("compiling the profile blacklist patterns")?,
            snapshot_cache: Cache::builder()
                .max_capacity(config.max_cache_entries)
                .time_to_live(config.cache_ttl())
                .build(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            request_semaphore: Arc::new(Semaphore::new(config.max_parallel_tokens)),
        })
    }

    /// Full enrichment pipeline for one token, served from the snapshot
    /// cache when a fresh entry exists. Never fails: sources that error
    /// out simply leave their fields empty.
    #[instrument(skip(self), fields(mint = %address))]
    pub async fn enriched_snapshot(&self, address: &str) -> Snapshot {
        if let Some(hit) = self.snapshot_cache.get(address).await {
            debug!("snapshot served from cache");
            return hit;
        }
        let snapshot = self.build_snapshot(address).await;
        self.snapshot_cache
            .insert(address.to_string(), snapshot.clone())
            .await;
        snapshot
    }

    async fn build_snapshot(&self, address: &str) -> Snapshot {
        let meta = self.solscan.token_meta(address).await;
        let snapshot = normalize_meta(&meta, address);

        self.rate_limiter.until_ready().await;
        let (overview, volume, trades) = tokio::join!(
            self.birdeye.overview_with_fallback(address),
            self.birdeye.volume_points(address),
            self.birdeye.recent_trades(address),
        );
        let overview = match overview {
            Ok((data, degraded)) => {
                if degraded {
                    debug!("overview limited to the price fallback");
                }
                Some(data)
            }
            Err(e) => {
                warn!("overview fetch failed: {}", e);
                None
            }
        };
        let volume = fetched_or_logged(volume, "volume series");
        let trades = fetched_or_logged(trades, "recent trades");

        merge_enrichment(&snapshot, overview.as_ref(), volume.as_ref(), trades.as_ref())
    }

    /// Runs the pipeline for each requested address, fanning out under the
    /// concurrency cap, and returns one signal per token that completed.
    #[instrument(skip(self, addresses), fields(tokens = addresses.len()))]
    pub async fn signals_for(
        &self,
        addresses: &[TokenAddress],
        analyze: bool,
    ) -> Result<Vec<Signal>, ApiError> {
        let mut handles = Vec::with_capacity(addresses.len());
        for address in addresses {
            let engine = self.clone();
            let address = address.clone();
            handles.push(tokio::spawn(async move {
                let _permit = engine.request_semaphore.clone().acquire_owned().await.ok()?;
                let snapshot = engine.enriched_snapshot(&address).await;
                Some((address, snapshot))
            }));
        }

        let mut enriched: Vec<(TokenAddress, Snapshot)> = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(Some(pair)) => enriched.push(pair),
                Ok(None) => {}
                Err(e) => warn!("token pipeline task failed: {}", e),
            }
        }
        if enriched.is_empty() {
            return Err(ApiError::NoMatches(
                "no data for the requested tokens".to_string(),
            ));
        }

        if analyze {
            self.annotate_snapshots(&mut enriched).await;
        }

        let signals = enriched
            .iter()
            .map(|(_, snapshot)| {
                let chain = Value::String(snapshot.chain_id.clone());
                Signal::from_snapshot(snapshot, normalize_chain_id(Some(&chain)))
            })
            .collect();
        Ok(signals)
    }

    /// Pulls the public discovery feed, keeps the profiles that clear the
    /// local filter and turns them into signals, optionally asking the
    /// oracle for a verdict on the survivors.
    #[instrument(skip(self))]
    pub async fn latest_signals(&self, analyze: bool) -> Result<Vec<Signal>, ApiError> {
        let profiles = self.dexscreener.latest_profiles().await;
        info!("discovery feed returned {} profiles", profiles.len());

        let mut approved = Vec::new();
        for profile in profiles {
            match self.profile_filter.evaluate(&profile) {
                Some(evaluation) => approved.push((profile, evaluation)),
                None => debug!(
                    "profile {} rejected by the local filter",
                    profile.token_address.as_deref().unwrap_or("<unknown>")
                ),
            }
        }
        if approved.is_empty() {
            return Err(ApiError::NoMatches(
                "no token passed the discovery filters".to_string(),
            ));
        }
        info!("{} profiles passed the discovery filters", approved.len());

        let mut verdicts: HashMap<TokenAddress, Verdict> = HashMap::new();
        if analyze {
            if let Some(oracle) = &self.oracle {
                let compact: Vec<CompactToken> = approved
                    .iter()
                    .filter(|(profile, _)| profile.token_address.is_some())
                    .map(|(profile, _)| CompactToken::from_profile(profile))
                    .collect();
                if let Some(batch) = NonEmpty::from_vec(compact) {
                    for verdict in oracle.decide(&batch).await {
                        verdicts.insert(verdict.token_address.clone(), verdict);
                    }
                }
            } else {
                debug!("analysis requested but the oracle is not configured");
            }
        }

        let signals = approved
            .into_iter()
            .map(|(profile, evaluation)| {
                let mut signal = Signal::from_profile(&profile, evaluation.status, evaluation.failed);
                if let Some(verdict) = profile
                    .token_address
                    .as_deref()
                    .and_then(|address| verdicts.get(address))
                {
                    signal.decision = verdict.decision;
                    signal.confidence = verdict.confidence;
                    signal.rationale = verdict.rationale.clone();
                }
                signal
            })
            .collect();
        Ok(signals)
    }

    /// Joins oracle verdicts back onto the snapshots by address. Tokens the
    /// oracle skipped keep their local scoring untouched.
    async fn annotate_snapshots(&self, enriched: &mut [(TokenAddress, Snapshot)]) {
        let Some(oracle) = &self.oracle else {
            debug!("analysis requested but the oracle is not configured");
            return;
        };
        let compact: Vec<CompactToken> = enriched
            .iter()
            .map(|(_, snapshot)| CompactToken::from_snapshot(snapshot))
            .collect();
        let Some(batch) = NonEmpty::from_vec(compact) else {
            return;
        };
        let verdicts: HashMap<TokenAddress, Verdict> = oracle
            .decide(&batch)
            .await
            .into_iter()
            .map(|verdict| (verdict.token_address.clone(), verdict))
            .collect();
        for (address, snapshot) in enriched.iter_mut() {
            if let Some(verdict) = verdicts.get(address) {
                snapshot.decision = verdict.decision;
                snapshot.confidence = verdict.confidence;
                snapshot.rationale = verdict.rationale.clone();
            }
        }
    }
}

fn fetched_or_logged<T>(result: Result<T, SourceError>, what: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{} fetch failed: {}", what, e);
            None
        }
    }
}
