//! Core types and data structures for the token-sentinel signal service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A chain-specific token address (string form to stay provider-agnostic).
pub type TokenAddress = String;

/// A social or informational link attached to a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Link category: website, twitter, telegram, discord, ...
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

impl Link {
    pub fn new(kind: &str, url: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            url: url.into(),
        }
    }
}

/// Link types that count as an official social presence.
pub const SOCIAL_LINK_KINDS: [&str; 4] = ["website", "twitter", "telegram", "discord"];

/// Risk/quality flags emitted by the flag engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    /// Liquidity unknown or below the tradable floor
    LowLiq,
    /// Holder count unknown or too small
    LowHolders,
    /// Valuation unsupported by liquidity
    HighCapLiq,
    /// No official social link present
    NoSocials,
    /// Listed less than half an hour ago
    TooNew,
    /// Net selling over the short window
    WeakPressure,
    /// 5-minute volume unknown or negligible
    #[serde(rename = "low_volume_5m")]
    LowVolume5m,
    /// Mint authority still active
    MintEnabled,
    /// Freeze authority still active
    FreezeEnabled,
    /// Fully-diluted valuation far above market cap
    HighFdvVsMcap,
}

impl Flag {
    /// Returns the string representation of the flag for serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            Flag::LowLiq => "low_liq",
            Flag::LowHolders => "low_holders",
            Flag::HighCapLiq => "high_cap_liq",
            Flag::NoSocials => "no_socials",
            Flag::TooNew => "too_new",
            Flag::WeakPressure => "weak_pressure",
            Flag::LowVolume5m => "low_volume_5m",
            Flag::MintEnabled => "mint_enabled",
            Flag::FreezeEnabled => "freeze_enabled",
            Flag::HighFdvVsMcap => "high_fdv_vs_mcap",
        }
    }

    /// Returns the full flag vocabulary.
    pub fn all() -> Vec<Flag> {
        vec![
            Flag::LowLiq,
            Flag::LowHolders,
            Flag::HighCapLiq,
            Flag::NoSocials,
            Flag::TooNew,
            Flag::WeakPressure,
            Flag::LowVolume5m,
            Flag::MintEnabled,
            Flag::FreezeEnabled,
            Flag::HighFdvVsMcap,
        ]
    }
}

/// Bucket a token lands in after local scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    HighPotential,
    Watchlist,
    Discard,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::HighPotential => "high_potential",
            Classification::Watchlist => "watchlist",
            Classification::Discard => "discard",
        }
    }
}

/// Qualitative call produced by the external decision oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    #[serde(rename = "enter", alias = "entrada")]
    Enter,
    #[serde(rename = "watch", alias = "observar")]
    Watch,
    #[serde(rename = "avoid", alias = "evitar")]
    Avoid,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Enter => "enter",
            Decision::Watch => "watch",
            Decision::Avoid => "avoid",
        }
    }

    /// Parses a free-form oracle label, accepting both the English and the
    /// provider-native Portuguese spellings. Unknown labels map to `None`.
    pub fn parse_label(raw: &str) -> Option<Decision> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "enter" | "entrada" => Some(Decision::Enter),
            "watch" | "observar" => Some(Decision::Watch),
            "avoid" | "evitar" => Some(Decision::Avoid),
            _ => None,
        }
    }
}

/// One oracle verdict, joined back to its token by address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    #[serde(rename = "tokenAddress")]
    pub token_address: TokenAddress,
    pub decision: Option<Decision>,
    pub confidence: Option<f64>,
    pub rationale: Option<String>,
}

/// Canonical per-token record aggregating identity, market metrics, and
/// derived scoring outputs. Field names follow the wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// The token address; immutable merge key across all enrichment steps
    #[serde(rename = "tokenAddress")]
    pub token_address: TokenAddress,
    pub chain: String,
    #[serde(rename = "chainId")]
    pub chain_id: String,
    pub header: String,
    pub description: String,
    pub url: Option<String>,
    pub links: Vec<Link>,
    #[serde(rename = "solscanUrl")]
    pub solscan_url: Option<String>,
    #[serde(rename = "listedAt")]
    pub listed_at: Option<DateTime<Utc>>,
    #[serde(rename = "ageMinutes")]
    pub age_minutes: Option<i64>,
    /// true means the mint authority has been revoked (trust signal)
    #[serde(rename = "mintAuthorityDisabled")]
    pub mint_authority_disabled: bool,
    /// true means the freeze authority has been revoked (trust signal)
    #[serde(rename = "freezeAuthorityDisabled")]
    pub freeze_authority_disabled: bool,
    #[serde(rename = "liquidityUSD")]
    pub liquidity_usd: Option<f64>,
    #[serde(rename = "mcapUSD")]
    pub mcap_usd: Option<f64>,
    #[serde(rename = "fdvUSD")]
    pub fdv_usd: Option<f64>,
    #[serde(rename = "volumeUSD_5m")]
    pub volume_usd_5m: Option<f64>,
    #[serde(rename = "volumeUSD_1h")]
    pub volume_usd_1h: Option<f64>,
    #[serde(rename = "volumeUSD_24h")]
    pub volume_usd_24h: Option<f64>,
    pub holders: Option<u64>,
    #[serde(rename = "txnsBuy_5m")]
    pub txns_buy_5m: Option<u64>,
    #[serde(rename = "txnsSell_5m")]
    pub txns_sell_5m: Option<u64>,
    pub buyers_5m: Option<u64>,
    pub sellers_5m: Option<u64>,
    /// Derived by the merger: mcap (or fdv) divided by liquidity
    #[serde(rename = "capLiqRatio")]
    pub cap_liq_ratio: Option<f64>,
    /// Derived by the merger: (buys - sells) / (buys + sells), in [-1, 1]
    #[serde(rename = "buySellPressure_5m")]
    pub buy_sell_pressure_5m: Option<f64>,
    pub score_local: Option<f64>,
    pub score_breakdown: Option<HashMap<String, f64>>,
    pub flags: Vec<Flag>,
    pub classification: Option<Classification>,
    pub decision: Option<Decision>,
    pub confidence: Option<f64>,
    pub rationale: Option<String>,
}

impl Snapshot {
    /// An all-unknown snapshot for the given address. Every enrichment field
    /// starts null; authorities start active (not a trust signal by default).
    pub fn new(token_address: impl Into<TokenAddress>) -> Self {
        Self {
            token_address: token_address.into(),
            chain: "sol".to_string(),
            chain_id: "solana".to_string(),
            header: String::new(),
            description: String::new(),
            url: None,
            links: Vec::new(),
            solscan_url: None,
            listed_at: None,
            age_minutes: None,
            mint_authority_disabled: false,
            freeze_authority_disabled: false,
            liquidity_usd: None,
            mcap_usd: None,
            fdv_usd: None,
            volume_usd_5m: None,
            volume_usd_1h: None,
            volume_usd_24h: None,
            holders: None,
            txns_buy_5m: None,
            txns_sell_5m: None,
            buyers_5m: None,
            sellers_5m: None,
            cap_liq_ratio: None,
            buy_sell_pressure_5m: None,
            score_local: None,
            score_breakdown: None,
            flags: Vec::new(),
            classification: None,
            decision: None,
            confidence: None,
            rationale: None,
        }
    }

    /// True when any accepted social link carries a URL.
    pub fn has_socials(&self) -> bool {
        self.links
            .iter()
            .any(|l| SOCIAL_LINK_KINDS.contains(&l.kind.as_str()) && !l.url.is_empty())
    }
}

/// Whether a signal cleared the local evaluation or only partially.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStatus {
    Ok,
    Partial,
}

impl SignalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalStatus::Ok => "ok",
            SignalStatus::Partial => "partial",
        }
    }
}

/// API response record for one token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    #[serde(rename = "tokenAddress")]
    pub token_address: TokenAddress,
    #[serde(rename = "chainId")]
    pub chain_id: i64,
    pub url: Option<String>,
    pub icon: Option<String>,
    pub header: Option<String>,
    pub description: Option<String>,
    pub links: Vec<Link>,
    pub status: SignalStatus,
    /// Criteria the token did not meet (flag names or filter check names)
    pub failed: Vec<String>,
    #[serde(rename = "ageMinutes")]
    pub age_minutes: Option<i64>,
    #[serde(rename = "liquidityUSD")]
    pub liquidity_usd: Option<f64>,
    #[serde(rename = "mcapUSD")]
    pub mcap_usd: Option<f64>,
    #[serde(rename = "fdvUSD")]
    pub fdv_usd: Option<f64>,
    #[serde(rename = "volumeUSD_5m")]
    pub volume_usd_5m: Option<f64>,
    #[serde(rename = "volumeUSD_1h")]
    pub volume_usd_1h: Option<f64>,
    #[serde(rename = "volumeUSD_24h")]
    pub volume_usd_24h: Option<f64>,
    pub score_local: Option<f64>,
    pub classification: Option<Classification>,
    pub flags: Vec<Flag>,
    pub decision: Option<Decision>,
    pub confidence: Option<f64>,
    pub rationale: Option<String>,
}

impl Signal {
    /// Builds the API record from a scored snapshot.
    ///
    /// Status is `ok` when the classifier kept the token (high_potential or
    /// watchlist), `partial` otherwise; `failed` carries the raised flags.
    pub fn from_snapshot(snapshot: &Snapshot, chain_id: i64) -> Self {
        let status = match snapshot.classification {
            Some(Classification::HighPotential) | Some(Classification::Watchlist) => {
                SignalStatus::Ok
            }
            _ => SignalStatus::Partial,
        };
        let failed = snapshot
            .flags
            .iter()
            .map(|f| f.as_str().to_string())
            .collect();
        Self {
            token_address: snapshot.token_address.clone(),
            chain_id,
            url: snapshot.solscan_url.clone().or_else(|| snapshot.url.clone()),
            icon: None,
            header: non_empty(&snapshot.header),
            description: non_empty(&snapshot.description),
            links: snapshot.links.clone(),
            status,
            failed,
            age_minutes: snapshot.age_minutes,
            liquidity_usd: snapshot.liquidity_usd,
            mcap_usd: snapshot.mcap_usd,
            fdv_usd: snapshot.fdv_usd,
            volume_usd_5m: snapshot.volume_usd_5m,
            volume_usd_1h: snapshot.volume_usd_1h,
            volume_usd_24h: snapshot.volume_usd_24h,
            score_local: snapshot.score_local,
            classification: snapshot.classification,
            flags: snapshot.flags.clone(),
            decision: snapshot.decision,
            confidence: snapshot.confidence,
            rationale: snapshot.rationale.clone(),
        }
    }

    /// Builds the API record from a discovery-feed profile plus the outcome
    /// of the profile filter. Links are narrowed to typed entries with URLs.
    pub fn from_profile(profile: &TokenProfile, status: SignalStatus, failed: Vec<String>) -> Self {
        let links = profile
            .links
            .iter()
            .filter_map(|l| {
                let kind = l.kind_or_label()?;
                let url = l.url.as_deref().filter(|u| !u.is_empty())?;
                if ["website", "twitter", "telegram"].contains(&kind.as_str()) {
                    Some(Link::new(&kind, url))
                } else {
                    None
                }
            })
            .collect();
        Self {
            token_address: profile.token_address.clone().unwrap_or_default(),
            chain_id: normalize_chain_id(profile.chain_id.as_ref()),
            url: profile.url.clone(),
            icon: profile.icon.clone(),
            header: profile.header.clone(),
            description: profile.description.clone(),
            links,
            status,
            failed,
            age_minutes: None,
            liquidity_usd: None,
            mcap_usd: None,
            fdv_usd: None,
            volume_usd_5m: None,
            volume_usd_1h: None,
            volume_usd_24h: None,
            score_local: None,
            classification: None,
            flags: Vec::new(),
            decision: None,
            confidence: None,
            rationale: None,
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// One entry of the discovery feed. All fields are optional; payload shape
/// is whatever the feed serves today.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenProfile {
    #[serde(rename = "tokenAddress")]
    pub token_address: Option<TokenAddress>,
    pub url: Option<String>,
    pub icon: Option<String>,
    pub header: Option<String>,
    pub description: Option<String>,
    /// Named chain ("solana") or a numeric id; normalized late
    #[serde(rename = "chainId")]
    pub chain_id: Option<Value>,
    pub links: Vec<ProfileLink>,
    pub age: Option<ProfileAge>,
    pub volume: Option<ProfileVolume>,
    pub txns: Option<ProfileTxns>,
}

/// Feed link entry; some feeds label links instead of typing them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileLink {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub label: Option<String>,
    pub url: Option<String>,
}

impl ProfileLink {
    /// Lowercased type, falling back to the label.
    pub fn kind_or_label(&self) -> Option<String> {
        self.kind
            .as_deref()
            .or(self.label.as_deref())
            .map(|s| s.to_ascii_lowercase())
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileAge {
    pub seconds: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileVolume {
    pub h24: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileTxns {
    pub h24: Option<ProfileTxnWindow>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileTxnWindow {
    pub buys: Option<i64>,
    pub sells: Option<i64>,
}

/// Maps a chain identifier (named or numeric) to the numeric id the API
/// exposes. Unknown chains map to -1.
pub fn normalize_chain_id(raw: Option<&Value>) -> i64 {
    let Some(raw) = raw else { return -1 };
    if let Some(n) = raw.as_i64() {
        return n;
    }
    let Some(s) = raw.as_str() else { return -1 };
    let s = s.trim();
    if let Ok(n) = s.parse::<i64>() {
        return n;
    }
    match s.to_ascii_lowercase().as_str() {
        "ethereum" => 1,
        "bsc" => 56,
        "solana" => 101,
        "base" => 8453,
        "polygon" => 137,
        "arbitrum" => 42161,
        _ => -1,
    }
}
