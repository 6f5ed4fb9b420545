//! Converts a provider token-metadata payload into the canonical snapshot.
//!
//! The normalizer never fails: whatever the provider omitted or mangled
//! degrades to null fields, and an entirely empty payload still yields a
//! fully-keyed snapshot.

use crate::types::{Link, Snapshot};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Metadata fields the normalizer reads. Every field is optional; unknown
/// provider fields are ignored on deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaPayload {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub site: Option<String>,
    pub telegram: Option<String>,
    pub twitter: Option<String>,
    pub x: Option<String>,
    pub discord: Option<String>,
    /// Epoch seconds of the first recorded trade
    pub first_trade_time: Option<i64>,
    /// Epoch seconds of mint creation
    pub created_time: Option<i64>,
    pub holder: Option<u64>,
    /// Authority address, empty string, "disabled", or absent
    pub mint_authority: Option<String>,
    pub freeze_authority: Option<String>,
}

/// Builds the canonical snapshot for `address` from a metadata payload.
pub fn normalize_meta(meta: &MetaPayload, address: &str) -> Snapshot {
    normalize_meta_at(meta, address, Utc::now())
}

fn normalize_meta_at(meta: &MetaPayload, address: &str, now: DateTime<Utc>) -> Snapshot {
    let listed_at = meta
        .first_trade_time
        .or(meta.created_time)
        .and_then(to_utc);
    let age_minutes = listed_at.map(|listed| (now - listed).num_minutes().max(0));

    let mut snapshot = Snapshot::new(address);
    snapshot.header = first_non_empty(&[meta.symbol.as_deref(), meta.name.as_deref()]);
    snapshot.description = meta.description.clone().unwrap_or_default();
    snapshot.links = links_from_meta(meta);
    snapshot.listed_at = listed_at;
    snapshot.age_minutes = age_minutes;
    snapshot.holders = meta.holder;
    snapshot.mint_authority_disabled = authority_disabled(meta.mint_authority.as_deref());
    snapshot.freeze_authority_disabled = authority_disabled(meta.freeze_authority.as_deref());
    snapshot.solscan_url = Some(format!("https://solscan.io/token/{address}"));
    snapshot
}

/// An authority counts as disabled when the provider reports no address for
/// it: absent, empty, or the literal "disabled". Anything else (a wallet)
/// means the authority is still live.
fn authority_disabled(value: Option<&str>) -> bool {
    matches!(value, None | Some("") | Some("disabled"))
}

fn to_utc(epoch_seconds: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(epoch_seconds, 0).single()
}

fn first_non_empty(candidates: &[Option<&str>]) -> String {
    candidates
        .iter()
        .flatten()
        .find(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_default()
}

/// Collects links from the fixed key set, in source key order. Alternate
/// spellings fold into one entry per type (site -> website, x -> twitter).
fn links_from_meta(meta: &MetaPayload) -> Vec<Link> {
    let mut links = Vec::new();
    let site = first_non_empty(&[meta.website.as_deref(), meta.site.as_deref()]);
    let twitter = first_non_empty(&[meta.twitter.as_deref(), meta.x.as_deref()]);
    if !site.is_empty() {
        links.push(Link::new("website", site));
    }
    if let Some(tg) = meta.telegram.as_deref().filter(|s| !s.is_empty()) {
        links.push(Link::new("telegram", tg));
    }
    if !twitter.is_empty() {
        links.push(Link::new("twitter", twitter));
    }
    if let Some(dc) = meta.discord.as_deref().filter(|s| !s.is_empty()) {
        links.push(Link::new("discord", dc));
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINT: &str = "So11111111111111111111111111111111111111112";

    #[test]
    fn empty_payload_yields_fully_keyed_snapshot() {
        let snapshot = normalize_meta(&MetaPayload::default(), MINT);
        assert_eq!(snapshot.token_address, MINT);
        assert_eq!(snapshot.chain, "sol");
        assert_eq!(snapshot.chain_id, "solana");
        assert_eq!(snapshot.header, "");
        assert!(snapshot.links.is_empty());
        assert!(snapshot.listed_at.is_none());
        assert!(snapshot.age_minutes.is_none());
        assert!(snapshot.liquidity_usd.is_none());
        assert!(snapshot.score_local.is_none());
        // No authority address reported counts as revoked
        assert!(snapshot.mint_authority_disabled);
        assert!(snapshot.freeze_authority_disabled);
        assert_eq!(
            snapshot.solscan_url.as_deref(),
            Some("https://solscan.io/token/So11111111111111111111111111111111111111112")
        );
    }

    #[test]
    fn listed_at_prefers_first_trade_time() {
        let meta = MetaPayload {
            first_trade_time: Some(1_723_500_000),
            created_time: Some(1_723_000_000),
            ..MetaPayload::default()
        };
        let now = to_utc(1_723_500_000 + 3_600).expect("valid epoch");
        let snapshot = normalize_meta_at(&meta, MINT, now);
        assert_eq!(snapshot.listed_at, to_utc(1_723_500_000));
        assert_eq!(snapshot.age_minutes, Some(60));
    }

    #[test]
    fn age_falls_back_to_created_time_and_clamps_clock_skew() {
        let meta = MetaPayload {
            created_time: Some(1_723_500_000),
            ..MetaPayload::default()
        };
        let before_listing = to_utc(1_723_499_000).expect("valid epoch");
        let snapshot = normalize_meta_at(&meta, MINT, before_listing);
        assert_eq!(snapshot.age_minutes, Some(0));
    }

    #[test]
    fn age_floors_partial_minutes() {
        let meta = MetaPayload {
            first_trade_time: Some(1_723_500_000),
            ..MetaPayload::default()
        };
        let now = to_utc(1_723_500_000 + 119).expect("valid epoch");
        let snapshot = normalize_meta_at(&meta, MINT, now);
        assert_eq!(snapshot.age_minutes, Some(1));
    }

    #[test]
    fn links_collect_from_known_keys_with_alternates() {
        let meta = MetaPayload {
            site: Some("https://example.org".to_string()),
            telegram: Some("https://t.me/tok".to_string()),
            x: Some("https://x.com/tok".to_string()),
            discord: Some(String::new()),
            ..MetaPayload::default()
        };
        let snapshot = normalize_meta(&meta, MINT);
        assert_eq!(
            snapshot.links,
            vec![
                Link::new("website", "https://example.org"),
                Link::new("telegram", "https://t.me/tok"),
                Link::new("twitter", "https://x.com/tok"),
            ]
        );
    }

    #[test]
    fn active_authority_is_a_risk() {
        let meta = MetaPayload {
            mint_authority: Some("9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin".to_string()),
            freeze_authority: Some("disabled".to_string()),
            ..MetaPayload::default()
        };
        let snapshot = normalize_meta(&meta, MINT);
        assert!(!snapshot.mint_authority_disabled);
        assert!(snapshot.freeze_authority_disabled);
    }

    #[test]
    fn header_skips_empty_symbol() {
        let meta = MetaPayload {
            symbol: Some(String::new()),
            name: Some("Wrapped SOL".to_string()),
            ..MetaPayload::default()
        };
        let snapshot = normalize_meta(&meta, MINT);
        assert_eq!(snapshot.header, "Wrapped SOL");
    }
}
