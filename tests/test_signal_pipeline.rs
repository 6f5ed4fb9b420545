//! End-to-end tests for the local evaluation pipeline: provider payloads in,
//! classified signals out.

use chrono::Utc;
use sentinel::pipeline::{
    attach_scoring, merge_enrichment, normalize_meta, MetaPayload, OverviewData, TradeStats,
    VolumePoint, VolumeSeries,
};
use sentinel::types::{Classification, Signal, SignalStatus, Snapshot};

const MINT: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";

/// Metadata for a token listed `age_minutes` ago with a website and both
/// authorities revoked.
fn listed_meta(age_minutes: i64) -> MetaPayload {
    MetaPayload {
        symbol: Some("REF".to_string()),
        website: Some("https://ref.example".to_string()),
        holder: Some(2_000),
        created_time: Some(Utc::now().timestamp() - age_minutes * 60),
        ..MetaPayload::default()
    }
}

fn watchlist_grade_enrichment() -> (OverviewData, VolumeSeries, TradeStats) {
    let overview = OverviewData {
        liquidity: Some(20_000.0),
        market_cap: Some(500_000.0),
        volume_24h_quote: Some(123_456.0),
        ..OverviewData::default()
    };
    let volume = VolumeSeries {
        points: vec![
            VolumePoint {
                volume_quote: Some(4_000.0),
                ..VolumePoint::default()
            },
            VolumePoint {
                volume_quote: Some(6_000.0),
                ..VolumePoint::default()
            },
            VolumePoint {
                volume_quote: Some(10_000.0),
                buy: Some(13),
                sell: Some(7),
            },
        ],
    };
    let trades = TradeStats {
        buyers: Some(40),
        sellers: Some(25),
        buys: Some(99),
        sells: Some(99),
    };
    (overview, volume, trades)
}

#[test]
fn full_pipeline_scores_a_listed_token() {
    let snapshot = normalize_meta(&listed_meta(150), MINT);
    let (overview, volume, trades) = watchlist_grade_enrichment();
    let merged = merge_enrichment(&snapshot, Some(&overview), Some(&volume), Some(&trades));

    assert_eq!(merged.token_address, MINT);
    assert_eq!(merged.header, "REF");
    assert_eq!(merged.liquidity_usd, Some(20_000.0));
    assert_eq!(merged.mcap_usd, Some(500_000.0));
    assert_eq!(merged.volume_usd_5m, Some(10_000.0));
    assert_eq!(merged.volume_usd_1h, Some(20_000.0));
    assert_eq!(merged.volume_usd_24h, Some(123_456.0));
    assert_eq!(merged.txns_buy_5m, Some(13));
    assert_eq!(merged.txns_sell_5m, Some(7));
    assert_eq!(merged.buyers_5m, Some(40));
    assert_eq!(merged.sellers_5m, Some(25));
    assert_eq!(merged.cap_liq_ratio, Some(25.0));
    assert_eq!(merged.buy_sell_pressure_5m, Some(0.3));
    let age = merged.age_minutes.expect("age derived from created_time");
    assert!((150..=151).contains(&age), "unexpected age {age}");

    // clean token, mid-grade metrics: lands on the watchlist
    assert!(merged.flags.is_empty(), "unexpected flags {:?}", merged.flags);
    let score = merged.score_local.expect("score attached");
    assert!((58.5..60.0).contains(&score), "unexpected score {score}");
    assert_eq!(merged.classification, Some(Classification::Watchlist));

    let signal = Signal::from_snapshot(&merged, 101);
    assert_eq!(signal.status, SignalStatus::Ok);
    assert!(signal.failed.is_empty());
    assert_eq!(signal.chain_id, 101);
    assert_eq!(signal.liquidity_usd, Some(20_000.0));
    assert_eq!(
        signal.url.as_deref(),
        Some("https://solscan.io/token/7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU")
    );
}

#[test]
fn exact_vector_reaches_high_potential() {
    let mut snapshot = Snapshot::new(MINT);
    snapshot.liquidity_usd = Some(40_000.0);
    snapshot.mcap_usd = Some(400_000.0);
    snapshot.cap_liq_ratio = Some(10.0);
    snapshot.holders = Some(4_000);
    snapshot.age_minutes = Some(150);
    snapshot.volume_usd_5m = Some(30_000.0);
    snapshot.buy_sell_pressure_5m = Some(0.5);
    snapshot.mint_authority_disabled = true;
    snapshot.freeze_authority_disabled = true;
    snapshot.links = vec![sentinel::types::Link::new("website", "https://ref.example")];

    let scored = attach_scoring(snapshot);
    assert_eq!(scored.score_local, Some(80.05));
    assert!(scored.flags.is_empty());
    assert_eq!(scored.classification, Some(Classification::HighPotential));
}

#[test]
fn exact_vector_lands_on_the_watchlist() {
    let mut snapshot = Snapshot::new(MINT);
    snapshot.liquidity_usd = Some(20_000.0);
    snapshot.mcap_usd = Some(500_000.0);
    snapshot.cap_liq_ratio = Some(25.0);
    snapshot.holders = Some(2_000);
    snapshot.age_minutes = Some(150);
    snapshot.volume_usd_5m = Some(10_000.0);
    snapshot.buy_sell_pressure_5m = Some(0.3);
    snapshot.mint_authority_disabled = true;
    snapshot.freeze_authority_disabled = true;
    snapshot.links = vec![sentinel::types::Link::new("website", "https://ref.example")];

    let scored = attach_scoring(snapshot);
    assert_eq!(scored.score_local, Some(59.19));
    assert_eq!(scored.classification, Some(Classification::Watchlist));
}

#[test]
fn clean_reference_vector_still_misses_the_floor() {
    let mut snapshot = Snapshot::new(MINT);
    snapshot.liquidity_usd = Some(15_000.0);
    snapshot.mcap_usd = Some(400_000.0);
    snapshot.cap_liq_ratio = Some(400_000.0 / 15_000.0);
    snapshot.holders = Some(1_200);
    snapshot.age_minutes = Some(150);
    snapshot.volume_usd_5m = Some(5_000.0);
    snapshot.buy_sell_pressure_5m = Some(0.2);
    snapshot.mint_authority_disabled = true;
    snapshot.freeze_authority_disabled = true;
    snapshot.links = vec![sentinel::types::Link::new("website", "https://ref.example")];

    let scored = attach_scoring(snapshot);
    // no flags raised, yet the weighted score stays under the 55 floor
    assert!(scored.flags.is_empty());
    assert_eq!(scored.score_local, Some(52.83));
    assert_eq!(scored.classification, Some(Classification::Discard));
}

#[test]
fn live_mint_authority_discards_over_any_score() {
    let meta = MetaPayload {
        mint_authority: Some("9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin".to_string()),
        ..listed_meta(150)
    };
    let snapshot = normalize_meta(&meta, MINT);
    let overview = OverviewData {
        liquidity: Some(80_000.0),
        market_cap: Some(400_000.0),
        ..OverviewData::default()
    };
    let volume = VolumeSeries {
        points: vec![VolumePoint {
            volume_quote: Some(40_000.0),
            buy: Some(60),
            sell: Some(20),
        }],
    };
    let merged = merge_enrichment(&snapshot, Some(&overview), Some(&volume), None);

    assert_eq!(merged.classification, Some(Classification::Discard));

    let signal = Signal::from_snapshot(&merged, 101);
    assert_eq!(signal.status, SignalStatus::Partial);
    assert!(signal.failed.contains(&"mint_enabled".to_string()));
}

#[test]
fn partial_enrichment_still_classifies() {
    let snapshot = normalize_meta(&listed_meta(150), MINT);
    let overview = OverviewData {
        liquidity: Some(20_000.0),
        market_cap: Some(500_000.0),
        ..OverviewData::default()
    };
    let merged = merge_enrichment(&snapshot, Some(&overview), None, None);

    assert_eq!(merged.volume_usd_5m, None);
    assert_eq!(merged.buy_sell_pressure_5m, None);
    assert!(merged
        .flags
        .iter()
        .any(|f| f.as_str() == "low_volume_5m"));
    assert_eq!(merged.classification, Some(Classification::Discard));
}

#[test]
fn signal_serializes_with_wire_names() {
    let snapshot = normalize_meta(&listed_meta(150), MINT);
    let (overview, volume, trades) = watchlist_grade_enrichment();
    let merged = merge_enrichment(&snapshot, Some(&overview), Some(&volume), Some(&trades));
    let signal = Signal::from_snapshot(&merged, 101);

    let value = serde_json::to_value(&signal).expect("signal serializes");
    assert_eq!(value["tokenAddress"], MINT);
    assert_eq!(value["chainId"], 101);
    assert_eq!(value["status"], "ok");
    assert_eq!(value["liquidityUSD"], 20_000.0);
    assert_eq!(value["volumeUSD_5m"], 10_000.0);
    assert_eq!(value["volumeUSD_24h"], 123_456.0);
    assert_eq!(value["classification"], "watchlist");
    assert!(value["ageMinutes"].is_number());
    assert!(value["score_local"].is_number());
    assert!(value["failed"].as_array().expect("failed array").is_empty());
}
