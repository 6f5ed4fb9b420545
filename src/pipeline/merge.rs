//! Non-destructive enrichment merge and the derived metrics.
//!
//! Each enrichment source writes only the fields it actually supplies; an
//! absent or empty payload leaves the prior snapshot value untouched. After
//! the merge the derived metrics are recomputed and the scoring outputs
//! reattached, so they always describe the same snapshot state.

use crate::pipeline::classify::classify;
use crate::pipeline::flags::compute_flags;
use crate::pipeline::score::compute_score;
use crate::types::Snapshot;
use serde::{Deserialize, Serialize};

/// Points of the short-interval volume series summed into the 1h window.
const VOLUME_WINDOW_POINTS: usize = 12;

/// Market overview payload: liquidity, valuation and daily volume.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverviewData {
    pub liquidity: Option<f64>,
    pub market_cap: Option<f64>,
    pub fdv: Option<f64>,
    pub volume_24h_quote: Option<f64>,
}

/// One time bucket of the short-interval volume series.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumePoint {
    pub volume_quote: Option<f64>,
    pub buy: Option<u64>,
    pub sell: Option<u64>,
}

/// Ordered series of time-bucketed volume points, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeSeries {
    pub points: Vec<VolumePoint>,
}

/// Aggregates over the recent-trades window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeStats {
    pub buyers: Option<u64>,
    pub sellers: Option<u64>,
    pub buys: Option<u64>,
    pub sells: Option<u64>,
}

/// Folds the available enrichment payloads into a new snapshot value and
/// reattaches the scoring outputs.
///
/// The last volume point supplies the 5-minute fields; the 1-hour volume is
/// the sliding sum over the last twelve points. Recent trades supply buyer
/// and seller counts directly but transaction counts only when the volume
/// series did not set them.
pub fn merge_enrichment(
    snapshot: &Snapshot,
    overview: Option<&OverviewData>,
    volume: Option<&VolumeSeries>,
    trades: Option<&TradeStats>,
) -> Snapshot {
    let mut next = snapshot.clone();

    if let Some(overview) = overview {
        if let Some(v) = overview.liquidity {
            next.liquidity_usd = Some(v);
        }
        if let Some(v) = overview.market_cap {
            next.mcap_usd = Some(v);
        }
        if let Some(v) = overview.fdv {
            next.fdv_usd = Some(v);
        }
        if let Some(v) = overview.volume_24h_quote {
            next.volume_usd_24h = Some(v);
        }
    }

    if let Some(series) = volume {
        if let Some(last) = series.points.last() {
            if let Some(v) = last.volume_quote {
                next.volume_usd_5m = Some(v);
            }
            if let Some(v) = last.buy {
                next.txns_buy_5m = Some(v);
            }
            if let Some(v) = last.sell {
                next.txns_sell_5m = Some(v);
            }
            let start = series.points.len().saturating_sub(VOLUME_WINDOW_POINTS);
            let window_sum: f64 = series.points[start..]
                .iter()
                .map(|p| p.volume_quote.unwrap_or(0.0))
                .sum();
            next.volume_usd_1h = Some(window_sum);
        }
    }

    if let Some(trades) = trades {
        if let Some(v) = trades.buyers {
            next.buyers_5m = Some(v);
        }
        if let Some(v) = trades.sellers {
            next.sellers_5m = Some(v);
        }
        // volume series wins the transaction counts
        if next.txns_buy_5m.is_none() {
            next.txns_buy_5m = trades.buys;
        }
        if next.txns_sell_5m.is_none() {
            next.txns_sell_5m = trades.sells;
        }
    }

    recompute_derived(&mut next);
    attach_scoring(next)
}

/// Recomputes `capLiqRatio` and `buySellPressure_5m` from the merged state.
fn recompute_derived(snapshot: &mut Snapshot) {
    let liquidity = snapshot.liquidity_usd.filter(|v| *v != 0.0);
    let cap = snapshot
        .mcap_usd
        .filter(|v| *v != 0.0)
        .or(snapshot.fdv_usd.filter(|v| *v != 0.0));
    snapshot.cap_liq_ratio = match (cap, liquidity) {
        (Some(cap), Some(liquidity)) => Some(cap / liquidity),
        _ => None,
    };

    let buys = snapshot.txns_buy_5m.map(|v| v as f64).unwrap_or(0.0);
    let sells = snapshot.txns_sell_5m.map(|v| v as f64).unwrap_or(0.0);
    let total = buys + sells;
    snapshot.buy_sell_pressure_5m = if total > 0.0 {
        Some((buys - sells) / total)
    } else {
        None
    };
}

/// Runs flag engine, scorer and classifier on the snapshot and attaches
/// their outputs. The three are always derived together.
pub fn attach_scoring(mut snapshot: Snapshot) -> Snapshot {
    let flags = compute_flags(&snapshot);
    let (score, breakdown) = compute_score(&snapshot);
    let classification = classify(score, &flags);
    snapshot.score_local = Some(score);
    snapshot.score_breakdown = Some(breakdown.to_hashmap());
    snapshot.flags = flags;
    snapshot.classification = Some(classification);
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_snapshot() -> Snapshot {
        let mut snapshot = Snapshot::new("mint");
        snapshot.liquidity_usd = Some(5_000.0);
        snapshot.holders = Some(300);
        snapshot
    }

    fn series(volumes: &[f64]) -> VolumeSeries {
        VolumeSeries {
            points: volumes
                .iter()
                .map(|v| VolumePoint {
                    volume_quote: Some(*v),
                    buy: None,
                    sell: None,
                })
                .collect(),
        }
    }

    #[test]
    fn absent_sources_leave_fields_untouched() {
        let snapshot = base_snapshot();
        let merged = merge_enrichment(&snapshot, None, None, None);
        assert_eq!(merged.liquidity_usd, Some(5_000.0));
        assert_eq!(merged.holders, Some(300));
        assert_eq!(merged.mcap_usd, None);
        assert_eq!(merged.volume_usd_5m, None);
        assert_eq!(merged.txns_buy_5m, None);
        assert_eq!(merged.buyers_5m, None);
        // derived recomputation still runs
        assert_eq!(merged.cap_liq_ratio, None);
        assert_eq!(merged.buy_sell_pressure_5m, None);
        assert!(merged.score_local.is_some());
    }

    #[test]
    fn overview_missing_keys_do_not_overwrite() {
        let snapshot = base_snapshot();
        let overview = OverviewData {
            market_cap: Some(250_000.0),
            ..OverviewData::default()
        };
        let merged = merge_enrichment(&snapshot, Some(&overview), None, None);
        assert_eq!(merged.liquidity_usd, Some(5_000.0));
        assert_eq!(merged.mcap_usd, Some(250_000.0));
        assert_eq!(merged.cap_liq_ratio, Some(50.0));
    }

    #[test]
    fn one_hour_volume_sums_last_twelve_points() {
        let volumes: Vec<f64> = (1..=15).map(|v| v as f64).collect();
        let merged = merge_enrichment(&base_snapshot(), None, Some(&series(&volumes)), None);
        // points 4..15, i.e. 4 + 5 + ... + 15
        assert_eq!(merged.volume_usd_1h, Some((4..=15).sum::<i64>() as f64));
        assert_eq!(merged.volume_usd_5m, Some(15.0));
    }

    #[test]
    fn short_series_sums_all_points() {
        let merged = merge_enrichment(
            &base_snapshot(),
            None,
            Some(&series(&[100.0, 200.0, 300.0])),
            None,
        );
        assert_eq!(merged.volume_usd_1h, Some(600.0));
        assert_eq!(merged.volume_usd_5m, Some(300.0));
    }

    #[test]
    fn empty_series_leaves_volume_fields_untouched() {
        let mut snapshot = base_snapshot();
        snapshot.volume_usd_5m = Some(1_234.0);
        snapshot.volume_usd_1h = Some(9_876.0);
        let merged = merge_enrichment(&snapshot, None, Some(&VolumeSeries::default()), None);
        assert_eq!(merged.volume_usd_5m, Some(1_234.0));
        assert_eq!(merged.volume_usd_1h, Some(9_876.0));
    }

    #[test]
    fn last_point_supplies_the_five_minute_fields() {
        let volume = VolumeSeries {
            points: vec![
                VolumePoint {
                    volume_quote: Some(10.0),
                    buy: Some(1),
                    sell: Some(9),
                },
                VolumePoint {
                    volume_quote: Some(2_000.0),
                    buy: Some(30),
                    sell: Some(10),
                },
            ],
        };
        let merged = merge_enrichment(&base_snapshot(), None, Some(&volume), None);
        assert_eq!(merged.volume_usd_5m, Some(2_000.0));
        assert_eq!(merged.txns_buy_5m, Some(30));
        assert_eq!(merged.txns_sell_5m, Some(10));
        assert_eq!(merged.buy_sell_pressure_5m, Some(0.5));
    }

    #[test]
    fn trades_fill_txns_only_when_series_did_not() {
        let volume = VolumeSeries {
            points: vec![VolumePoint {
                volume_quote: Some(500.0),
                buy: Some(0),
                sell: Some(4),
            }],
        };
        let trades = TradeStats {
            buyers: Some(7),
            sellers: Some(3),
            buys: Some(99),
            sells: Some(99),
        };
        let merged = merge_enrichment(&base_snapshot(), None, Some(&volume), Some(&trades));
        // a legitimate zero from the series is "set"
        assert_eq!(merged.txns_buy_5m, Some(0));
        assert_eq!(merged.txns_sell_5m, Some(4));
        assert_eq!(merged.buyers_5m, Some(7));
        assert_eq!(merged.sellers_5m, Some(3));
        assert_eq!(merged.buy_sell_pressure_5m, Some(-1.0));
    }

    #[test]
    fn pressure_boundaries() {
        let with_counts = |buys: Option<u64>, sells: Option<u64>| {
            let trades = TradeStats {
                buys,
                sells,
                ..TradeStats::default()
            };
            merge_enrichment(&base_snapshot(), None, None, Some(&trades)).buy_sell_pressure_5m
        };
        assert_eq!(with_counts(Some(0), Some(0)), None);
        assert_eq!(with_counts(None, None), None);
        assert_eq!(with_counts(Some(5), Some(0)), Some(1.0));
        assert_eq!(with_counts(Some(0), Some(5)), Some(-1.0));
        assert_eq!(with_counts(Some(30), Some(10)), Some(0.5));
    }

    #[test]
    fn cap_liq_ratio_prefers_mcap_then_fdv() {
        let snapshot = base_snapshot();
        let overview = OverviewData {
            market_cap: Some(400_000.0),
            fdv: Some(900_000.0),
            ..OverviewData::default()
        };
        let merged = merge_enrichment(&snapshot, Some(&overview), None, None);
        assert_eq!(merged.cap_liq_ratio, Some(80.0));

        let overview = OverviewData {
            market_cap: Some(0.0),
            fdv: Some(900_000.0),
            ..OverviewData::default()
        };
        let merged = merge_enrichment(&snapshot, Some(&overview), None, None);
        assert_eq!(merged.cap_liq_ratio, Some(180.0));
    }

    #[test]
    fn zero_liquidity_yields_no_ratio() {
        let mut snapshot = Snapshot::new("mint");
        snapshot.liquidity_usd = Some(0.0);
        snapshot.mcap_usd = Some(100_000.0);
        let merged = merge_enrichment(&snapshot, None, None, None);
        assert_eq!(merged.cap_liq_ratio, None);
    }

    #[test]
    fn scoring_outputs_are_attached_together() {
        let merged = merge_enrichment(&base_snapshot(), None, None, None);
        assert!(merged.score_local.is_some());
        assert!(merged.score_breakdown.is_some());
        assert!(merged.classification.is_some());
        let breakdown = merged.score_breakdown.expect("breakdown present");
        assert_eq!(breakdown.len(), 8);
    }
}
