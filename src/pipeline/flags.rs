//! Threshold rules producing the risk/quality flags.

use crate::types::{Flag, Snapshot};

const MIN_LIQUIDITY_USD: f64 = 3_000.0;
const MIN_HOLDERS: u64 = 200;
const MAX_CAP_LIQ_RATIO: f64 = 80.0;
const MIN_AGE_MINUTES: i64 = 30;
const WEAK_PRESSURE_FLOOR: f64 = -0.25;
const MIN_VOLUME_5M_USD: f64 = 1_500.0;
const FDV_VS_MCAP_MULTIPLE: f64 = 5.0;

/// Evaluates the fixed threshold table against a snapshot. Pure and
/// deterministic; flags co-occur freely. Unknown liquidity, holders and
/// 5m volume count against the token; unknown age, ratio and pressure do
/// not raise their flags.
pub fn compute_flags(snapshot: &Snapshot) -> Vec<Flag> {
    let mut flags = Vec::new();

    if snapshot.liquidity_usd.map_or(true, |v| v < MIN_LIQUIDITY_USD) {
        flags.push(Flag::LowLiq);
    }
    if snapshot.holders.map_or(true, |v| v < MIN_HOLDERS) {
        flags.push(Flag::LowHolders);
    }
    if snapshot
        .cap_liq_ratio
        .map_or(false, |v| v > MAX_CAP_LIQ_RATIO)
    {
        flags.push(Flag::HighCapLiq);
    }
    if !snapshot.has_socials() {
        flags.push(Flag::NoSocials);
    }
    if snapshot.age_minutes.map_or(false, |v| v < MIN_AGE_MINUTES) {
        flags.push(Flag::TooNew);
    }
    if snapshot
        .buy_sell_pressure_5m
        .map_or(false, |v| v < WEAK_PRESSURE_FLOOR)
    {
        flags.push(Flag::WeakPressure);
    }
    if snapshot.volume_usd_5m.map_or(true, |v| v < MIN_VOLUME_5M_USD) {
        flags.push(Flag::LowVolume5m);
    }
    if !snapshot.mint_authority_disabled {
        flags.push(Flag::MintEnabled);
    }
    if !snapshot.freeze_authority_disabled {
        flags.push(Flag::FreezeEnabled);
    }
    if let (Some(fdv), Some(mcap)) = (nonzero(snapshot.fdv_usd), nonzero(snapshot.mcap_usd)) {
        if fdv > FDV_VS_MCAP_MULTIPLE * mcap {
            flags.push(Flag::HighFdvVsMcap);
        }
    }

    flags
}

fn nonzero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}
