//! Local scoring: metric normalization, fixed weights, bounded score.

use crate::types::Snapshot;
use std::collections::HashMap;

/// Scoring components, one per normalized metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Tradable liquidity in USD
    Liq,
    /// Quote volume over the last five minutes
    Vol5m,
    /// Buy/sell pressure over the last five minutes
    Pressure5m,
    /// Market cap vs liquidity ratio (lower is better)
    CapLiq,
    /// Holder count
    Holders,
    /// Minutes since listing
    Age,
    /// Both authorities revoked
    Authority,
    /// Official social link present
    Socials,
}

impl Feature {
    /// Returns the breakdown key for the feature.
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Liq => "liq",
            Feature::Vol5m => "vol_5m",
            Feature::Pressure5m => "pressure_5m",
            Feature::CapLiq => "cap_liq",
            Feature::Holders => "holders",
            Feature::Age => "age",
            Feature::Authority => "authority",
            Feature::Socials => "socials",
        }
    }

    /// Returns all scoring features.
    pub fn all() -> Vec<Feature> {
        vec![
            Feature::Liq,
            Feature::Vol5m,
            Feature::Pressure5m,
            Feature::CapLiq,
            Feature::Holders,
            Feature::Age,
            Feature::Authority,
            Feature::Socials,
        ]
    }
}

/// Unweighted per-feature scores, each in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureScores {
    scores: [f64; 8],
}

impl FeatureScores {
    pub fn new() -> Self {
        Self { scores: [0.0; 8] }
    }

    pub fn set(&mut self, feature: Feature, score: f64) {
        self.scores[feature as usize] = score;
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.scores[feature as usize]
    }

    /// Converts to the breakdown map exposed on the snapshot.
    pub fn to_hashmap(&self) -> HashMap<String, f64> {
        let mut map = HashMap::new();
        for feature in Feature::all() {
            map.insert(feature.as_str().to_string(), self.get(feature));
        }
        map
    }
}

impl Default for FeatureScores {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed feature weights; they sum to 1.0.
#[derive(Debug, Clone)]
pub struct FeatureWeights {
    pub liq: f64,
    pub vol_5m: f64,
    pub pressure_5m: f64,
    pub cap_liq: f64,
    pub holders: f64,
    pub age: f64,
    pub authority: f64,
    pub socials: f64,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self {
            liq: 0.18,
            vol_5m: 0.16,
            pressure_5m: 0.16,
            cap_liq: 0.14,
            holders: 0.12,
            age: 0.08,
            authority: 0.08,
            socials: 0.08,
        }
    }
}

impl FeatureWeights {
    pub fn for_feature(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Liq => self.liq,
            Feature::Vol5m => self.vol_5m,
            Feature::Pressure5m => self.pressure_5m,
            Feature::CapLiq => self.cap_liq,
            Feature::Holders => self.holders,
            Feature::Age => self.age,
            Feature::Authority => self.authority,
            Feature::Socials => self.socials,
        }
    }
}

// Normalization bounds
const LIQ_BOUNDS: (f64, f64) = (3_000.0, 50_000.0);
const VOL_5M_BOUNDS: (f64, f64) = (1_500.0, 50_000.0);
const HOLDERS_BOUNDS: (f64, f64) = (200.0, 5_000.0);
const CAP_LIQ_BOUNDS: (f64, f64) = (60.0, 100.0);
/// A null ratio scores as this worst-case stand-in.
const CAP_LIQ_UNKNOWN: f64 = 9_999.0;
const AGE_MIDPOINT_MINUTES: f64 = 120.0;
const AGE_WIDTH_MINUTES: f64 = 60.0;

/// Computes the bounded local score and its unweighted breakdown.
///
/// Returns `(score, breakdown)` with the score in [0, 100] rounded to two
/// decimals and every breakdown value in [0, 1].
pub fn compute_score(snapshot: &Snapshot) -> (f64, FeatureScores) {
    let weights = FeatureWeights::default();
    let mut scores = FeatureScores::new();

    scores.set(
        Feature::Liq,
        minmax(snapshot.liquidity_usd, LIQ_BOUNDS.0, LIQ_BOUNDS.1),
    );
    scores.set(
        Feature::Vol5m,
        minmax(snapshot.volume_usd_5m, VOL_5M_BOUNDS.0, VOL_5M_BOUNDS.1),
    );
    // neutral when unknown
    let pressure = snapshot.buy_sell_pressure_5m.unwrap_or(0.0);
    scores.set(Feature::Pressure5m, clamp((pressure + 1.0) / 2.0, 0.0, 1.0));
    let ratio = snapshot.cap_liq_ratio.unwrap_or(CAP_LIQ_UNKNOWN);
    scores.set(
        Feature::CapLiq,
        1.0 - minmax(Some(ratio), CAP_LIQ_BOUNDS.0, CAP_LIQ_BOUNDS.1),
    );
    scores.set(
        Feature::Holders,
        minmax(
            snapshot.holders.map(|h| h as f64),
            HOLDERS_BOUNDS.0,
            HOLDERS_BOUNDS.1,
        ),
    );
    let age = snapshot.age_minutes.unwrap_or(0) as f64;
    scores.set(
        Feature::Age,
        logistic(age, AGE_MIDPOINT_MINUTES, AGE_WIDTH_MINUTES),
    );
    let authority_ok = snapshot.mint_authority_disabled && snapshot.freeze_authority_disabled;
    scores.set(Feature::Authority, if authority_ok { 1.0 } else { 0.0 });
    scores.set(
        Feature::Socials,
        if snapshot.has_socials() { 1.0 } else { 0.0 },
    );

    let weighted: f64 = Feature::all()
        .into_iter()
        .map(|f| weights.for_feature(f) * scores.get(f))
        .sum();
    let score = round2(100.0 * clamp(weighted, 0.0, 1.0));
    (score, scores)
}

fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
    x.max(lo).min(hi)
}

/// Linear min-max to [0, 1]; null scores 0.
fn minmax(x: Option<f64>, lo: f64, hi: f64) -> f64 {
    let Some(x) = x else { return 0.0 };
    if hi <= lo {
        return 0.0;
    }
    clamp((x - lo) / (hi - lo), 0.0, 1.0)
}

/// Logistic S-curve centered at `mid`; saturates `width` minutes out.
fn logistic(x: f64, mid: f64, width: f64) -> f64 {
    1.0 / (1.0 + (-((x - mid) / width.max(1e-9))).exp())
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
