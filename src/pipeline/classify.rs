//! Decision table mapping (score, flags) to a bucket.

use crate::types::{Classification, Flag};

/// Flags that discard a token outright, regardless of score.
const CRITICAL_FLAGS: [Flag; 3] = [Flag::MintEnabled, Flag::FreezeEnabled, Flag::TooNew];

/// Flags that keep a token out of the top bucket even on a high score.
const HIGH_POTENTIAL_BLOCKERS: [Flag; 4] = [
    Flag::LowLiq,
    Flag::WeakPressure,
    Flag::LowVolume5m,
    Flag::HighCapLiq,
];

const HIGH_POTENTIAL_SCORE: f64 = 72.0;
const WATCHLIST_SCORE: f64 = 55.0;

/// Evaluates the decision table top to bottom; first match wins.
pub fn classify(score: f64, flags: &[Flag]) -> Classification {
    if flags.iter().any(|f| CRITICAL_FLAGS.contains(f)) {
        return Classification::Discard;
    }
    if score >= HIGH_POTENTIAL_SCORE && !flags.iter().any(|f| HIGH_POTENTIAL_BLOCKERS.contains(f)) {
        return Classification::HighPotential;
    }
    if score >= WATCHLIST_SCORE {
        return Classification::Watchlist;
    }
    Classification::Discard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_table_rows() {
        assert_eq!(classify(80.0, &[]), Classification::HighPotential);
        assert_eq!(classify(60.0, &[]), Classification::Watchlist);
        assert_eq!(classify(40.0, &[]), Classification::Discard);
    }

    #[test]
    fn critical_flags_override_any_score() {
        assert_eq!(
            classify(95.0, &[Flag::MintEnabled]),
            Classification::Discard
        );
        assert_eq!(
            classify(95.0, &[Flag::FreezeEnabled]),
            Classification::Discard
        );
        assert_eq!(classify(95.0, &[Flag::TooNew]), Classification::Discard);
    }

    #[test]
    fn blockers_demote_high_scores_to_watchlist() {
        for blocker in HIGH_POTENTIAL_BLOCKERS {
            assert_eq!(classify(85.0, &[blocker]), Classification::Watchlist);
        }
        // non-blocking flags leave the top bucket reachable
        assert_eq!(
            classify(85.0, &[Flag::LowHolders, Flag::NoSocials]),
            Classification::HighPotential
        );
    }

    #[test]
    fn threshold_boundaries_are_inclusive() {
        assert_eq!(classify(72.0, &[]), Classification::HighPotential);
        assert_eq!(classify(71.99, &[]), Classification::Watchlist);
        assert_eq!(classify(55.0, &[]), Classification::Watchlist);
        assert_eq!(classify(54.99, &[]), Classification::Discard);
    }

    #[test]
    fn blocked_high_score_still_needs_watchlist_floor() {
        assert_eq!(classify(50.0, &[Flag::LowLiq]), Classification::Discard);
    }
}
