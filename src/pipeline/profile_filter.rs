//! Tri-state screening of discovery-feed profiles.
//!
//! Each check passes, fails, or is unknown when the feed did not carry the
//! datum. A profile with a blacklisted description is rejected outright;
//! otherwise enough passing checks earn `ok` or `partial` status and the
//! failing check names travel with the signal.

use crate::types::{SignalStatus, TokenProfile};
use regex::RegexSet;

const MAX_TOKEN_AGE_SECONDS: i64 = 30 * 24 * 60 * 60;
const MIN_VOLUME_USD: f64 = 100.0;
const MIN_BUYERS_24H: i64 = 5;
const MIN_BUY_SELL_RATIO: f64 = 1.0;

/// Link types accepted as an official presence by the filter.
const OFFICIAL_LINK_KINDS: [&str; 5] = ["twitter", "telegram", "website", "discord", "x"];

const BLACKLIST_PATTERNS: [&str; 6] = [
    r"(?i)\btest\b",
    r"(?i)\brug\b",
    r"(?i)\bscam\b",
    r"(?i)\bairdrop\b",
    r"(?i)\bpump\b",
    r"(?i)\bdev\s+is\s+gone\b",
];

/// Outcome of screening one profile; rejected profiles yield no evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileEvaluation {
    pub status: SignalStatus,
    /// Names of the checks the profile failed
    pub failed: Vec<String>,
}

/// Screens discovery profiles against the fixed check set.
#[derive(Debug, Clone)]
pub struct ProfileFilter {
    blacklist: RegexSet,
}

impl ProfileFilter {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            blacklist: RegexSet::new(BLACKLIST_PATTERNS)?,
        })
    }

    /// Evaluates one profile. Returns `None` when the profile is rejected:
    /// a dirty description, or fewer than two passing checks.
    pub fn evaluate(&self, profile: &TokenProfile) -> Option<ProfileEvaluation> {
        let checks: [(&str, Option<bool>); 6] = [
            ("age", self.is_recent(profile)),
            ("volume", self.has_good_volume(profile)),
            ("links", self.has_official_links(profile)),
            ("buyers", self.has_active_buyers(profile)),
            ("buy_sell_ratio", self.has_good_buy_sell_ratio(profile)),
            ("description", self.has_clean_description(profile)),
        ];

        let passed = checks.iter().filter(|(_, v)| *v == Some(true)).count();
        let failed: Vec<String> = checks
            .iter()
            .filter(|(_, v)| *v == Some(false))
            .map(|(name, _)| name.to_string())
            .collect();

        if failed.iter().any(|name| name == "description") {
            return None;
        }
        let status = if passed >= 3 {
            SignalStatus::Ok
        } else if passed >= 2 {
            SignalStatus::Partial
        } else {
            return None;
        };
        Some(ProfileEvaluation { status, failed })
    }

    fn is_recent(&self, profile: &TokenProfile) -> Option<bool> {
        let seconds = profile.age.as_ref()?.seconds?;
        Some(seconds < MAX_TOKEN_AGE_SECONDS)
    }

    fn has_good_volume(&self, profile: &TokenProfile) -> Option<bool> {
        let h24 = profile.volume.as_ref()?.h24?;
        Some(h24 > MIN_VOLUME_USD)
    }

    fn has_official_links(&self, profile: &TokenProfile) -> Option<bool> {
        let found = profile.links.iter().any(|l| {
            l.kind_or_label()
                .map(|kind| OFFICIAL_LINK_KINDS.contains(&kind.as_str()))
                .unwrap_or(false)
                && l.url.as_deref().map(|u| !u.is_empty()).unwrap_or(false)
        });
        Some(found)
    }

    fn has_active_buyers(&self, profile: &TokenProfile) -> Option<bool> {
        let buys = profile.txns.as_ref()?.h24.as_ref()?.buys?;
        Some(buys >= MIN_BUYERS_24H)
    }

    fn has_good_buy_sell_ratio(&self, profile: &TokenProfile) -> Option<bool> {
        let window = profile.txns.as_ref()?.h24.as_ref()?;
        if window.buys.is_none() && window.sells.is_none() {
            return None;
        }
        let buys = window.buys.unwrap_or(0);
        let sells = window.sells.unwrap_or(0);
        if sells == 0 {
            return if buys > 0 { Some(true) } else { None };
        }
        Some(buys as f64 / sells.max(1) as f64 >= MIN_BUY_SELL_RATIO)
    }

    fn has_clean_description(&self, profile: &TokenProfile) -> Option<bool> {
        let description = profile.description.as_deref()?;
        Some(!self.blacklist.is_match(description))
    }
}

/// Convenience wrapper building a fresh filter; orchestration holds a
/// long-lived [`ProfileFilter`] instead.
pub fn evaluate_profile(profile: &TokenProfile) -> Option<ProfileEvaluation> {
    ProfileFilter::new().ok()?.evaluate(profile)
}
