//! The local evaluation pipeline: normalize -> merge -> flags -> score ->
//! classify, plus the discovery-feed profile filter.
//!
//! Everything here is a pure function over snapshot values; network fetches
//! live in `crate::sources` and orchestration in `crate::engine`.

pub mod classify;
pub mod flags;
pub mod merge;
pub mod normalizer;
pub mod profile_filter;
pub mod score;

// Re-export the pipeline surface
pub use classify::classify;
pub use flags::compute_flags;
pub use merge::{attach_scoring, merge_enrichment, OverviewData, TradeStats, VolumePoint, VolumeSeries};
pub use normalizer::{normalize_meta, MetaPayload};
pub use profile_filter::{evaluate_profile, ProfileEvaluation, ProfileFilter};
pub use score::{compute_score, Feature, FeatureScores, FeatureWeights};
