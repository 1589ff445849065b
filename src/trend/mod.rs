// src/trend/mod.rs
//! Trend engine: observation store + rate detector.

pub mod detector;
pub mod store;

pub use detector::{OutOfOrderPolicy, RateFeatures, TrendConfig, TrendDetector};
pub use store::{MemoryStore, ObservationStore};

use crate::types::TrendCandidate;

/// Top `n` candidates by trend score, highest first.
///
/// Equal scores keep their batch order (stable sort), so the ranking is fully
/// determined by the detector's output.
pub fn rank_candidates(candidates: &[TrendCandidate], n: usize) -> Vec<&TrendCandidate> {
    let mut ranked: Vec<&TrendCandidate> = candidates.iter().collect();
    ranked.sort_by(|a, b| b.trend_score.total_cmp(&a.trend_score));
    ranked.truncate(n);
    ranked
}
