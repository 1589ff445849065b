// src/trend/detector.rs
//! Rate-of-change trend detection.
//!
//! For every observation: swap it into the store, and if a prior reading
//! existed, score the pair as
//! `score_weight * Δscore/Δt + comment_weight * Δcomments/Δt`
//! with `Δt` floored at one second. Pairs at or above the threshold become
//! candidates, in input order.

use std::collections::BTreeMap;
use std::sync::Arc;

use metrics::{counter, gauge};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::trend::store::ObservationStore;
use crate::types::{Observation, TrendCandidate, TrendReason};

pub const FEATURE_SCORE_RATE: &str = "score_rate";
pub const FEATURE_COMMENT_RATE: &str = "comment_rate";

fn default_window_secs() -> u64 {
    1800
}
fn default_threshold() -> f64 {
    0.01
}
fn default_score_weight() -> f64 {
    1.0
}
fn default_comment_weight() -> f64 {
    2.0
}

/// What to do when a reading is older than the one it replaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutOfOrderPolicy {
    /// Swap the reading in but never emit a candidate for the pair.
    #[default]
    Skip,
    /// Treat the elapsed time as one second and score normally.
    Floor,
}

/// Detector settings. Build a detector through [`TrendDetector::new`], which
/// validates them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendConfig {
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_score_weight")]
    pub score_weight: f64,
    #[serde(default = "default_comment_weight")]
    pub comment_weight: f64,
    #[serde(default)]
    pub out_of_order: OutOfOrderPolicy,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            threshold: default_threshold(),
            score_weight: default_score_weight(),
            comment_weight: default_comment_weight(),
            out_of_order: OutOfOrderPolicy::default(),
        }
    }
}

impl TrendConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_secs == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        for (field, value) in [
            ("threshold", self.threshold),
            ("score_weight", self.score_weight),
            ("comment_weight", self.comment_weight),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field, value });
            }
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }
        Ok(())
    }
}

/// Rate features for one (previous, current) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateFeatures {
    /// Raw `current.timestamp - previous.timestamp`, may be zero or negative.
    pub elapsed_secs: i64,
    pub score_rate: f64,
    pub comment_rate: f64,
    pub trend_score: f64,
}

impl RateFeatures {
    pub fn is_out_of_order(&self) -> bool {
        self.elapsed_secs < 0
    }

    fn to_map(self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            (FEATURE_SCORE_RATE.to_string(), self.score_rate),
            (FEATURE_COMMENT_RATE.to_string(), self.comment_rate),
        ])
    }
}

pub struct TrendDetector {
    store: Arc<dyn ObservationStore>,
    cfg: TrendConfig,
}

impl std::fmt::Debug for TrendDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrendDetector")
            .field("cfg", &self.cfg)
            .field("tracked_keys", &self.store.len())
            .finish()
    }
}

impl TrendDetector {
    pub fn new(store: Arc<dyn ObservationStore>, cfg: TrendConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self { store, cfg })
    }

    pub fn config(&self) -> &TrendConfig {
        &self.cfg
    }

    /// Pure scoring of a pair; touches neither the store nor any counter.
    pub fn evaluate(&self, previous: &Observation, current: &Observation) -> RateFeatures {
        let elapsed_secs = current.timestamp.saturating_sub(previous.timestamp);
        let dt = elapsed_secs.max(1) as f64;
        let score_rate = current.score.saturating_sub(previous.score) as f64 / dt;
        let comment_rate =
            current.comment_count.saturating_sub(previous.comment_count) as f64 / dt;
        RateFeatures {
            elapsed_secs,
            score_rate,
            comment_rate,
            trend_score: self.cfg.score_weight * score_rate
                + self.cfg.comment_weight * comment_rate,
        }
    }

    /// Feed a batch through the store and collect the candidates it yields.
    ///
    /// Every observation updates the store, including those that produce no
    /// candidate.
    pub fn detect(&self, observations: &[Observation]) -> Vec<TrendCandidate> {
        crate::metrics::ensure_metrics_described();

        let mut out = Vec::new();
        let mut first_seen = 0u64;
        let mut out_of_order = 0u64;

        for obs in observations {
            let Some(prev) = self.store.update(&obs.key, obs.clone()) else {
                first_seen += 1;
                tracing::trace!(target: "trend", key = %obs.key, "first observation");
                continue;
            };

            let rates = self.evaluate(&prev, obs);
            if rates.is_out_of_order() && self.cfg.out_of_order == OutOfOrderPolicy::Skip {
                out_of_order += 1;
                tracing::debug!(
                    target: "trend",
                    key = %obs.key,
                    elapsed_secs = rates.elapsed_secs,
                    "out-of-order observation, pair not scored"
                );
                continue;
            }

            if rates.trend_score >= self.cfg.threshold {
                tracing::debug!(
                    target: "trend",
                    key = %obs.key,
                    trend_score = rates.trend_score,
                    score_rate = rates.score_rate,
                    comment_rate = rates.comment_rate,
                    "candidate"
                );
                out.push(TrendCandidate {
                    key: obs.key.clone(),
                    window_secs: self.cfg.window_secs,
                    features: rates.to_map(),
                    trend_score: rates.trend_score,
                    reason: TrendReason::RateThreshold,
                    observation: obs.clone(),
                });
            }
        }

        counter!("trend_observations_total").increment(observations.len() as u64);
        counter!("trend_first_seen_total").increment(first_seen);
        counter!("trend_out_of_order_total").increment(out_of_order);
        counter!("trend_candidates_total").increment(out.len() as u64);
        gauge!("trend_tracked_keys").set(self.store.len() as f64);

        out
    }
}
