// src/lib.rs
// Public library surface for the `rot` binary and integration tests.

pub mod analyze;
pub mod config;
pub mod error;
pub mod ingest;
pub mod journal;
pub mod metrics;
pub mod pipeline;
pub mod state;
pub mod telemetry;
pub mod trend;
pub mod types;

// ---- Re-exports for stable public API ----
pub use crate::config::AppConfig;
pub use crate::error::{ConfigError, ObservationError};
pub use crate::pipeline::{PipelineRunner, RunSummary};
pub use crate::trend::{
    rank_candidates, MemoryStore, ObservationStore, OutOfOrderPolicy, TrendConfig, TrendDetector,
};
pub use crate::types::{Observation, TrendCandidate};
