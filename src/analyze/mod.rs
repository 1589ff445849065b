// src/analyze/mod.rs
//! Downstream of the detector: candidate → events → reasoning → trade ideas.

pub mod extract;
pub mod reasoner;
pub mod scoring;
pub mod trade;

pub use extract::{EventExtractor, TickerExtractor};
pub use reasoner::{build_reasoner, DeepSeekReasoner, DynReasoner, Reasoner, StubReasoner};
pub use scoring::{EventScorer, PassThroughScorer};
pub use trade::TradeBuilder;
