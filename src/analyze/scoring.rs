//! Event scoring seam.
//!
//! Credibility scoring is not done here; the default scorer only clamps the
//! confidence into `[0, 1]` and passes the event through.

use crate::types::Event;

pub trait EventScorer: Send + Sync {
    fn score(&self, event: Event) -> Event;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughScorer;

impl EventScorer for PassThroughScorer {
    fn score(&self, mut event: Event) -> Event {
        event.confidence = if event.confidence.is_finite() {
            event.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        event
    }
}
