// src/analyze/extract.rs
//! Event extraction from trending threads.
//!
//! The shipped strategy is a plain ticker scan: runs of 1-5 capital letters in
//! the title and body, minus a small stop list. It produces at most one
//! low-confidence `other` event per candidate. Swap in a real pipeline by
//! implementing `EventExtractor`.

use once_cell::sync::OnceCell;
use regex::Regex;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

use crate::types::{Event, EventType, Evidence, Horizon, Stance, TrendCandidate};

const MAX_ENTITIES: usize = 5;
const EXCERPT_CHARS: usize = 200;
const TICKER_CONFIDENCE: f64 = 0.3;

pub trait EventExtractor: Send + Sync {
    fn extract(&self, candidate: &TrendCandidate) -> Vec<Event>;
}

#[derive(Debug, Clone)]
pub struct TickerExtractor {
    stop_words: BTreeSet<String>,
}

impl Default for TickerExtractor {
    fn default() -> Self {
        Self::with_stop_words(["I", "A", "DD"])
    }
}

impl TickerExtractor {
    pub fn with_stop_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            stop_words: words.into_iter().map(Into::into).collect(),
        }
    }

    /// Sorted, unique ticker-like tokens in `text`.
    pub fn tickers(&self, text: &str) -> Vec<String> {
        static RE_TICKER: OnceCell<Regex> = OnceCell::new();
        let re = RE_TICKER.get_or_init(|| Regex::new(r"\b[A-Z]{1,5}\b").expect("static regex"));

        re.find_iter(text)
            .map(|m| m.as_str())
            .filter(|t| !self.stop_words.contains(*t))
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl EventExtractor for TickerExtractor {
    fn extract(&self, candidate: &TrendCandidate) -> Vec<Event> {
        let post = candidate.observation.post();
        let text = format!("{}\n{}", post.title, post.selftext);

        let mut entities = self.tickers(&text);
        if entities.is_empty() {
            return Vec::new();
        }
        entities.truncate(MAX_ENTITIES);

        let meta = BTreeMap::from([
            ("trend_score".to_string(), json!(candidate.trend_score)),
            (
                "features".to_string(),
                serde_json::to_value(&candidate.features).unwrap_or_default(),
            ),
        ]);

        vec![Event {
            event_type: EventType::Other,
            entities,
            stance: Stance::Unknown,
            time_horizon: Horizon::Unknown,
            evidence: vec![Evidence {
                post_id: post.id.clone(),
                permalink: post.permalink.clone(),
                subreddit: post.subreddit.clone(),
                excerpt: post.title.chars().take(EXCERPT_CHARS).collect(),
            }],
            confidence: TICKER_CONFIDENCE,
            meta,
        }]
    }
}
