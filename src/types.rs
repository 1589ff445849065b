// src/types.rs
//! Shared records: thread payloads, observations, trend candidates and the
//! downstream event / reasoning / trade-idea shapes written to the journal.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One submission as returned by the listing API, after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub created_utc: i64,
    pub subreddit: String,
    pub title: String,
    pub selftext: String,
    pub url: String,
    pub score: i64,
    pub num_comments: i64,
    pub upvote_ratio: Option<f64>,
    pub author: String,
    /// Absolute link (`https://www.reddit.com/r/...`).
    pub permalink: String,
    pub flair: Option<String>,
    pub is_crosspost: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub created_utc: i64,
    pub author: String,
    pub body: String,
    pub score: i64,
}

/// Source payload carried by an observation. Opaque to the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub post: Post,
    #[serde(default)]
    pub top_comments: Vec<Comment>,
}

/// Engagement reading for one tracked entity at one point in time.
///
/// The payload sits behind an `Arc`: candidates and journal records point at
/// the same thread instead of cloning it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub key: String,
    /// Unix seconds.
    pub timestamp: i64,
    pub score: i64,
    pub comment_count: i64,
    pub payload: Arc<Thread>,
}

impl Observation {
    /// Key for an item inside a namespace, e.g. `wallstreetbets:abc123`.
    pub fn compose_key(namespace: &str, item_id: &str) -> String {
        format!("{namespace}:{item_id}")
    }

    pub fn from_thread(timestamp: i64, thread: Thread) -> Self {
        let key = Self::compose_key(&thread.post.subreddit, &thread.post.id);
        Self {
            key,
            timestamp,
            score: thread.post.score,
            comment_count: thread.post.num_comments,
            payload: Arc::new(thread),
        }
    }

    /// Reading rebuilt from persisted counts only. The payload carries the id
    /// and subreddit split from `key` and the counts; text fields are empty.
    pub fn from_counts(key: &str, timestamp: i64, score: i64, comment_count: i64) -> Self {
        let (subreddit, id) = key.split_once(':').unwrap_or(("", key));
        let post = Post {
            id: id.to_string(),
            created_utc: timestamp,
            subreddit: subreddit.to_string(),
            title: String::new(),
            selftext: String::new(),
            url: String::new(),
            score,
            num_comments: comment_count,
            upvote_ratio: None,
            author: "[deleted]".to_string(),
            permalink: String::new(),
            flair: None,
            is_crosspost: false,
        };
        Self {
            key: key.to_string(),
            timestamp,
            score,
            comment_count,
            payload: Arc::new(Thread {
                post,
                top_comments: Vec::new(),
            }),
        }
    }

    pub fn post(&self) -> &Post {
        &self.payload.post
    }
}

/// Symbolic tag for the rule that produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendReason {
    RateThreshold,
}

impl TrendReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendReason::RateThreshold => "rate_threshold",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendCandidate {
    pub key: String,
    /// Configured lookback in seconds (informational).
    pub window_secs: u64,
    pub features: BTreeMap<String, f64>,
    pub trend_score: f64,
    pub reason: TrendReason,
    pub observation: Observation,
}

impl TrendCandidate {
    pub fn feature(&self, name: &str) -> Option<f64> {
        self.features.get(name).copied()
    }
}

// ---------------------------------------------------------------------------
// Downstream records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    EarningsRumor,
    ProductNews,
    Regulatory,
    SqueezeChatter,
    Macro,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    Bullish,
    Bearish,
    Mixed,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Horizon {
    #[serde(rename = "intraday")]
    Intraday,
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "earnings")]
    Earnings,
    #[serde(rename = "longer")]
    Longer,
    #[serde(rename = "unknown")]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub post_id: String,
    pub permalink: String,
    pub subreddit: String,
    pub excerpt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: EventType,
    pub entities: Vec<String>,
    pub stance: Stance,
    pub time_horizon: Horizon,
    pub evidence: Vec<Evidence>,
    /// In `[0, 1]`.
    pub confidence: f64,
    #[serde(default)]
    pub meta: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningPacket {
    pub thesis: String,
    pub catalyst_window: String,
    pub market_expectation: String,
    pub invalidations: Vec<String>,
    pub recommended_structures: Vec<String>,
    pub risk_notes: Vec<String>,
    #[serde(default)]
    pub raw: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    DebitSpread,
    Calendar,
    Straddle,
    Strangle,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Call,
    Put,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionLeg {
    pub side: LegSide,
    pub kind: OptionKind,
    pub strike: f64,
    pub expiry: String,
    pub qty: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeIdea {
    pub underlying: String,
    pub strategy: Strategy,
    pub legs: Vec<OptionLeg>,
    pub max_loss: f64,
    pub thesis: String,
    pub time_stop: String,
    pub quality_score: f64,
    #[serde(default)]
    pub do_not_trade_reasons: Vec<String>,
    #[serde(default)]
    pub meta: BTreeMap<String, Value>,
}
