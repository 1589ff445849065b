// src/pipeline.rs
//! Poll → detect → extract → reason → trade-idea cycle, journaled per run.

use anyhow::Result;
use chrono::Utc;
use metrics::{counter, gauge};
use serde::Serialize;
use tokio::time;

use crate::analyze::extract::{EventExtractor, TickerExtractor};
use crate::analyze::reasoner::DynReasoner;
use crate::analyze::scoring::{EventScorer, PassThroughScorer};
use crate::analyze::trade::TradeBuilder;
use crate::ingest::poll_once;
use crate::ingest::types::ThreadSource;
use crate::journal::{
    JsonlJournal, STREAM_CANDIDATES, STREAM_EVENTS, STREAM_REASONING, STREAM_SNAPSHOTS,
    STREAM_TRADE_IDEAS,
};
use crate::state::SeenStore;
use crate::trend::{rank_candidates, TrendDetector};
use crate::types::{Event, Observation, ReasoningPacket, TradeIdea, TrendCandidate};

const DEFAULT_TOP_N: usize = 3;

/// Counts for one completed cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub snapshots: usize,
    pub candidates: usize,
    pub events: usize,
    pub trade_ideas: usize,
}

// --- journal line shapes ---

#[derive(Serialize)]
struct SnapshotRecord<'a> {
    run_id: &'a str,
    snapshot: &'a Observation,
}

#[derive(Serialize)]
struct CandidateRecord<'a> {
    run_id: &'a str,
    candidate: &'a TrendCandidate,
}

#[derive(Serialize)]
struct EventRecord<'a> {
    run_id: &'a str,
    event: &'a Event,
}

#[derive(Serialize)]
struct ReasoningRecord<'a> {
    run_id: &'a str,
    event: &'a Event,
    packet: &'a ReasoningPacket,
}

#[derive(Serialize)]
struct TradeIdeaRecord<'a> {
    run_id: &'a str,
    trade_idea: &'a TradeIdea,
}

pub struct PipelineRunner {
    sources: Vec<Box<dyn ThreadSource>>,
    seen: SeenStore,
    detector: TrendDetector,
    extractor: Box<dyn EventExtractor>,
    scorer: Box<dyn EventScorer>,
    reasoner: DynReasoner,
    trades: TradeBuilder,
    journal: JsonlJournal,
    top_n: usize,
}

impl PipelineRunner {
    pub fn new(
        sources: Vec<Box<dyn ThreadSource>>,
        seen: SeenStore,
        detector: TrendDetector,
        reasoner: DynReasoner,
        journal: JsonlJournal,
    ) -> Self {
        Self {
            sources,
            seen,
            detector,
            extractor: Box::new(TickerExtractor::default()),
            scorer: Box::new(PassThroughScorer),
            reasoner,
            trades: TradeBuilder,
            journal,
            top_n: DEFAULT_TOP_N,
        }
    }

    pub fn with_extractor(mut self, extractor: Box<dyn EventExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_scorer(mut self, scorer: Box<dyn EventScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_top_n(mut self, n: usize) -> Self {
        self.top_n = n;
        self
    }

    pub fn journal(&self) -> &JsonlJournal {
        &self.journal
    }

    /// Append to the journal. A failed write is logged and counted; the cycle
    /// goes on, since its readings are already marked seen.
    fn record<T: Serialize>(&self, stream: &str, record: &T) {
        if let Err(e) = self.journal.write(stream, record) {
            counter!("pipeline_journal_errors_total").increment(1);
            tracing::warn!(target: "pipeline", stream, "journal write failed: {e:#}");
        }
    }

    /// One cycle stamped with the current wall clock.
    pub async fn run_once(&mut self) -> Result<RunSummary> {
        self.run_once_at(Utc::now().timestamp()).await
    }

    /// One cycle with an explicit poll time (unix seconds).
    pub async fn run_once_at(&mut self, now: i64) -> Result<RunSummary> {
        let run_id = format!("run_{now}");

        let outcome = poll_once(&self.sources, &mut self.seen, now).await;
        for snapshot in &outcome.observations {
            self.record(
                STREAM_SNAPSHOTS,
                &SnapshotRecord {
                    run_id: &run_id,
                    snapshot,
                },
            );
        }

        let candidates = self.detector.detect(&outcome.observations);
        for candidate in &candidates {
            self.record(
                STREAM_CANDIDATES,
                &CandidateRecord {
                    run_id: &run_id,
                    candidate,
                },
            );
        }
        for (rank, c) in rank_candidates(&candidates, self.top_n)
            .into_iter()
            .enumerate()
        {
            tracing::info!(
                target: "pipeline",
                rank = rank + 1,
                key = %c.key,
                trend_score = c.trend_score,
                title = %c.observation.post().title,
                "top candidate"
            );
        }

        let mut events = 0usize;
        let mut trade_ideas = 0usize;
        for candidate in &candidates {
            for event in self.extractor.extract(candidate) {
                let event = self.scorer.score(event);
                self.record(
                    STREAM_EVENTS,
                    &EventRecord {
                        run_id: &run_id,
                        event: &event,
                    },
                );
                events += 1;

                let packet = self.reasoner.reason(&event).await;
                self.record(
                    STREAM_REASONING,
                    &ReasoningRecord {
                        run_id: &run_id,
                        event: &event,
                        packet: &packet,
                    },
                );

                for idea in self.trades.build(&packet, &event) {
                    self.record(
                        STREAM_TRADE_IDEAS,
                        &TradeIdeaRecord {
                            run_id: &run_id,
                            trade_idea: &idea,
                        },
                    );
                    trade_ideas += 1;
                }
            }
        }

        counter!("pipeline_runs_total").increment(1);
        gauge!("pipeline_last_run_ts").set(now as f64);

        let summary = RunSummary {
            run_id,
            snapshots: outcome.observations.len(),
            candidates: candidates.len(),
            events,
            trade_ideas,
        };
        tracing::info!(
            target: "pipeline",
            run_id = %summary.run_id,
            snapshots = summary.snapshots,
            candidates = summary.candidates,
            events = summary.events,
            trade_ideas = summary.trade_ideas,
            reasoner = self.reasoner.provider_name(),
            "run finished"
        );
        Ok(summary)
    }

    /// Run forever on a fixed cadence. A failed cycle is logged; the loop goes on.
    pub async fn run_loop(&mut self, interval: std::time::Duration) {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = self.run_once().await {
                tracing::warn!(target: "pipeline", "pipeline cycle failed: {e:#}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::reasoner::StubReasoner;
    use crate::ingest::types::ListingItem;
    use crate::trend::{MemoryStore, TrendConfig};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    /// Serves one post whose score grows by 50 on every fetch.
    struct GrowingSource {
        score: AtomicI64,
    }

    #[async_trait]
    impl ThreadSource for GrowingSource {
        async fn fetch_listing(&self) -> Result<Vec<ListingItem>> {
            let score = self.score.fetch_add(50, Ordering::SeqCst);
            let doc = json!({"data": {"children": [{"kind": "t3", "data": {
                "id": "abc", "subreddit": "stocks", "title": "NVDA earnings run",
                "selftext": "", "score": score, "num_comments": 4,
                "created_utc": 1_700_000_000.0, "permalink": "/r/stocks/comments/abc/x/"
            }}]}});
            crate::ingest::types::parse_listing(&doc, "stocks")
        }
        fn name(&self) -> &str {
            "growing"
        }
    }

    fn runner(dir: &std::path::Path) -> PipelineRunner {
        let detector =
            TrendDetector::new(Arc::new(MemoryStore::new()), TrendConfig::default()).unwrap();
        PipelineRunner::new(
            vec![Box::new(GrowingSource {
                score: AtomicI64::new(100),
            })],
            SeenStore::new(dir.join("seen.json")),
            detector,
            Arc::new(StubReasoner),
            JsonlJournal::new(dir.join("journal")),
        )
    }

    fn lines(path: std::path::PathBuf) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn journal_failures_do_not_drop_readings() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = runner(dir.path());
        // A plain file where the journal directory should be.
        let blocked = dir.path().join("blocked");
        std::fs::write(&blocked, "x").unwrap();
        r.journal = JsonlJournal::new(&blocked);

        let first = r.run_once_at(1_000).await.unwrap();
        assert_eq!(first.snapshots, 1);
        let second = r.run_once_at(1_010).await.unwrap();
        assert_eq!(second.candidates, 1);
        assert_eq!(second.trade_ideas, 1);
    }

    #[tokio::test]
    async fn first_run_only_snapshots_second_run_trends() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = runner(dir.path());

        let first = r.run_once_at(1_000).await.unwrap();
        assert_eq!(first.run_id, "run_1000");
        assert_eq!(first.snapshots, 1);
        assert_eq!(first.candidates, 0);

        let second = r.run_once_at(1_010).await.unwrap();
        assert_eq!(second.snapshots, 1);
        assert_eq!(second.candidates, 1);
        assert_eq!(second.events, 1);
        assert_eq!(second.trade_ideas, 1);

        let j = r.journal();
        assert_eq!(lines(j.stream_path(STREAM_SNAPSHOTS)).len(), 2);
        let cands = lines(j.stream_path(STREAM_CANDIDATES));
        assert_eq!(cands.len(), 1);
        assert_eq!(cands[0]["run_id"], json!("run_1010"));
        assert_eq!(cands[0]["candidate"]["key"], json!("stocks:abc"));
        // (150 - 100) / 10
        assert_eq!(cands[0]["candidate"]["features"]["score_rate"], json!(5.0));

        let ideas = lines(j.stream_path(STREAM_TRADE_IDEAS));
        assert_eq!(ideas[0]["trade_idea"]["underlying"], json!("NVDA"));
        let reasoning = lines(j.stream_path(STREAM_REASONING));
        assert_eq!(reasoning[0]["packet"]["raw"]["stub"], json!(true));
    }
}
