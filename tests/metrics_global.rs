// tests/metrics_global.rs
// Own test binary: installs the process-wide Prometheus recorder.
use std::sync::Arc;

use rot_trends::metrics::Metrics;
use rot_trends::types::{Post, Thread};
use rot_trends::{MemoryStore, Observation, TrendConfig, TrendDetector};

fn obs(ts: i64, score: i64, comments: i64) -> Observation {
    let post = Post {
        id: "g1".into(),
        created_utc: 0,
        subreddit: "stocks".into(),
        title: "TSLA".into(),
        selftext: String::new(),
        url: String::new(),
        score,
        num_comments: comments,
        upvote_ratio: None,
        author: "tester".into(),
        permalink: String::new(),
        flair: None,
        is_crosspost: false,
    };
    Observation::from_thread(
        ts,
        Thread {
            post,
            top_comments: Vec::new(),
        },
    )
}

#[test]
fn installed_recorder_sees_crate_counters() {
    let m = Metrics::init().expect("install recorder");

    let detector =
        TrendDetector::new(Arc::new(MemoryStore::new()), TrendConfig::default()).unwrap();
    assert!(detector.detect(&[obs(100, 10, 2)]).is_empty());
    assert_eq!(detector.detect(&[obs(160, 190, 62)]).len(), 1);

    let text = m.handle.render();
    for needle in ["trend_candidates_total 1", "trend_observations_total 2"] {
        assert!(text.contains(needle), "missing `{needle}` in:\n{text}");
    }
}
