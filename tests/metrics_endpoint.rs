// tests/metrics_endpoint.rs
use std::sync::Arc;

use axum::body::{self, Body};
use http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusBuilder;
use tower::ServiceExt;

use rot_trends::metrics::router_for;
use rot_trends::types::{Post, Thread};
use rot_trends::{MemoryStore, Observation, TrendConfig, TrendDetector};

fn obs(ts: i64, score: i64, comments: i64) -> Observation {
    let post = Post {
        id: "m1".into(),
        created_utc: 0,
        subreddit: "stocks".into(),
        title: "AMD".into(),
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

#[tokio::test]
async fn metrics_endpoint_renders_detector_series() {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    let detector =
        TrendDetector::new(Arc::new(MemoryStore::new()), TrendConfig::default()).unwrap();
    metrics::with_local_recorder(&recorder, || {
        detector.detect(&[obs(100, 10, 2)]);
        detector.detect(&[obs(160, 190, 62)]);
        // Older than the stored reading: skipped by default.
        assert!(detector.detect(&[obs(130, 500, 90)]).is_empty());
    });

    let app = router_for(handle);
    let resp = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // axum::body::to_bytes requires an explicit limit
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    for needle in [
        "trend_observations_total 3",
        "trend_first_seen_total 1",
        "trend_candidates_total 1",
        "trend_out_of_order_total 1",
        "trend_tracked_keys 1",
    ] {
        assert!(text.contains(needle), "missing `{needle}` in:\n{text}");
    }
}

#[tokio::test]
async fn unknown_path_is_404() {
    let handle = PrometheusBuilder::new().build_recorder().handle();
    let resp = router_for(handle)
        .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
