// tests/ingest_trends.rs
use std::path::PathBuf;
use std::sync::Arc;

use rot_trends::ingest::fixture::FixtureSource;
use rot_trends::ingest::poll_once;
use rot_trends::ingest::types::ThreadSource;
use rot_trends::state::SeenStore;
use rot_trends::{rank_candidates, MemoryStore, TrendConfig, TrendDetector};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn sources(name: &str) -> Vec<Box<dyn ThreadSource>> {
    vec![Box::new(
        FixtureSource::from_path("wallstreetbets", &fixture(name)).unwrap(),
    )]
}

#[tokio::test]
async fn malformed_items_are_skipped_and_unchanged_items_deduped() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state/seen.json");
    let mut seen = SeenStore::new(&state_path);

    let first = poll_once(&sources("reddit_listing.json"), &mut seen, 1_000).await;
    assert_eq!(first.observations.len(), 2);
    assert_eq!(first.malformed, 1);
    assert_eq!(first.provider_errors, 0);

    let post = first.observations[0].post();
    assert_eq!(first.observations[0].key, "wallstreetbets:1a2b3c");
    assert_eq!(post.title, "GME & AMC squeeze talk is back");
    assert_eq!(post.selftext, "Short interest looks high on GME.");
    assert_eq!(first.observations[1].post().author, "[deleted]");
    assert!(state_path.exists());

    // Same listing again: nothing moved.
    let again = poll_once(&sources("reddit_listing.json"), &mut seen, 1_020).await;
    assert!(again.observations.is_empty());
    assert_eq!(again.unchanged, 2);

    // A fresh store over the same file sees the persisted state.
    let mut reloaded = SeenStore::new(&state_path);
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded.get("wallstreetbets:1a2b3c").unwrap().score, 120);
}

#[tokio::test]
async fn rising_thread_becomes_the_top_candidate() {
    let dir = tempfile::tempdir().unwrap();
    let mut seen = SeenStore::new(dir.path().join("seen.json"));
    let detector =
        TrendDetector::new(Arc::new(MemoryStore::new()), TrendConfig::default()).unwrap();

    let first = poll_once(&sources("reddit_listing.json"), &mut seen, 1_000).await;
    assert!(detector.detect(&first.observations).is_empty());

    let later = poll_once(&sources("reddit_listing_later.json"), &mut seen, 1_060).await;
    // Only the thread whose numbers changed is passed on.
    assert_eq!(later.observations.len(), 1);
    assert_eq!(later.unchanged, 1);

    let candidates = detector.detect(&later.observations);
    assert_eq!(candidates.len(), 1);
    let c = &candidates[0];
    // (420 - 120) / 60 = 5, (100 - 40) / 60 = 1, 5 + 2 * 1 = 7
    assert_eq!(c.feature("score_rate"), Some(5.0));
    assert_eq!(c.feature("comment_rate"), Some(1.0));
    assert_eq!(c.trend_score, 7.0);
    assert_eq!(c.reason.as_str(), "rate_threshold");
    assert_eq!(c.window_secs, 1800);

    let top = rank_candidates(&candidates, 3);
    assert_eq!(top[0].key, "wallstreetbets:1a2b3c");
}

#[tokio::test]
async fn broken_source_does_not_stop_the_poll() {
    let dir = tempfile::tempdir().unwrap();
    let mut seen = SeenStore::new(dir.path().join("seen.json"));

    let mut srcs = sources("reddit_listing.json");
    srcs.insert(
        0,
        Box::new(FixtureSource::from_fixture("stocks", "{ not json")),
    );
    let out = poll_once(&srcs, &mut seen, 1_000).await;
    assert_eq!(out.provider_errors, 1);
    assert_eq!(out.observations.len(), 2);
}

#[tokio::test]
async fn restart_scores_first_pair_against_persisted_reading() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("seen.json");

    // First process: one poll, state flushed, then gone.
    {
        let mut seen = SeenStore::new(&state_path);
        let detector =
            TrendDetector::new(Arc::new(MemoryStore::new()), TrendConfig::default()).unwrap();
        let first = poll_once(&sources("reddit_listing.json"), &mut seen, 1_000).await;
        assert!(detector.detect(&first.observations).is_empty());
    }

    // Second process: store rebuilt from the seen file.
    let mut seen = SeenStore::new(&state_path);
    let store = MemoryStore::from_observations(seen.observations());
    let detector = TrendDetector::new(Arc::new(store), TrendConfig::default()).unwrap();

    let later = poll_once(&sources("reddit_listing_later.json"), &mut seen, 1_060).await;
    assert_eq!(later.observations.len(), 1);

    let candidates = detector.detect(&later.observations);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].key, "wallstreetbets:1a2b3c");
    assert_eq!(candidates[0].trend_score, 7.0);
    // The candidate carries the fresh thread, not the rebuilt one.
    assert_eq!(
        candidates[0].observation.post().title,
        "GME & AMC squeeze talk is back"
    );
}
