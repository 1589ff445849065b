// src/ingest/mod.rs
pub mod fixture;
pub mod reddit;
pub mod types;

use crate::ingest::types::ThreadSource;
use crate::state::SeenStore;
use crate::types::Observation;
use metrics::{counter, histogram};
use once_cell::sync::OnceCell;
use regex::Regex;

const MAX_TEXT_CHARS: usize = 10_000;

/// Normalize text: decode entities, unify quotes, collapse whitespace, cap length.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode (listing JSON escapes &, < and >)
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 3) Collapse whitespace
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("static regex"));
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 4) Length cap
    if out.chars().count() > MAX_TEXT_CHARS {
        out = out.chars().take(MAX_TEXT_CHARS).collect();
    }

    out
}

/// Result of one poll across all sources.
#[derive(Debug, Default)]
pub struct PollOutcome {
    pub observations: Vec<Observation>,
    pub unchanged: usize,
    pub malformed: usize,
    pub provider_errors: usize,
}

/// Poll every source once and turn changed items into observations.
///
/// Items whose score and comment count match the persisted state are dropped
/// here, so the detector only sees readings that moved. A malformed item or a
/// failing source is logged and skipped; the rest of the poll continues. The
/// seen-state is flushed once at the end.
pub async fn poll_once(
    sources: &[Box<dyn ThreadSource>],
    seen: &mut SeenStore,
    now: i64,
) -> PollOutcome {
    crate::metrics::ensure_metrics_described();
    seen.load();

    let mut outcome = PollOutcome::default();
    for source in sources {
        let t0 = std::time::Instant::now();
        let items = match source.fetch_listing().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(target: "ingest", error = ?e, source = source.name(), "source error");
                counter!("ingest_provider_errors_total").increment(1);
                outcome.provider_errors += 1;
                continue;
            }
        };
        histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        counter!("ingest_items_total").increment(items.len() as u64);

        for item in items {
            let thread = match item.and_then(|raw| raw.into_thread(now)) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(target: "ingest", error = %e, source = source.name(), "malformed item skipped");
                    outcome.malformed += 1;
                    continue;
                }
            };

            let obs = Observation::from_thread(now, thread);
            if !seen.is_changed(&obs.key, obs.score, obs.comment_count) {
                outcome.unchanged += 1;
                continue;
            }
            seen.update(&obs.key, obs.score, obs.comment_count, now);
            outcome.observations.push(obs);
        }
    }

    if let Err(e) = seen.save() {
        tracing::warn!(target: "state", error = ?e, "failed to flush seen state");
    }

    counter!("ingest_unchanged_total").increment(outcome.unchanged as u64);
    counter!("ingest_malformed_total").increment(outcome.malformed as u64);

    tracing::debug!(
        target: "ingest",
        accepted = outcome.observations.len(),
        unchanged = outcome.unchanged,
        malformed = outcome.malformed,
        provider_errors = outcome.provider_errors,
        "poll finished"
    );
    outcome
}
