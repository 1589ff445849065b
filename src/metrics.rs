use anyhow::Context;
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "trend_observations_total",
            "Observations fed through the trend detector."
        );
        describe_counter!(
            "trend_first_seen_total",
            "Observations for keys with no prior reading."
        );
        describe_counter!(
            "trend_candidates_total",
            "Trend candidates emitted above threshold."
        );
        describe_counter!(
            "trend_out_of_order_total",
            "Pairs skipped because the new reading was older."
        );
        describe_gauge!("trend_tracked_keys", "Distinct keys held by the store.");
        describe_counter!("ingest_items_total", "Listing items fetched from sources.");
        describe_counter!(
            "ingest_unchanged_total",
            "Items skipped because score and comments did not change."
        );
        describe_counter!(
            "ingest_malformed_total",
            "Items rejected for missing or invalid fields."
        );
        describe_counter!(
            "ingest_provider_errors_total",
            "Source fetch/parse errors."
        );
        describe_histogram!("ingest_fetch_ms", "Source fetch time in milliseconds.");
        describe_counter!("pipeline_runs_total", "Completed poll cycles.");
        describe_counter!(
            "pipeline_journal_errors_total",
            "Journal writes that failed and were skipped."
        );
        describe_gauge!(
            "pipeline_last_run_ts",
            "Unix ts when the pipeline last completed a cycle."
        );
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        router_for(self.handle.clone())
    }

    /// Serve `/metrics` on `addr` in the background.
    pub async fn serve(&self, addr: &str) -> anyhow::Result<tokio::task::JoinHandle<()>> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding metrics listener on {addr}"))?;
        let app = self.router();
        tracing::info!(target: "pipeline", %addr, "metrics endpoint up");
        Ok(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::warn!(target: "pipeline", error = %e, "metrics server stopped");
            }
        }))
    }
}

/// `/metrics` route over an existing handle; split out so tests can build one
/// without installing a global recorder.
pub fn router_for(handle: PrometheusHandle) -> Router {
    Router::new().route(
        "/metrics",
        get(move || {
            let h = handle.clone();
            async move { h.render() }
        }),
    )
}
