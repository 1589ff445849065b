//! `rot` binary: polls the configured subreddits and journals trend candidates
//! plus the downstream event / reasoning / trade-idea records.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rot_trends::analyze::build_reasoner;
use rot_trends::config::AppConfig;
use rot_trends::ingest::reddit::{RedditClient, RedditCredentials, RedditSource};
use rot_trends::journal::JsonlJournal;
use rot_trends::metrics::Metrics;
use rot_trends::pipeline::PipelineRunner;
use rot_trends::state::SeenStore;
use rot_trends::telemetry::init_tracing;
use rot_trends::trend::{MemoryStore, ObservationStore, TrendDetector};

#[derive(Parser, Debug)]
#[command(name = "rot", version, about = "Reddit trend detector")]
struct Cli {
    /// Config file (overrides $ROT_CONFIG_PATH and config/rot.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single poll cycle and exit
    Once,
    /// Poll forever
    Loop {
        /// Seconds between cycles (defaults to [runner].interval_secs)
        #[arg(long)]
        interval: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    init_tracing()?;

    let cfg = AppConfig::load(cli.config.as_deref()).context("loading config")?;

    // Keep the server task alive for the whole run.
    let _metrics_task = match cfg.metrics.listen_addr.as_deref() {
        Some(addr) => {
            let m = Metrics::init()?;
            Some(m.serve(addr).await?)
        }
        None => None,
    };

    let mut runner = build_runner(&cfg)?;

    match cli.command {
        Command::Once => {
            let summary = runner.run_once().await?;
            println!("{}", serde_json::to_string(&summary)?);
        }
        Command::Loop { interval } => {
            let secs = interval.unwrap_or(cfg.runner.interval_secs).max(1);
            tracing::info!(target: "pipeline", interval_secs = secs, "starting poll loop");
            tokio::select! {
                _ = runner.run_loop(Duration::from_secs(secs)) => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!(target: "pipeline", "shutdown requested");
                }
            }
        }
    }

    Ok(())
}

fn build_runner(cfg: &AppConfig) -> anyhow::Result<PipelineRunner> {
    // Seed the detector with the persisted readings so the first pair after a
    // restart is scored against them.
    let mut seen = SeenStore::new(&cfg.storage.state_path);
    let store = MemoryStore::from_observations(seen.observations());
    tracing::info!(target: "state", restored = store.len(), "observation store seeded");
    let detector = TrendDetector::new(Arc::new(store), cfg.trend)?;

    let creds = RedditCredentials::from_env()?;
    let client = Arc::new(RedditClient::new(creds)?);
    let sources =
        RedditSource::for_subreddits(client, &cfg.reddit.subreddits, &cfg.reddit.settings());

    let reasoner = build_reasoner(&cfg.reasoner)?;
    tracing::info!(
        target: "pipeline",
        subreddits = ?cfg.reddit.subreddits,
        reasoner = reasoner.provider_name(),
        threshold = cfg.trend.threshold,
        "pipeline configured"
    );

    Ok(PipelineRunner::new(
        sources,
        seen,
        detector,
        reasoner,
        JsonlJournal::new(&cfg.storage.root),
    )
    .with_top_n(cfg.runner.top_n))
}
