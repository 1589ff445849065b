// src/config/mod.rs
//! Application configuration (TOML).
//!
//! Lookup: `$ROT_CONFIG_PATH`, else `config/rot.toml`. A missing default file
//! means built-in defaults; a missing file named explicitly is an error.
//! Trend settings are validated here, so a bad threshold or weight stops the
//! process before the first poll.

pub mod reasoner;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::ingest::reddit::{Listing, SubredditSettings};
use crate::state::DEFAULT_STATE_PATH;
use crate::trend::TrendConfig;
use reasoner::ReasonerConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/rot.toml";
pub const ENV_CONFIG_PATH: &str = "ROT_CONFIG_PATH";
pub const ENV_TREND_THRESHOLD: &str = "ROT_TREND_THRESHOLD";
pub const ENV_INTERVAL_SECS: &str = "ROT_INTERVAL_SECS";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub reddit: RedditConfig,
    #[serde(default)]
    pub trend: TrendConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub reasoner: ReasonerConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

fn default_subreddits() -> Vec<String> {
    vec!["wallstreetbets".to_string(), "stocks".to_string()]
}
fn default_limit() -> u32 {
    50
}
fn default_top_comments() -> usize {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditConfig {
    #[serde(default = "default_subreddits")]
    pub subreddits: Vec<String>,
    #[serde(default)]
    pub listing: Listing,
    #[serde(default = "default_limit")]
    pub limit_per_sub: u32,
    #[serde(default)]
    pub include_comments: bool,
    #[serde(default = "default_top_comments")]
    pub top_comments: usize,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            subreddits: default_subreddits(),
            listing: Listing::default(),
            limit_per_sub: default_limit(),
            include_comments: false,
            top_comments: default_top_comments(),
        }
    }
}

impl RedditConfig {
    pub fn settings(&self) -> SubredditSettings {
        SubredditSettings {
            listing: self.listing,
            limit: self.limit_per_sub,
            include_comments: self.include_comments,
            top_comments: self.top_comments,
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("storage")
}
fn default_state_path() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_PATH)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for the JSONL journal streams.
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            state_path: default_state_path(),
        }
    }
}

fn default_interval_secs() -> u64 {
    20
}
fn default_top_n() -> usize {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// How many top candidates to log per cycle.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            top_n: default_top_n(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// e.g. "127.0.0.1:9100"; unset means no endpoint.
    #[serde(default)]
    pub listen_addr: Option<String>,
}

impl AppConfig {
    pub fn from_toml_str(s: &str, origin: &str) -> Result<Self, ConfigError> {
        let cfg: AppConfig = toml::from_str(s).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })?;
        cfg.trend.validate()?;
        Ok(cfg)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    /// Resolve the file (explicit path, env, default), then apply env overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from);
        let mut cfg = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(p) => Self::load_from_file(&p)?,
            None => {
                let p = PathBuf::from(DEFAULT_CONFIG_PATH);
                if p.exists() {
                    Self::load_from_file(&p)?
                } else {
                    tracing::debug!("no config file, using defaults");
                    Self::default()
                }
            }
        };
        cfg.apply_env_overrides()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(raw) = std::env::var(ENV_TREND_THRESHOLD) {
            // Unparsable values become NaN and fail validation below.
            self.trend.threshold = raw.trim().parse::<f64>().unwrap_or(f64::NAN);
        }
        if let Some(secs) = std::env::var(ENV_INTERVAL_SECS)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.runner.interval_secs = secs.max(1);
        }
        self.trend.validate()
    }
}
