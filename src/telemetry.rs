// src/telemetry.rs
//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise `rot_trends=info,warn`. Set
//! `ROT_LOG_FORMAT=json` for one JSON object per line.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_LOG_FORMAT: &str = "ROT_LOG_FORMAT";
const DEFAULT_FILTER: &str = "rot_trends=info,warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match std::env::var(ENV_LOG_FORMAT) {
            Ok(v) if v.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

/// Install the global subscriber. Errors if one is already set.
pub fn init_tracing() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(filter);
    let res = match LogFormat::from_env() {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
    };
    res.map_err(|e| anyhow::anyhow!("failed to init tracing: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn log_format_from_env() {
        std::env::set_var(ENV_LOG_FORMAT, "JSON");
        assert_eq!(LogFormat::from_env(), LogFormat::Json);
        std::env::set_var(ENV_LOG_FORMAT, "pretty");
        assert_eq!(LogFormat::from_env(), LogFormat::Compact);
        std::env::remove_var(ENV_LOG_FORMAT);
        assert_eq!(LogFormat::from_env(), LogFormat::Compact);
    }
}
