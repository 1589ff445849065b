// src/error.rs
//! Typed failures of the trend core.
//!
//! Two kinds only: a bad configuration (fatal when the detector is built) and a
//! malformed observation (fails the single item, the rest of the batch goes on).
//! Everything else the engine meets (empty batch, unseen key, zero delta) is a
//! normal outcome and has no variant here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("`{field}` must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("`{field}` must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("`window_secs` must be greater than zero")]
    ZeroWindow,

    #[error("reading config from {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config {path}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ObservationError {
    #[error("item is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("item has an unreadable shape: {0}")]
    Shape(String),

    #[error("item `{id}` has negative `{field}` ({value})")]
    NegativeCount {
        id: String,
        field: &'static str,
        value: i64,
    },
}
