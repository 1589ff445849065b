// src/state.rs
//! Persisted "last seen" state: key → `{score, num_comments, last_seen_ts}`.
//!
//! Loaded lazily on first access, written once per poll cycle. A missing file
//! starts empty; a corrupt one is logged and also starts empty, never an error.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::Observation;

pub const DEFAULT_STATE_PATH: &str = "storage/seen_posts.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenRecord {
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: i64,
    #[serde(default)]
    pub last_seen_ts: i64,
}

#[derive(Debug)]
pub struct SeenStore {
    path: PathBuf,
    data: BTreeMap<String, SeenRecord>,
    loaded: bool,
}

impl SeenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            data: BTreeMap::new(),
            loaded: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file once; later calls are no-ops.
    pub fn load(&mut self) {
        if self.loaded {
            return;
        }
        self.loaded = true;

        let content = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) => {
                tracing::warn!(target: "state", path = %self.path.display(), error = %e, "state unreadable, starting empty");
                return;
            }
        };

        match serde_json::from_str::<BTreeMap<String, SeenRecord>>(&content) {
            Ok(map) => {
                tracing::debug!(target: "state", entries = map.len(), "seen state loaded");
                self.data = map;
            }
            Err(e) => {
                tracing::warn!(target: "state", path = %self.path.display(), error = %e, "state corrupt, starting empty");
                self.data.clear();
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating state dir {}", dir.display()))?;
        }
        let json = serde_json::to_vec_pretty(&self.data).context("serializing seen state")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }

    pub fn get(&mut self, key: &str) -> Option<SeenRecord> {
        self.load();
        self.data.get(key).copied()
    }

    pub fn update(&mut self, key: &str, score: i64, num_comments: i64, ts: i64) {
        self.load();
        self.data.insert(
            key.to_string(),
            SeenRecord {
                score,
                num_comments,
                last_seen_ts: ts,
            },
        );
    }

    /// True for unseen keys and for keys whose score or comment count moved.
    pub fn is_changed(&mut self, key: &str, score: i64, num_comments: i64) -> bool {
        match self.get(key) {
            None => true,
            Some(rec) => rec.score != score || rec.num_comments != num_comments,
        }
    }

    /// Last accepted reading per key, for seeding an observation store after a
    /// restart.
    pub fn observations(&mut self) -> Vec<Observation> {
        self.load();
        self.data
            .iter()
            .map(|(key, rec)| {
                Observation::from_counts(key, rec.last_seen_ts, rec.score, rec.num_comments)
            })
            .collect()
    }

    pub fn len(&mut self) -> usize {
        self.load();
        self.data.len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }
}
