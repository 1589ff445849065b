// src/journal.rs
//! Append-only JSONL journal: one file per stream under a root directory.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const STREAM_SNAPSHOTS: &str = "snapshots";
pub const STREAM_CANDIDATES: &str = "trend_candidates";
pub const STREAM_EVENTS: &str = "events";
pub const STREAM_REASONING: &str = "reasoning";
pub const STREAM_TRADE_IDEAS: &str = "trade_ideas";

#[derive(Debug, Clone)]
pub struct JsonlJournal {
    root: PathBuf,
}

impl JsonlJournal {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn stream_path(&self, stream: &str) -> PathBuf {
        self.root.join(format!("{stream}.jsonl"))
    }

    /// Append `record` as one JSON line to `{root}/{stream}.jsonl`.
    pub fn write<T: Serialize + ?Sized>(&self, stream: &str, record: &T) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("creating journal dir {}", self.root.display()))?;
        let mut line = serde_json::to_vec(record).context("serializing journal record")?;
        line.push(b'\n');

        let path = self.stream_path(stream);
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        f.write_all(&line)
            .with_context(|| format!("appending to {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn appends_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let j = JsonlJournal::new(dir.path().join("storage"));
        j.write(STREAM_EVENTS, &json!({"run_id": "run_1", "n": 1}))
            .unwrap();
        j.write(STREAM_EVENTS, &json!({"run_id": "run_1", "n": 2}))
            .unwrap();

        let text = fs::read_to_string(j.stream_path(STREAM_EVENTS)).unwrap();
        let lines: Vec<Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["n"], json!(2));
    }
}
