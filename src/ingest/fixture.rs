// src/ingest/fixture.rs
use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::ingest::types::{parse_listing, ListingItem, ThreadSource};

/// Serves a fixed listing document. Used by tests and offline dry runs.
pub struct FixtureSource {
    namespace: String,
    content: String,
}

impl FixtureSource {
    pub fn from_fixture(namespace: &str, content: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            content: content.to_string(),
        }
    }

    pub fn from_path(namespace: &str, path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixture {}", path.display()))?;
        Ok(Self::from_fixture(namespace, &content))
    }
}

#[async_trait]
impl ThreadSource for FixtureSource {
    async fn fetch_listing(&self) -> Result<Vec<ListingItem>> {
        let doc: serde_json::Value =
            serde_json::from_str(&self.content).context("parsing listing fixture")?;
        parse_listing(&doc, &self.namespace)
    }

    fn name(&self) -> &str {
        "fixture"
    }
}
