// src/config/reasoner.rs
use serde::{Deserialize, Serialize};
use std::env;

pub const ENV_DEEPSEEK_API_KEY: &str = "DEEPSEEK_API_KEY";

fn default_model() -> String {
    "deepseek-chat".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_timeout_secs() -> u64 {
    20
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasonerProvider {
    #[default]
    Stub,
    Deepseek,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonerConfig {
    #[serde(default)]
    pub provider: ReasonerProvider,
    #[serde(default = "default_model")]
    pub model: String,
    /// "ENV" means: read from DEEPSEEK_API_KEY
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            provider: ReasonerProvider::default(),
            model: default_model(),
            api_key: default_api_key(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ReasonerConfig {
    /// Resolve the key, following "ENV" to the environment. A missing env var
    /// with the stub provider is fine; with DeepSeek it is an error.
    pub fn resolved_api_key(&self) -> anyhow::Result<Option<String>> {
        let raw = self.api_key.trim();
        let key = if raw.eq_ignore_ascii_case("env") {
            env::var(ENV_DEEPSEEK_API_KEY)
                .ok()
                .filter(|k| !k.trim().is_empty())
        } else if raw.is_empty() {
            None
        } else {
            Some(raw.to_string())
        };

        match (self.provider, key) {
            (ReasonerProvider::Deepseek, None) => {
                anyhow::bail!("reasoner provider is deepseek but {ENV_DEEPSEEK_API_KEY} is not set")
            }
            (_, key) => Ok(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn env_key_resolution() {
        env::remove_var(ENV_DEEPSEEK_API_KEY);
        let stub = ReasonerConfig::default();
        assert_eq!(stub.resolved_api_key().unwrap(), None);

        let ds = ReasonerConfig {
            provider: ReasonerProvider::Deepseek,
            ..ReasonerConfig::default()
        };
        assert!(ds.resolved_api_key().is_err());

        env::set_var(ENV_DEEPSEEK_API_KEY, "sk-test");
        assert_eq!(ds.resolved_api_key().unwrap().as_deref(), Some("sk-test"));
        env::remove_var(ENV_DEEPSEEK_API_KEY);

        let literal = ReasonerConfig {
            provider: ReasonerProvider::Deepseek,
            api_key: "sk-inline".into(),
            ..ReasonerConfig::default()
        };
        assert_eq!(
            literal.resolved_api_key().unwrap().as_deref(),
            Some("sk-inline")
        );
    }
}
