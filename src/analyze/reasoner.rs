//! Reasoner: provider abstraction over "explain this event" calls.
//!
//! The stub answers with a fixed cautionary packet. The DeepSeek provider asks
//! the chat-completions API for the same shape as a JSON object and falls back
//! to the stub packet on any failure.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::reasoner::{ReasonerConfig, ReasonerProvider};
use crate::types::{Event, ReasoningPacket};

const DEEPSEEK_URL: &str = "https://api.deepseek.com/chat/completions";
const MAX_FIELD_CHARS: usize = 400;
const MAX_LIST_ITEMS: usize = 6;

#[async_trait]
pub trait Reasoner: Send + Sync {
    async fn reason(&self, event: &Event) -> ReasoningPacket;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

/// Convenient alias used by callers.
pub type DynReasoner = Arc<dyn Reasoner>;

/// Factory: build a reasoner according to config.
pub fn build_reasoner(cfg: &ReasonerConfig) -> anyhow::Result<DynReasoner> {
    match cfg.provider {
        ReasonerProvider::Stub => Ok(Arc::new(StubReasoner)),
        ReasonerProvider::Deepseek => {
            let key = cfg.resolved_api_key()?.unwrap_or_default();
            Ok(Arc::new(DeepSeekReasoner::new(
                key,
                &cfg.model,
                Duration::from_secs(cfg.timeout_secs),
            )?))
        }
    }
}

/// Fixed placeholder packet naming the event's entities.
pub fn stub_packet(event: &Event) -> ReasoningPacket {
    ReasoningPacket {
        thesis: format!(
            "Reddit chatter mentions {}; treat as unverified.",
            event.entities.join(", ")
        ),
        catalyst_window: "unknown".to_string(),
        market_expectation: "unclear; watch implied volatility + liquidity".to_string(),
        invalidations: vec![
            "No corroboration across sources".to_string(),
            "Trend decays within hours".to_string(),
        ],
        recommended_structures: vec![
            "debit_spread (defined risk)".to_string(),
            "calendar (if catalyst known)".to_string(),
        ],
        risk_notes: vec!["Do not trade without market data gates".to_string()],
        raw: BTreeMap::from([("stub".to_string(), Value::Bool(true))]),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StubReasoner;

#[async_trait]
impl Reasoner for StubReasoner {
    async fn reason(&self, event: &Event) -> ReasoningPacket {
        stub_packet(event)
    }
    fn provider_name(&self) -> &'static str {
        "stub"
    }
}

/// DeepSeek chat-completions provider.
pub struct DeepSeekReasoner {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl DeepSeekReasoner {
    pub fn new(api_key: String, model: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("rot-trends/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            api_key,
            model: model.to_string(),
            endpoint: DEEPSEEK_URL.to_string(),
        })
    }

    /// Point at a different base URL (self-hosted gateway, tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn call(&self, event: &Event) -> anyhow::Result<ReasoningPacket> {
        if self.api_key.is_empty() {
            anyhow::bail!("no api key");
        }

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: String,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
            response_format: Value,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let sys = "You review social-media chatter about listed companies. Reply with ONE JSON object \
                   with keys: thesis (string), catalyst_window (string), market_expectation (string), \
                   invalidations (array of strings), recommended_structures (array of strings), \
                   risk_notes (array of strings). Be skeptical; the chatter is unverified.";
        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: sys.to_string(),
                },
                Msg {
                    role: "user",
                    content: serde_json::to_string(event)?,
                },
            ],
            temperature: 0.2,
            max_tokens: 600,
            response_format: json!({"type": "json_object"}),
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?
            .error_for_status()?;
        let body: Resp = resp.json().await?;
        let content = body
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or("");
        parse_packet(content, &self.model)
    }
}

#[async_trait]
impl Reasoner for DeepSeekReasoner {
    async fn reason(&self, event: &Event) -> ReasoningPacket {
        match self.call(event).await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(target: "reasoner", error = %e, "deepseek call failed, using stub packet");
                let mut p = stub_packet(event);
                p.raw
                    .insert("fallback".to_string(), Value::String(e.to_string()));
                p
            }
        }
    }
    fn provider_name(&self) -> &'static str {
        "deepseek"
    }
}

/// Model reply as we accept it; every field optional.
#[derive(Debug, Default, Deserialize)]
struct PacketReply {
    #[serde(default)]
    thesis: String,
    #[serde(default)]
    catalyst_window: String,
    #[serde(default)]
    market_expectation: String,
    #[serde(default)]
    invalidations: Vec<String>,
    #[serde(default)]
    recommended_structures: Vec<String>,
    #[serde(default)]
    risk_notes: Vec<String>,
}

/// Parse and sanitize a model reply into a packet. An empty thesis is an error.
pub fn parse_packet(content: &str, model: &str) -> anyhow::Result<ReasoningPacket> {
    let reply: PacketReply = serde_json::from_str(content.trim())?;
    let thesis = sanitize(&reply.thesis);
    if thesis.is_empty() {
        anyhow::bail!("reply without thesis");
    }
    let list = |v: Vec<String>| -> Vec<String> {
        v.iter()
            .map(|s| sanitize(s))
            .filter(|s| !s.is_empty())
            .take(MAX_LIST_ITEMS)
            .collect()
    };
    let or_unknown = |s: &str| {
        let s = sanitize(s);
        if s.is_empty() {
            "unknown".to_string()
        } else {
            s
        }
    };
    Ok(ReasoningPacket {
        thesis,
        catalyst_window: or_unknown(&reply.catalyst_window),
        market_expectation: or_unknown(&reply.market_expectation),
        invalidations: list(reply.invalidations),
        recommended_structures: list(reply.recommended_structures),
        risk_notes: list(reply.risk_notes),
        raw: BTreeMap::from([("model".to_string(), Value::String(model.to_string()))]),
    })
}

/// Single line, collapsed whitespace, capped length.
fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len().min(MAX_FIELD_CHARS));
    for word in input.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    if out.chars().count() > MAX_FIELD_CHARS {
        out = out.chars().take(MAX_FIELD_CHARS).collect();
    }
    out
}
