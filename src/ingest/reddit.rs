// src/ingest/reddit.rs
//! Reddit listing source over the OAuth API (application-only, client
//! credentials). One `RedditSource` per subreddit, all sharing a client and
//! its cached token, so a failing subreddit does not take the others down.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::ingest::types::{parse_comments, parse_listing, ListingItem, RawThread, ThreadSource};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";

pub const ENV_CLIENT_ID: &str = "ROT_REDDIT_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "ROT_REDDIT_CLIENT_SECRET";
pub const ENV_USER_AGENT: &str = "ROT_REDDIT_USER_AGENT";

/// Which listing to page through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Listing {
    Rising,
    #[default]
    Hot,
    New,
    Top,
}

impl Listing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Listing::Rising => "rising",
            Listing::Hot => "hot",
            Listing::New => "new",
            Listing::Top => "top",
        }
    }
}

#[derive(Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl std::fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &self.client_id)
            .field("secret_len", &self.client_secret.len())
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl RedditCredentials {
    /// Read all three credentials from the environment; any missing one is an error.
    pub fn from_env() -> Result<Self> {
        let get = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
        };
        match (get(ENV_CLIENT_ID), get(ENV_CLIENT_SECRET), get(ENV_USER_AGENT)) {
            (Some(client_id), Some(client_secret), Some(user_agent)) => Ok(Self {
                client_id,
                client_secret,
                user_agent,
            }),
            _ => bail!(
                "missing Reddit creds: set {ENV_CLIENT_ID}, {ENV_CLIENT_SECRET}, {ENV_USER_AGENT}"
            ),
        }
    }
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

/// Shared HTTP client with token cache.
pub struct RedditClient {
    http: reqwest::Client,
    creds: RedditCredentials,
    token: Mutex<Option<AccessToken>>,
}

impl RedditClient {
    pub fn new(creds: RedditCredentials) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(creds.user_agent.clone())
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .build()
            .context("building reddit http client")?;
        Ok(Self {
            http,
            creds,
            token: Mutex::new(None),
        })
    }

    async fn bearer(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        if let Some(tok) = guard.as_ref() {
            if tok.expires_at > Instant::now() {
                return Ok(tok.value.clone());
            }
        }

        #[derive(Deserialize)]
        struct TokenResp {
            access_token: String,
            #[serde(default = "default_expiry")]
            expires_in: u64,
        }
        fn default_expiry() -> u64 {
            3600
        }

        let resp: TokenResp = self
            .http
            .post(TOKEN_URL)
            .basic_auth(&self.creds.client_id, Some(&self.creds.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .context("reddit token request")?
            .error_for_status()
            .context("reddit token status")?
            .json()
            .await
            .context("reddit token body")?;

        // Refresh a minute early.
        let ttl = Duration::from_secs(resp.expires_in.saturating_sub(60).max(1));
        let value = resp.access_token;
        *guard = Some(AccessToken {
            value: value.clone(),
            expires_at: Instant::now() + ttl,
        });
        tracing::debug!(target: "ingest", ttl_secs = ttl.as_secs(), "reddit token refreshed");
        Ok(value)
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let token = self.bearer().await?;
        let url = format!("{API_BASE}{path}");
        self.http
            .get(&url)
            .bearer_auth(token)
            .query(&[("raw_json", "1".to_string())])
            .query(query)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url} status"))?
            .json()
            .await
            .with_context(|| format!("GET {url} body"))
    }

    pub async fn listing(&self, subreddit: &str, listing: Listing, limit: u32) -> Result<Value> {
        self.get_json(
            &format!("/r/{subreddit}/{}", listing.as_str()),
            &[("limit", limit.to_string())],
        )
        .await
    }

    /// Comment page for one post; the second element of the response is the
    /// comment listing.
    pub async fn comments(&self, post_id: &str, limit: usize) -> Result<Value> {
        let doc = self
            .get_json(
                &format!("/comments/{post_id}"),
                &[("limit", limit.to_string()), ("depth", "1".to_string())],
            )
            .await?;
        doc.get(1)
            .cloned()
            .ok_or_else(|| anyhow!("comment page without comment listing"))
    }
}

#[derive(Debug, Clone)]
pub struct SubredditSettings {
    pub listing: Listing,
    pub limit: u32,
    pub include_comments: bool,
    pub top_comments: usize,
}

pub struct RedditSource {
    client: Arc<RedditClient>,
    subreddit: String,
    settings: SubredditSettings,
}

impl RedditSource {
    pub fn new(client: Arc<RedditClient>, subreddit: &str, settings: SubredditSettings) -> Self {
        Self {
            client,
            subreddit: subreddit.to_string(),
            settings,
        }
    }

    /// One source per subreddit, sharing a single client.
    pub fn for_subreddits(
        client: Arc<RedditClient>,
        subreddits: &[String],
        settings: &SubredditSettings,
    ) -> Vec<Box<dyn ThreadSource>> {
        subreddits
            .iter()
            .map(|s| {
                Box::new(RedditSource::new(client.clone(), s, settings.clone()))
                    as Box<dyn ThreadSource>
            })
            .collect()
    }

    async fn attach_comments(&self, raw: &mut RawThread) {
        let Some(id) = raw.post.id.clone() else {
            return;
        };
        match self.client.comments(&id, self.settings.top_comments).await {
            Ok(doc) => raw.comments = parse_comments(&doc, self.settings.top_comments),
            Err(e) => {
                tracing::debug!(target: "ingest", post = %id, error = %e, "comments unavailable");
            }
        }
    }
}

#[async_trait]
impl ThreadSource for RedditSource {
    async fn fetch_listing(&self) -> Result<Vec<ListingItem>> {
        let doc = self
            .client
            .listing(&self.subreddit, self.settings.listing, self.settings.limit)
            .await?;
        let mut items = parse_listing(&doc, &self.subreddit)?;

        if self.settings.include_comments && self.settings.top_comments > 0 {
            for raw in items.iter_mut().flatten() {
                self.attach_comments(raw).await;
            }
        }
        Ok(items)
    }

    fn name(&self) -> &str {
        &self.subreddit
    }
}
