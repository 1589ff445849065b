// src/ingest/types.rs
use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ObservationError;
use crate::ingest::normalize_text;
use crate::types::{Comment, Post, Thread};

pub const REDDIT_BASE: &str = "https://www.reddit.com";

/// One listing entry as fetched, before validation. Conversion can fail for
/// this item alone.
pub type ListingItem = std::result::Result<RawThread, ObservationError>;

#[async_trait::async_trait]
pub trait ThreadSource: Send + Sync {
    async fn fetch_listing(&self) -> Result<Vec<ListingItem>>;
    fn name(&self) -> &str;
}

/// Submission fields as the listing API returns them; everything optional so
/// one bad entry does not sink the whole page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPost {
    pub id: Option<String>,
    pub created_utc: Option<f64>,
    pub subreddit: Option<String>,
    pub title: Option<String>,
    pub selftext: Option<String>,
    pub url: Option<String>,
    pub score: Option<i64>,
    pub num_comments: Option<i64>,
    pub upvote_ratio: Option<f64>,
    pub author: Option<String>,
    pub permalink: Option<String>,
    pub link_flair_text: Option<String>,
    pub crosspost_parent: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawComment {
    pub id: Option<String>,
    pub created_utc: Option<f64>,
    pub author: Option<String>,
    pub body: Option<String>,
    pub score: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct RawThread {
    /// Subreddit the item was requested from; used when the item omits its own.
    pub namespace: String,
    pub post: RawPost,
    pub comments: Vec<RawComment>,
}

impl RawThread {
    /// Validate and normalize. `now` fills in a missing creation time.
    pub fn into_thread(self, now: i64) -> std::result::Result<Thread, ObservationError> {
        let p = self.post;
        let id = p
            .id
            .filter(|s| !s.trim().is_empty())
            .ok_or(ObservationError::MissingField("id"))?;
        let score = p.score.ok_or(ObservationError::MissingField("score"))?;
        let num_comments = p
            .num_comments
            .ok_or(ObservationError::MissingField("num_comments"))?;
        if num_comments < 0 {
            return Err(ObservationError::NegativeCount {
                id,
                field: "num_comments",
                value: num_comments,
            });
        }

        let post = Post {
            created_utc: p.created_utc.map(|t| t as i64).unwrap_or(now),
            subreddit: p
                .subreddit
                .filter(|s| !s.is_empty())
                .unwrap_or(self.namespace),
            title: normalize_text(p.title.as_deref().unwrap_or_default()),
            selftext: normalize_text(p.selftext.as_deref().unwrap_or_default()),
            url: p.url.unwrap_or_default(),
            score,
            num_comments,
            upvote_ratio: p.upvote_ratio,
            author: author_or_deleted(p.author),
            permalink: format!("{REDDIT_BASE}{}", p.permalink.unwrap_or_default()),
            flair: p.link_flair_text,
            is_crosspost: p.crosspost_parent.is_some(),
            id,
        };

        let top_comments = self
            .comments
            .into_iter()
            .map(|c| Comment {
                id: c.id.unwrap_or_default(),
                created_utc: c.created_utc.map(|t| t as i64).unwrap_or(now),
                author: author_or_deleted(c.author),
                body: normalize_text(c.body.as_deref().unwrap_or_default()),
                score: c.score.unwrap_or(0),
            })
            .collect();

        Ok(Thread { post, top_comments })
    }
}

fn author_or_deleted(author: Option<String>) -> String {
    author
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| "[deleted]".to_string())
}

/// Split a listing document (`{"kind":"Listing","data":{"children":[...]}}`)
/// into per-item results. Only `t3` (submission) children are kept.
pub fn parse_listing(doc: &Value, namespace: &str) -> anyhow::Result<Vec<ListingItem>> {
    let children = doc
        .pointer("/data/children")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow::anyhow!("listing without data.children"))?;

    let mut out = Vec::with_capacity(children.len());
    for child in children {
        if child.get("kind").and_then(Value::as_str) != Some("t3") {
            continue;
        }
        let item = match child.get("data") {
            None => Err(ObservationError::MissingField("data")),
            Some(data) => serde_json::from_value::<RawPost>(data.clone())
                .map(|post| RawThread {
                    namespace: namespace.to_string(),
                    post,
                    comments: Vec::new(),
                })
                .map_err(|e| ObservationError::Shape(e.to_string())),
        };
        out.push(item);
    }
    Ok(out)
}

/// Top-level comments (`t1`) from a comment listing, at most `limit`.
pub fn parse_comments(doc: &Value, limit: usize) -> Vec<RawComment> {
    doc.pointer("/data/children")
        .and_then(Value::as_array)
        .map(|children| {
            children
                .iter()
                .filter(|c| c.get("kind").and_then(Value::as_str) == Some("t1"))
                .filter_map(|c| c.get("data"))
                .filter_map(|d| serde_json::from_value::<RawComment>(d.clone()).ok())
                .take(limit)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(post: RawPost) -> RawThread {
        RawThread {
            namespace: "stocks".into(),
            post,
            comments: Vec::new(),
        }
    }

    fn complete() -> RawPost {
        RawPost {
            id: Some("abc".into()),
            score: Some(12),
            num_comments: Some(3),
            title: Some("NVDA &amp; AMD   up".into()),
            permalink: Some("/r/stocks/comments/abc/x/".into()),
            ..RawPost::default()
        }
    }

    #[test]
    fn converts_and_fills_defaults() {
        let t = raw(complete()).into_thread(500).unwrap();
        assert_eq!(t.post.id, "abc");
        assert_eq!(t.post.subreddit, "stocks");
        assert_eq!(t.post.created_utc, 500);
        assert_eq!(t.post.author, "[deleted]");
        assert_eq!(t.post.title, "NVDA & AMD up");
        assert_eq!(
            t.post.permalink,
            "https://www.reddit.com/r/stocks/comments/abc/x/"
        );
        assert!(!t.post.is_crosspost);
    }

    #[test]
    fn missing_numeric_fields_fail_the_item() {
        let mut p = complete();
        p.score = None;
        assert_eq!(
            raw(p).into_thread(0).unwrap_err(),
            ObservationError::MissingField("score")
        );

        let mut p = complete();
        p.num_comments = None;
        assert_eq!(
            raw(p).into_thread(0).unwrap_err(),
            ObservationError::MissingField("num_comments")
        );

        let mut p = complete();
        p.num_comments = Some(-4);
        assert!(matches!(
            raw(p).into_thread(0),
            Err(ObservationError::NegativeCount { .. })
        ));
    }

    #[test]
    fn listing_keeps_bad_children_as_errors() {
        let doc = json!({
            "kind": "Listing",
            "data": {"children": [
                {"kind": "t3", "data": {"id": "a", "score": 1, "num_comments": 0}},
                {"kind": "t3", "data": {"id": "b", "score": "lots", "num_comments": 0}},
                {"kind": "t1", "data": {"id": "c"}}
            ]}
        });
        let items = parse_listing(&doc, "stocks").unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(ObservationError::Shape(_))));
    }

    #[test]
    fn comments_are_capped() {
        let doc = json!({"data": {"children": [
            {"kind": "t1", "data": {"id": "1", "body": "one", "score": 3}},
            {"kind": "more", "data": {}},
            {"kind": "t1", "data": {"id": "2", "body": "two"}},
            {"kind": "t1", "data": {"id": "3", "body": "three"}}
        ]}});
        let cs = parse_comments(&doc, 2);
        assert_eq!(cs.len(), 2);
        assert_eq!(cs[1].id.as_deref(), Some("2"));
    }
}
