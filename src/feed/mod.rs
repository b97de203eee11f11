// src/feed/mod.rs
pub mod decode;
pub mod fetcher;

use chrono::{DateTime, Utc};

use crate::error::FeedError;

pub use decode::decode;

/// Category term that marks an entry as a comment.
pub const COMMENT_TERM: &str = "comment";

/// How an entry's `updated` timestamp came out of decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampDecode {
    Parsed,
    /// No `updated` element or attribute at all.
    Missing,
    /// Present but unparsable; raw value kept for logs.
    Malformed(String),
}

impl TimestampDecode {
    pub fn is_degraded(&self) -> bool {
        !matches!(self, TimestampDecode::Parsed)
    }
}

/// One activity entry, as decoded from a single fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: String,
    /// Raw HTML.
    pub title: String,
    /// Raw HTML.
    pub content: String,
    pub author_name: String,
    pub author_email: String,
    pub category_term: String,
    /// Unix epoch when `timestamp` is degraded.
    pub updated_at: DateTime<Utc>,
    pub timestamp: TimestampDecode,
}

impl Entry {
    pub fn is_comment(&self) -> bool {
        self.category_term == COMMENT_TERM
    }
}

/// Result of one fetch, entries in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedSnapshot {
    pub id: Option<String>,
    pub title: Option<String>,
    pub entries: Vec<Entry>,
}

/// Anything that can hand the sync engine a fresh snapshot.
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<FeedSnapshot, FeedError>;
    fn name(&self) -> &'static str;
}
