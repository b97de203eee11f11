// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use comment_relay::error::{DeliveryError, FeedError};
use comment_relay::feed::{Entry, FeedSnapshot, FeedSource, TimestampDecode};
use comment_relay::notify::Dispatcher;
use parking_lot::Mutex;

pub const ACTIVITY_XML: &str = include_str!("../fixtures/activity.xml");

pub fn entry(id: &str, term: &str, updated_at: DateTime<Utc>) -> Entry {
    Entry {
        id: id.into(),
        title: format!("<b>{id}</b> title"),
        content: format!("<p>body of {id}</p>"),
        author_name: "Alice".into(),
        author_email: "alice@example.com".into(),
        category_term: term.into(),
        updated_at,
        timestamp: TimestampDecode::Parsed,
    }
}

/// Hands out queued results in order; repeats the last one when drained.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<FeedSnapshot, FeedError>>>,
    pub fetches: Mutex<usize>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<FeedSnapshot, FeedError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fetches: Mutex::new(0),
        }
    }

    pub fn always(entries: Vec<Entry>) -> Self {
        Self::new(vec![Ok(snapshot(entries))])
    }

    pub fn fetch_count(&self) -> usize {
        *self.fetches.lock()
    }
}

pub fn snapshot(entries: Vec<Entry>) -> FeedSnapshot {
    FeedSnapshot {
        id: None,
        title: None,
        entries,
    }
}

fn clone_result(r: &Result<FeedSnapshot, FeedError>) -> Result<FeedSnapshot, FeedError> {
    match r {
        Ok(s) => Ok(s.clone()),
        Err(FeedError::HttpStatus(c)) => Err(FeedError::HttpStatus(*c)),
        Err(_) => Err(FeedError::EmptyBody),
    }
}

#[async_trait::async_trait]
impl FeedSource for ScriptedSource {
    async fn fetch_snapshot(&self) -> Result<FeedSnapshot, FeedError> {
        *self.fetches.lock() += 1;
        let mut script = self.script.lock();
        if script.len() > 1 {
            script.pop_front().unwrap_or(Err(FeedError::EmptyBody))
        } else {
            script
                .front()
                .map(clone_result)
                .unwrap_or(Err(FeedError::EmptyBody))
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Records every dispatch; fails for titles containing `fail_marker`.
#[derive(Default)]
pub struct RecordingDispatcher {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail_marker: Option<String>,
}

impl RecordingDispatcher {
    pub fn failing_on(marker: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_marker: Some(marker.to_string()),
        }
    }

    pub fn titles(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(t, _)| t.clone()).collect()
    }
}

#[async_trait::async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn dispatch(&self, title: &str, content: &str) -> Result<(), DeliveryError> {
        self.sent.lock().push((title.to_string(), content.to_string()));
        match &self.fail_marker {
            Some(m) if title.contains(m.as_str()) => Err(DeliveryError::HttpStatus(500)),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Serve an axum router on an ephemeral local port.
pub async fn serve(app: axum::Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}
