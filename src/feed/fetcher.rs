// src/feed/fetcher.rs
use std::time::Duration;

use async_trait::async_trait;
use metrics::histogram;
use reqwest::Client;

use super::{decode, FeedSnapshot, FeedSource};
use crate::error::FeedError;

/// Basic-auth GET against `{base_url}/activity?maxItems=N`.
/// Holds one client for the life of the process so connections are reused.
pub struct HttpFeedSource {
    client: Client,
    url: String,
    username: String,
    password: String,
    max_items: u32,
}

impl HttpFeedSource {
    pub fn new(
        base_url: &str,
        username: impl Into<String>,
        password: impl Into<String>,
        max_items: u32,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: activity_url(base_url),
            username: username.into(),
            password: password.into(),
            max_items,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// `https://host/` and `https://host` both map to `https://host/activity`.
pub fn activity_url(base_url: &str) -> String {
    format!("{}/activity", base_url.trim_end_matches('/'))
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch_snapshot(&self) -> Result<FeedSnapshot, FeedError> {
        let t0 = std::time::Instant::now();

        let resp = self
            .client
            .get(&self.url)
            .query(&[("maxItems", self.max_items)])
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(FeedError::Request)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::HttpStatus(status.as_u16()));
        }

        let body = resp.bytes().await.map_err(FeedError::Request)?;
        histogram!("relay_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        tracing::debug!(bytes = body.len(), "feed fetched");

        decode(&body)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Serves the same document on every fetch. Used for dry runs and tests.
pub struct FixtureFeedSource {
    xml: String,
}

impl FixtureFeedSource {
    pub fn from_fixture(xml: &str) -> Self {
        Self {
            xml: xml.to_string(),
        }
    }
}

#[async_trait]
impl FeedSource for FixtureFeedSource {
    async fn fetch_snapshot(&self) -> Result<FeedSnapshot, FeedError> {
        decode(self.xml.as_bytes())
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
