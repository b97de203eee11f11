// src/error.rs
//! Error taxonomy for the steady-state polling path.
//!
//! Both enums are non-fatal: the sync loop logs them and keeps going.
//! Startup problems (config, client construction) surface as `anyhow` errors
//! from `main` instead.

use thiserror::Error;

/// The feed could not be fetched or did not decode as a feed document.
/// Aborts the current cycle only.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("feed responded with HTTP {0}")]
    HttpStatus(u16),
    #[error("feed body was empty")]
    EmptyBody,
    #[error("feed body is not valid UTF-8")]
    NotUtf8,
    #[error("document root is `{root}`, expected `feed`")]
    NotAFeed { root: String },
    #[error("malformed feed document: {0}")]
    Malformed(String),
}

/// The sink rejected or never received a notification.
/// Reported per entry; the cycle carries on with the next one.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("webhook request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("webhook responded with HTTP {0}")]
    HttpStatus(u16),
}

impl FeedError {
    /// Short label used as a metrics/log tag.
    pub fn kind(&self) -> &'static str {
        match self {
            FeedError::Request(_) => "request",
            FeedError::HttpStatus(_) => "http_status",
            FeedError::EmptyBody => "empty_body",
            FeedError::NotUtf8 => "not_utf8",
            FeedError::NotAFeed { .. } => "not_a_feed",
            FeedError::Malformed(_) => "malformed",
        }
    }
}
