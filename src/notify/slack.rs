// src/notify/slack.rs
use std::time::Duration;

use reqwest::Client;

use super::{Dispatcher, NotificationPayload};
use crate::error::DeliveryError;

/// Posts attachments to a Slack incoming webhook.
#[derive(Clone)]
pub struct SlackDispatcher {
    webhook_url: String,
    client: Client,
}

impl SlackDispatcher {
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            webhook_url: webhook_url.into(),
            client: Client::builder().timeout(timeout).build()?,
        })
    }
}

#[async_trait::async_trait]
impl Dispatcher for SlackDispatcher {
    async fn dispatch(&self, title: &str, content: &str) -> Result<(), DeliveryError> {
        let message = NotificationPayload::new(title, content).to_message();
        tracing::debug!(payload = ?message, "posting to webhook");

        let resp = self
            .client
            .post(&self.webhook_url)
            .json(&message)
            .send()
            .await
            .map_err(DeliveryError::Request)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DeliveryError::HttpStatus(status.as_u16()));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "slack"
    }
}
