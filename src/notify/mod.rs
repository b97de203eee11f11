// src/notify/mod.rs
pub mod dry_run;
pub mod slack;

use serde::Serialize;

use crate::error::DeliveryError;
use crate::sanitize::unescape_newlines;

pub use dry_run::DryRunDispatcher;
pub use slack::SlackDispatcher;

/// Attachment color used for every relayed comment.
pub const ATTACHMENT_COLOR: &str = "#0000D0";

/// What one notification shows. Built fresh for each qualifying entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub fallback: String,
    pub pretext: String,
    pub body: String,
}

impl NotificationPayload {
    /// `title` and `content` are already sanitized.
    pub fn new(title: &str, content: &str) -> Self {
        Self {
            fallback: title.to_string(),
            pretext: title.to_string(),
            body: content.to_string(),
        }
    }

    /// Webhook JSON shape. Sanitized text carries `\n` as a two-char escape;
    /// serde escapes on its own, so the escapes are turned back into real
    /// newlines here.
    pub fn to_message(&self) -> WebhookMessage {
        WebhookMessage {
            attachments: vec![Attachment {
                fallback: unescape_newlines(&self.fallback),
                pretext: unescape_newlines(&self.pretext),
                color: ATTACHMENT_COLOR.to_string(),
                fields: vec![AttachmentField {
                    value: unescape_newlines(&self.body),
                    short: false,
                }],
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WebhookMessage {
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Attachment {
    pub fallback: String,
    pub pretext: String,
    pub color: String,
    pub fields: Vec<AttachmentField>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AttachmentField {
    pub value: String,
    pub short: bool,
}

/// Delivers one notification. Implementations do not retry.
#[async_trait::async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, title: &str, content: &str) -> Result<(), DeliveryError>;
    fn name(&self) -> &'static str;
}
