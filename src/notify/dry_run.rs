// src/notify/dry_run.rs
//! Dry-run dispatcher: logs the message instead of sending it.

use super::{Dispatcher, NotificationPayload};
use crate::error::DeliveryError;

#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunDispatcher;

#[async_trait::async_trait]
impl Dispatcher for DryRunDispatcher {
    async fn dispatch(&self, title: &str, content: &str) -> Result<(), DeliveryError> {
        let message = NotificationPayload::new(title, content).to_message();
        match serde_json::to_string(&message) {
            Ok(json) => tracing::info!(payload = %json, "dry run, not sending"),
            Err(e) => tracing::warn!(
                error = %e,
                payload = ?message,
                "dry run, payload not encodable"
            ),
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }
}
