//! Outbound alert delivery
//!
//! Alerts are best-effort: callers dispatch them through
//! [`crate::dispatch::spawn_detached`] and never await the outcome.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, WardenError};

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str) -> Result<()>;
}

/// Notifier used when no alert destination is configured
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, message: &str) -> Result<()> {
        debug!(len = message.len(), "Alert dropped: no notifier configured");
        Ok(())
    }
}

/// Posts alerts to a Slack-compatible incoming webhook
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
}

impl WebhookNotifier {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, message: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { text: message })
            .send()
            .await
            .map_err(|e| WardenError::Notify(format!("Webhook request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(WardenError::Notify(format!(
                "Webhook returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}
