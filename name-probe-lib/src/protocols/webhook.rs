//! Webhook notifications for available names.
//!
//! Sends a Discord-style embed to a configured webhook. Delivery is best
//! effort: callers log failures and carry on.

use crate::error::ProbeError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Embed color for available names (green).
pub const AVAILABLE_COLOR: u32 = 0x00FF00;

/// Footer text attached to every notification.
pub const FOOTER_TEXT: &str = "name-probe";

/// Something that wants to hear about available names.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_available(&self, name: &str) -> Result<(), ProbeError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookFooter {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEmbed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub footer: WebhookFooter,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub embeds: Vec<WebhookEmbed>,
}

impl WebhookPayload {
    /// Payload announcing that `name` is available.
    pub fn available(name: &str, at: DateTime<Utc>) -> Self {
        Self {
            content: None,
            embeds: vec![WebhookEmbed {
                title: format!("**{}**", name),
                description: "Username is available!".to_string(),
                color: AVAILABLE_COLOR,
                footer: WebhookFooter {
                    text: FOOTER_TEXT.to_string(),
                },
                timestamp: at.to_rfc3339(),
            }],
        }
    }
}

/// Posts availability embeds to a webhook URL.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new<U: Into<String>>(url: U, timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ProbeError::network_with_source("Failed to create webhook client", e.to_string())
            })?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify_available(&self, name: &str) -> Result<(), ProbeError> {
        let payload = WebhookPayload::available(name, Utc::now());
        let response = self.client.post(&self.url).json(&payload).send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeError::http_status(
                status.as_u16(),
                "webhook rejected notification",
            ))
        }
    }
}
