//! Remote collaborators of a probing run.
//!
//! The worker pool talks to the availability endpoint through
//! [`ProbeTransport`] and announces available names through [`Notifier`].
//! Both are traits so a run can be driven by stubs in tests.

/// HTTP transport for the availability endpoint, with proxy rotation
pub mod http;

/// Webhook notifications for available names
pub mod webhook;

use crate::error::ProbeError;
use async_trait::async_trait;

pub use http::HttpTransport;
pub use webhook::{Notifier, WebhookEmbed, WebhookFooter, WebhookNotifier, WebhookPayload};

/// Raw response from one probe, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub body: String,
}

impl ProbeResponse {
    pub fn new<B: Into<String>>(status: u16, body: B) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Issues one availability check for one name.
///
/// Implementations return `Err` only for transport faults; any HTTP answer,
/// including error statuses, is an `Ok` response.
#[async_trait]
pub trait ProbeTransport: Send + Sync {
    async fn probe(&self, name: &str) -> Result<ProbeResponse, ProbeError>;
}
