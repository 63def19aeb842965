//! Core data types for availability probing.
//!
//! This module defines the result of a single probe, the run configuration,
//! and the output of a generation call.

use crate::error::ProbeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Endpoint probed when no other endpoint is configured.
pub const DEFAULT_ENDPOINT: &str = "https://discord.com/api/v9/users/@me/pomelo-attempt";

/// File that available names are appended to.
pub const DEFAULT_OUTPUT_FILE: &str = "valid_usernames.txt";

/// Seconds to pause when a throttle response carries no usable `retry_after`.
pub const DEFAULT_RETRY_AFTER_SECS: f64 = 5.0;

/// Longest pause a single throttle response can impose, in seconds.
pub const MAX_RETRY_AFTER_SECS: f64 = 3600.0;

/// Upper bound for the inter-request delay, configured or backed off.
pub const MAX_DELAY_SECS: f64 = 600.0;

pub const MIN_CONCURRENCY: usize = 1;
pub const MAX_CONCURRENCY: usize = 50;
pub const DEFAULT_CONCURRENCY: usize = 5;
pub const DEFAULT_RETRY_DELAY_SECS: f64 = 2.0;

/// Token value shipped in config templates; never a real credential.
pub const PLACEHOLDER_TOKEN: &str = "YOUR_TOKEN_HERE";

/// Terminal classification of one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckStatus {
    Available,
    Taken,
    RateLimited,
    Error,
}

impl CheckStatus {
    /// Every status, in summary-table order.
    pub const ALL: [CheckStatus; 4] = [
        CheckStatus::Available,
        CheckStatus::Taken,
        CheckStatus::RateLimited,
        CheckStatus::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Available => "AVAILABLE",
            CheckStatus::Taken => "TAKEN",
            CheckStatus::RateLimited => "RATE_LIMITED",
            CheckStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of probing one candidate.
///
/// Created once by the worker that classified the response and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// The candidate that was probed
    pub name: String,

    /// How the response was classified
    pub status: CheckStatus,

    /// Human-readable detail (error text, pause length, etc.)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckResult {
    pub fn new<N: Into<String>>(name: N, status: CheckStatus, message: Option<String>) -> Self {
        Self {
            name: name.into(),
            status,
            message,
        }
    }

    pub fn available<N: Into<String>>(name: N) -> Self {
        Self::new(name, CheckStatus::Available, Some("Available!".to_string()))
    }

    pub fn taken<N: Into<String>>(name: N) -> Self {
        Self::new(name, CheckStatus::Taken, Some("Taken".to_string()))
    }

    pub fn rate_limited<N: Into<String>>(name: N, retry_after: f64) -> Self {
        Self::new(
            name,
            CheckStatus::RateLimited,
            Some(format!("Rate limited, pausing for {}s", retry_after)),
        )
    }

    pub fn error<N: Into<String>, M: Into<String>>(name: N, message: M) -> Self {
        Self::new(name, CheckStatus::Error, Some(message.into()))
    }

    pub fn is_available(&self) -> bool {
        self.status == CheckStatus::Available
    }
}

/// What a worker does with a throttled candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitPolicy {
    /// Record `RATE_LIMITED` as the candidate's final status.
    #[default]
    Record,

    /// Wait for the gate to reopen and probe again, up to `max_retries` times.
    Retry { max_retries: u32 },
}

impl RateLimitPolicy {
    /// Build a policy from a retry count; zero means record.
    pub fn from_retries(max_retries: u32) -> Self {
        if max_retries == 0 {
            RateLimitPolicy::Record
        } else {
            RateLimitPolicy::Retry { max_retries }
        }
    }

    pub fn max_retries(&self) -> u32 {
        match self {
            RateLimitPolicy::Record => 0,
            RateLimitPolicy::Retry { max_retries } => *max_retries,
        }
    }
}

/// Configuration for one probing run.
///
/// Loaded once before the run and read-only while it is in progress.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Authorization token sent with every probe
    pub token: String,

    /// URL of the availability endpoint
    pub endpoint: String,

    /// Maximum number of in-flight probes
    /// Default: 5, Range: 1-50
    pub concurrency: usize,

    /// Inter-request delay the rate gate starts with, in seconds
    /// Default: 2.0
    pub initial_delay_secs: f64,

    /// Timeout for each HTTP request
    /// Default: 10 seconds
    pub request_timeout: Duration,

    /// Webhook notified for every available name
    pub webhook_url: Option<String>,

    /// Proxies rotated round-robin; empty means direct connections
    pub proxies: Vec<String>,

    /// How throttled candidates are handled
    pub rate_limit_policy: RateLimitPolicy,

    /// Append-only log of available names
    pub output_path: PathBuf,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            initial_delay_secs: DEFAULT_RETRY_DELAY_SECS,
            request_timeout: Duration::from_secs(10),
            webhook_url: None,
            proxies: Vec::new(),
            rate_limit_policy: RateLimitPolicy::Record,
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
        }
    }
}

impl ProbeConfig {
    pub fn with_token<T: Into<String>>(mut self, token: T) -> Self {
        self.token = token.into();
        self
    }

    pub fn with_endpoint<E: Into<String>>(mut self, endpoint: E) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set concurrency, clamped to 1-50.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(MIN_CONCURRENCY, MAX_CONCURRENCY);
        self
    }

    /// Set the initial inter-request delay. Negative or non-finite values become zero.
    pub fn with_initial_delay(mut self, secs: f64) -> Self {
        self.initial_delay_secs = if secs.is_finite() && secs > 0.0 {
            secs
        } else {
            0.0
        };
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the webhook URL; an empty string clears it.
    pub fn with_webhook_url<U: Into<String>>(mut self, url: U) -> Self {
        let url = url.into();
        self.webhook_url = if url.trim().is_empty() {
            None
        } else {
            Some(url)
        };
        self
    }

    pub fn with_proxies(mut self, proxies: Vec<String>) -> Self {
        self.proxies = proxies;
        self
    }

    pub fn with_rate_limit_policy(mut self, policy: RateLimitPolicy) -> Self {
        self.rate_limit_policy = policy;
        self
    }

    pub fn with_output_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output_path = path.into();
        self
    }

    /// Whether the token looks like a real credential.
    pub fn has_usable_token(&self) -> bool {
        let token = self.token.trim();
        !token.is_empty() && token != PLACEHOLDER_TOKEN
    }

    /// Check the invariants a run depends on.
    pub fn validate(&self) -> Result<(), ProbeError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(ProbeError::config(format!(
                "Concurrency must be between {} and {}",
                MIN_CONCURRENCY, MAX_CONCURRENCY
            )));
        }

        if !self.initial_delay_secs.is_finite()
            || !(0.0..=MAX_DELAY_SECS).contains(&self.initial_delay_secs)
        {
            return Err(ProbeError::config(format!(
                "Retry delay must be between 0 and {} seconds",
                MAX_DELAY_SECS
            )));
        }

        if self.endpoint.trim().is_empty() {
            return Err(ProbeError::config("Endpoint URL cannot be empty"));
        }

        if let Some(url) = &self.webhook_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ProbeError::config(format!(
                    "Webhook URL '{}' must start with http:// or https://",
                    url
                )));
            }
        }

        Ok(())
    }
}

/// Output of one `generate` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationResult {
    /// Unique names, at most `requested` of them
    pub names: Vec<String>,

    /// How many names the caller asked for
    pub requested: usize,

    /// Set when fewer than `requested` names could be produced
    pub warning: Option<String>,
}

impl GenerationResult {
    pub fn is_complete(&self) -> bool {
        self.names.len() >= self.requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_screaming_case() {
        let result = CheckResult::rate_limited("abc", 1.5);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"RATE_LIMITED\""));
        assert!(json.contains("pausing for 1.5s"));
    }

    #[test]
    fn test_status_display_matches_serde() {
        for status in CheckStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status));
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = ProbeConfig::default();
        assert_eq!(config.concurrency, 5);
        assert_eq!(config.initial_delay_secs, 2.0);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.rate_limit_policy, RateLimitPolicy::Record);
        assert_eq!(config.output_path, PathBuf::from("valid_usernames.txt"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_concurrency_is_clamped() {
        assert_eq!(ProbeConfig::default().with_concurrency(0).concurrency, 1);
        assert_eq!(ProbeConfig::default().with_concurrency(500).concurrency, 50);
        assert_eq!(ProbeConfig::default().with_concurrency(12).concurrency, 12);
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let config = ProbeConfig {
            concurrency: 51,
            ..ProbeConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ProbeConfig {
            initial_delay_secs: -1.0,
            ..ProbeConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ProbeConfig::default().with_webhook_url("ftp://hooks.example");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_huge_delay() {
        let config = ProbeConfig::default().with_initial_delay(1e20);
        assert!(config.validate().is_err());

        let config = ProbeConfig::default().with_initial_delay(MAX_DELAY_SECS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_delay_builder_floors_to_zero() {
        let config = ProbeConfig::default().with_initial_delay(-3.0);
        assert_eq!(config.initial_delay_secs, 0.0);
        let config = ProbeConfig::default().with_initial_delay(f64::NAN);
        assert_eq!(config.initial_delay_secs, 0.0);
    }

    #[test]
    fn test_placeholder_token_is_not_usable() {
        assert!(!ProbeConfig::default().has_usable_token());
        assert!(!ProbeConfig::default()
            .with_token(PLACEHOLDER_TOKEN)
            .has_usable_token());
        assert!(ProbeConfig::default()
            .with_token("mfa.abc123")
            .has_usable_token());
    }

    #[test]
    fn test_empty_webhook_clears_target() {
        let config = ProbeConfig::default().with_webhook_url("   ");
        assert!(config.webhook_url.is_none());
    }

    #[test]
    fn test_policy_from_retries() {
        assert_eq!(RateLimitPolicy::from_retries(0), RateLimitPolicy::Record);
        assert_eq!(
            RateLimitPolicy::from_retries(3),
            RateLimitPolicy::Retry { max_retries: 3 }
        );
        assert_eq!(RateLimitPolicy::Retry { max_retries: 2 }.max_retries(), 2);
    }
}
