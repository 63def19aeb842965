//! # Name Probe Library
//!
//! An async engine for checking whether usernames are still free on a
//! rate-limited availability endpoint.
//!
//! The library generates candidate names, fans them out over a bounded worker
//! pool, and coordinates every worker through a shared rate gate that backs off
//! when the endpoint throttles.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use name_probe_lib::{NameChecker, ProbeConfig, ResultAggregator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ProbeConfig::default().with_token("my-token");
//!     let checker = NameChecker::with_config(config)?;
//!
//!     let names = vec!["viper".to_string(), "cobra".to_string()];
//!     let mut run = checker.check_names_stream(names);
//!     let mut aggregator = ResultAggregator::new(run.expected());
//!     aggregator
//!         .drain(&mut run, |result, i, n| println!("[{}/{}] {}", i, n, result.name))
//!         .await;
//!
//!     let summary = aggregator.finish();
//!     println!("{} available", summary.tally.available);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Name generation**: random, pattern, dictionary, leet and remote lists
//! - **Adaptive backoff**: one throttle pauses every worker and slows the pace
//! - **Bounded concurrency**: a fixed number of probes in flight
//! - **Streaming results**: completion-order delivery with per-status tallies
//! - **Notifications**: optional webhook embed for every available name

// Re-export main public API types and functions
pub use aggregate::{append_available, ResultAggregator, RunSummary, StatusTally};
pub use checker::{NameChecker, ProbeRun};
pub use classify::{classify_response, Classification};
pub use config::{load_env_config, ConfigManager, EnvConfig, FileConfig, GenerationConfig};
pub use error::ProbeError;
pub use generate::NameGenerator;
pub use protocols::{Notifier, ProbeResponse, ProbeTransport};
pub use rate_gate::{RateGate, RateGateState};
pub use types::{
    CheckResult, CheckStatus, GenerationResult, ProbeConfig, RateLimitPolicy, DEFAULT_ENDPOINT,
    DEFAULT_OUTPUT_FILE, MAX_CONCURRENCY, MAX_DELAY_SECS, MAX_RETRY_AFTER_SECS, MIN_CONCURRENCY,
    PLACEHOLDER_TOKEN,
};
pub use utils::{dedupe_preserving_order, normalize_candidate, validate_candidate};

// Public modules
pub mod aggregate;
pub mod checker;
pub mod classify;
pub mod config;
pub mod generate;
pub mod protocols;
pub mod rate_gate;
pub mod utils;

// Internal modules, re-exported above
mod error;
mod types;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

