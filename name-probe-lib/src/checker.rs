//! Bounded worker pool that probes candidates.
//!
//! `NameChecker` owns everything a run shares: the configuration, the
//! transport, the optional notifier, the rate gate, the slot semaphore and the
//! cancellation token. Each candidate becomes one task that
//!
//! 1. acquires a concurrency slot,
//! 2. waits its turn at the rate gate,
//! 3. sends the probe and classifies the response,
//! 4. releases the slot and reports exactly one [`CheckResult`].
//!
//! Results are delivered in completion order through a [`ProbeRun`].

use crate::classify::classify_response;
use crate::error::ProbeError;
use crate::protocols::{HttpTransport, Notifier, ProbeTransport, WebhookNotifier};
use crate::rate_gate::RateGate;
use crate::types::{CheckResult, CheckStatus, ProbeConfig};
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Main checker that fans candidates out over a bounded pool.
///
/// # Example
///
/// ```rust,no_run
/// use name_probe_lib::{NameChecker, ProbeConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ProbeConfig::default()
///         .with_token("my-token")
///         .with_concurrency(3);
///     let checker = NameChecker::with_config(config)?;
///
///     let results = checker.check_names(vec!["viper".into(), "cobra".into()]).await;
///     for result in results {
///         println!("{}: {}", result.name, result.status);
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct NameChecker {
    config: Arc<ProbeConfig>,
    transport: Arc<dyn ProbeTransport>,
    notifier: Option<Arc<dyn Notifier>>,
    gate: RateGate,
    slots: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl NameChecker {
    /// Create a checker that probes over HTTP.
    ///
    /// Builds the proxy-rotating transport and, if a webhook URL is set,
    /// the webhook notifier.
    pub fn with_config(config: ProbeConfig) -> Result<Self, ProbeError> {
        config.validate()?;

        let transport = HttpTransport::new(&config)?;
        let notifier = match &config.webhook_url {
            Some(url) => {
                let notifier = WebhookNotifier::new(url.clone(), config.request_timeout)?;
                Some(Arc::new(notifier) as Arc<dyn Notifier>)
            }
            None => None,
        };

        Ok(Self::with_transport(config, Arc::new(transport), notifier))
    }

    /// Create a checker around any transport and notifier.
    pub fn with_transport(
        config: ProbeConfig,
        transport: Arc<dyn ProbeTransport>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        let gate = RateGate::new(config.initial_delay_secs);
        let slots = Arc::new(Semaphore::new(config.concurrency.max(1)));

        Self {
            config: Arc::new(config),
            transport,
            notifier,
            gate,
            slots,
            cancel: CancellationToken::new(),
        }
    }

    /// Probe one candidate.
    ///
    /// Never fails: every outcome, including transport faults and
    /// cancellation, is folded into the returned result.
    pub async fn check_name(&self, name: &str) -> CheckResult {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => CheckResult::error(name, ProbeError::Cancelled.to_string()),
            result = self.check_with_policy(name) => result,
        }
    }

    async fn check_with_policy(&self, name: &str) -> CheckResult {
        let max_retries = self.config.rate_limit_policy.max_retries();
        let mut retries = 0;

        loop {
            let result = self.probe_once(name).await;
            if result.status != CheckStatus::RateLimited || retries >= max_retries {
                return result;
            }
            retries += 1;
            debug!(name, retries, "Requeueing rate limited candidate");
        }
    }

    async fn probe_once(&self, name: &str) -> CheckResult {
        let permit = match self.slots.acquire().await {
            Ok(permit) => permit,
            Err(_) => return CheckResult::error(name, "Worker pool closed"),
        };

        self.gate.await_turn().await;

        let classification = match self.transport.probe(name).await {
            Ok(response) => classify_response(name, response.status, &response.body),
            Err(e) => {
                error!(name, error = %e, "Probe failed");
                return CheckResult::error(name, e.to_string());
            }
        };

        if let Some(retry_after) = classification.backoff_secs {
            self.gate.trigger_backoff(retry_after);
        }
        drop(permit);

        let result = classification.result;
        if result.is_available() {
            self.notify(name).await;
        }
        result
    }

    async fn notify(&self, name: &str) {
        if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier.notify_available(name).await {
                warn!(name, error = %e, "Failed to send availability notification");
            }
        }
    }

    /// Probe every candidate and stream results as they complete.
    ///
    /// Spawns one task per candidate; at most `concurrency` of them are past
    /// slot acquisition at any time. The stream ends after every candidate
    /// has reported.
    pub fn check_names_stream(&self, names: Vec<String>) -> ProbeRun {
        let (tx, rx) = mpsc::unbounded_channel();
        let expected = names.len();

        info!(
            candidates = expected,
            concurrency = self.config.concurrency,
            delay_secs = self.gate.current_delay(),
            "Starting probe run"
        );

        let tasks = names
            .into_iter()
            .map(|name| {
                let checker = self.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = checker.check_name(&name).await;
                    // The receiver may be gone if the caller stopped listening.
                    let _ = tx.send(result);
                })
            })
            .collect();

        ProbeRun {
            rx,
            expected,
            received: 0,
            tasks,
        }
    }

    /// Probe every candidate and collect results in completion order.
    pub async fn check_names(&self, names: Vec<String>) -> Vec<CheckResult> {
        self.check_names_stream(names).collect().await
    }

    /// Stop the run: in-flight and queued candidates report `Cancelled`.
    pub fn cancel(&self) {
        info!("Cancelling probe run");
        self.cancel.cancel();
        self.gate.cancel_pending_resume();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn rate_gate(&self) -> &RateGate {
        &self.gate
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }
}

/// Completion-order stream of results for one run.
pub struct ProbeRun {
    rx: mpsc::UnboundedReceiver<CheckResult>,
    expected: usize,
    received: usize,
    tasks: Vec<JoinHandle<()>>,
}

impl ProbeRun {
    /// Number of candidates submitted.
    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn is_finished(&self) -> bool {
        self.received >= self.expected
    }

}

// Workers left behind by a dropped run would keep hitting the endpoint.
impl Drop for ProbeRun {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

impl Stream for ProbeRun {
    type Item = CheckResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.received >= self.expected {
            return Poll::Ready(None);
        }

        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(result)) => {
                self.received += 1;
                Poll::Ready(Some(result))
            }
            other => other,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.expected.saturating_sub(self.received);
        (0, Some(remaining))
    }
}
