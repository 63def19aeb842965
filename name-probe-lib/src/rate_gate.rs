//! Shared rate gate with adaptive backoff.
//!
//! One `RateGate` exists per run and every worker holds a clone of it.
//! Before each request a worker calls [`RateGate::await_turn`], which waits
//! out any global pause and then sleeps for the current inter-request delay.
//! When the remote side throttles, [`RateGate::trigger_backoff`] closes the
//! gate, raises the delay, and schedules a timer that reopens it.
//!
//! The delay only ever grows, up to `MAX_DELAY_SECS`. Reopening the gate
//! never lowers it. A single pause lasts at most `MAX_RETRY_AFTER_SECS`.

use crate::types::{DEFAULT_RETRY_AFTER_SECS, MAX_DELAY_SECS, MAX_RETRY_AFTER_SECS};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, info, warn};

/// Multiplier applied to the delay on every backoff.
const BACKOFF_FACTOR: f64 = 1.5;

/// Smallest delay a backoff can leave behind, in seconds.
const BACKOFF_FLOOR_SECS: f64 = 1.0;

/// Snapshot of the gate's state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateGateState {
    pub current_delay_secs: f64,
    pub paused: bool,
    pub pause_until: Option<Instant>,
}

#[derive(Debug, Default)]
struct PauseState {
    paused: bool,
    pause_until: Option<Instant>,
}

struct GateInner {
    initial_delay_secs: f64,
    /// f64 bits, so workers can read the delay without taking the lock
    delay_bits: AtomicU64,
    state: Mutex<PauseState>,
    go: watch::Sender<bool>,
    resume_task: Mutex<Option<JoinHandle<()>>>,
}

impl GateInner {
    fn current_delay(&self) -> f64 {
        f64::from_bits(self.delay_bits.load(Ordering::Acquire))
    }

    fn reopen(&self) {
        let mut state = lock(&self.state);
        state.paused = false;
        state.pause_until = None;
        self.go.send_replace(true);
        info!(
            delay_secs = self.current_delay(),
            "Rate gate reopened, resuming probes"
        );
    }
}

/// Shared handle enforcing the inter-request delay and global pause window.
///
/// Cloning is cheap; all clones refer to the same gate.
#[derive(Clone)]
pub struct RateGate {
    inner: Arc<GateInner>,
}

impl RateGate {
    /// Create an open gate. Negative or non-finite delays are treated as zero
    /// and delays above `MAX_DELAY_SECS` are capped.
    pub fn new(initial_delay_secs: f64) -> Self {
        let initial = if initial_delay_secs.is_finite() && initial_delay_secs > 0.0 {
            initial_delay_secs.min(MAX_DELAY_SECS)
        } else {
            0.0
        };
        let (go, _) = watch::channel(true);

        Self {
            inner: Arc::new(GateInner {
                initial_delay_secs: initial,
                delay_bits: AtomicU64::new(initial.to_bits()),
                state: Mutex::new(PauseState::default()),
                go,
                resume_task: Mutex::new(None),
            }),
        }
    }

    /// Wait until the gate is open, then wait out the current delay.
    ///
    /// Concurrent callers are released in no particular order. This never
    /// changes the gate's state.
    pub async fn await_turn(&self) {
        self.wait_open().await;

        let delay = to_duration(self.current_delay(), MAX_DELAY_SECS);
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }

    /// Wait only for the gate to be open, without the per-request delay.
    pub async fn wait_open(&self) {
        let mut go = self.inner.go.subscribe();
        // The sender lives as long as `self`, so this cannot observe a closed channel.
        let _ = go.wait_for(|open| *open).await;
    }

    /// React to a throttle response.
    ///
    /// Returns `true` if this call closed the gate, `false` if the gate was
    /// already paused and the call was ignored. Invalid `retry_after_secs`
    /// values (negative, NaN, infinite) fall back to five seconds; larger
    /// values are capped at `MAX_RETRY_AFTER_SECS`.
    pub fn trigger_backoff(&self, retry_after_secs: f64) -> bool {
        let retry_after = sanitize_retry_after(retry_after_secs);
        let mut state = lock(&self.inner.state);

        if state.paused {
            debug!(retry_after, "Gate already paused, ignoring backoff");
            return false;
        }

        let now = Instant::now();
        let pause_until = now
            .checked_add(to_duration(retry_after, MAX_RETRY_AFTER_SECS))
            .unwrap_or(now);
        state.paused = true;
        state.pause_until = Some(pause_until);
        self.inner.go.send_replace(false);

        let next_delay = (self.current_delay() * BACKOFF_FACTOR)
            .max(BACKOFF_FLOOR_SECS)
            .min(MAX_DELAY_SECS);
        self.inner
            .delay_bits
            .store(next_delay.to_bits(), Ordering::Release);

        warn!(
            retry_after_secs = retry_after,
            delay_secs = next_delay,
            "Rate limited, pausing all probes"
        );

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            sleep_until(pause_until).await;
            inner.reopen();
        });

        let previous = lock(&self.inner.resume_task).replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }

        true
    }

    /// Wait until a pending pause has been lifted.
    pub async fn wait_resumed(&self) {
        self.wait_open().await;
    }

    /// Abort the pending reopen timer and reopen the gate immediately.
    ///
    /// Used when a run is cancelled so nothing stays parked on the gate.
    pub fn cancel_pending_resume(&self) {
        let handle = lock(&self.inner.resume_task).take();
        if let Some(handle) = handle {
            handle.abort();
            self.inner.reopen();
        }
    }

    /// Current inter-request delay in seconds.
    pub fn current_delay(&self) -> f64 {
        self.inner.current_delay()
    }

    /// Delay the gate was created with.
    pub fn initial_delay(&self) -> f64 {
        self.inner.initial_delay_secs
    }

    pub fn is_paused(&self) -> bool {
        lock(&self.inner.state).paused
    }

    pub fn state(&self) -> RateGateState {
        let state = lock(&self.inner.state);
        RateGateState {
            current_delay_secs: self.current_delay(),
            paused: state.paused,
            pause_until: state.pause_until,
        }
    }
}

impl std::fmt::Debug for RateGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateGate")
            .field("state", &self.state())
            .finish()
    }
}

fn sanitize_retry_after(secs: f64) -> f64 {
    if secs.is_finite() && secs >= 0.0 {
        secs.min(MAX_RETRY_AFTER_SECS)
    } else {
        DEFAULT_RETRY_AFTER_SECS
    }
}

fn to_duration(secs: f64, max_secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.clamp(0.0, max_secs)).unwrap_or(Duration::ZERO)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_open_gate_waits_only_for_delay() {
        let gate = RateGate::new(0.5);
        let start = Instant::now();
        gate.await_turn().await;
        assert!(start.elapsed() >= Duration::from_millis(500));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_blocks_until_retry_after() {
        let gate = RateGate::new(0.0);
        assert!(gate.trigger_backoff(2.0));

        let start = Instant::now();
        gate.await_turn().await;
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(!gate.is_paused());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_backoff_while_paused_is_noop() {
        let gate = RateGate::new(2.0);
        assert!(gate.trigger_backoff(10.0));
        let before = gate.state();

        assert!(!gate.trigger_backoff(1.0));
        let after = gate.state();

        assert_eq!(before.current_delay_secs, after.current_delay_secs);
        assert_eq!(before.pause_until, after.pause_until);
        assert!(after.paused);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_grows_with_floor() {
        let gate = RateGate::new(0.0);
        gate.trigger_backoff(0.1);
        assert_eq!(gate.current_delay(), 1.0);

        gate.wait_resumed().await;
        gate.trigger_backoff(0.1);
        assert_eq!(gate.current_delay(), 1.5);

        gate.wait_resumed().await;
        gate.trigger_backoff(0.1);
        assert_eq!(gate.current_delay(), 2.25);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_never_decreases_after_resume() {
        let gate = RateGate::new(2.0);
        gate.trigger_backoff(1.0);
        assert_eq!(gate.current_delay(), 3.0);

        gate.wait_resumed().await;
        assert!(!gate.is_paused());
        assert_eq!(gate.current_delay(), 3.0);
        assert!(gate.current_delay() >= gate.initial_delay());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_retry_after_uses_default() {
        let gate = RateGate::new(0.0);
        let start = Instant::now();
        gate.trigger_backoff(f64::NAN);

        let state = gate.state();
        let until = state.pause_until.unwrap();
        assert_eq!(until - start, Duration::from_secs(5));

        gate.wait_resumed().await;
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_retry_after_is_capped() {
        let gate = RateGate::new(0.0);
        let start = Instant::now();
        assert!(gate.trigger_backoff(1e20));

        let until = gate.state().pause_until.unwrap();
        assert_eq!(until - start, Duration::from_secs(3600));

        gate.await_turn().await;
        assert!(start.elapsed() >= Duration::from_secs(3600));
        assert!(!gate.is_paused());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_is_capped() {
        let gate = RateGate::new(1e20);
        assert_eq!(gate.current_delay(), MAX_DELAY_SECS);

        gate.trigger_backoff(0.1);
        assert_eq!(gate.current_delay(), MAX_DELAY_SECS);

        gate.wait_resumed().await;
        let start = Instant::now();
        gate.await_turn().await;
        assert!(start.elapsed() >= Duration::from_secs(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_pending_resume_reopens() {
        let gate = RateGate::new(0.0);
        gate.trigger_backoff(3600.0);
        assert!(gate.is_paused());

        gate.cancel_pending_resume();
        assert!(!gate.is_paused());

        let start = Instant::now();
        gate.wait_open().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiters_are_all_released() {
        let gate = RateGate::new(0.0);
        gate.trigger_backoff(1.0);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let gate = gate.clone();
            handles.push(tokio::spawn(async move { gate.await_turn().await }));
        }

        for handle in handles {
            handle.await.unwrap();
        }
        assert!(!gate.is_paused());
    }

    #[test]
    fn test_negative_initial_delay_is_zero() {
        let gate = RateGate::new(-4.0);
        assert_eq!(gate.initial_delay(), 0.0);
        assert_eq!(gate.current_delay(), 0.0);
    }
}
