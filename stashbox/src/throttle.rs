//! Client-side rate-limit windows.
//!
//! A [`Throttler`] remembers that a remote asked us to slow down and makes
//! later callers wait out the window before they call again. It is
//! advisory: two tasks that pass [`Throttler::stall_if_required`] at the
//! same moment both proceed, and concurrent arms resolve as last writer
//! wins.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use stashbox_core::{SharedClock, SystemClock};
use tracing::debug;

use crate::metrics;
use crate::policy::{ArmPolicy, ThrottleConfig};

/// Kind of remote traffic a throttle window applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Fetching data.
    Read,
    /// Mutating remote state.
    Write,
}

impl Operation {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Write => "write",
        }
    }
}

impl From<bool> for Operation {
    /// `true` means a write.
    fn from(is_write: bool) -> Self {
        if is_write {
            Operation::Write
        } else {
            Operation::Read
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One throttle window. `retry_after_ms == 0` means not throttled.
#[derive(Debug, Default)]
struct Window {
    retry_after_ms: AtomicU64,
    armed_at_ms: AtomicI64,
}

impl Window {
    fn arm(&self, window_ms: u64, now_ms: i64) {
        self.armed_at_ms.store(now_ms, Ordering::Release);
        self.retry_after_ms.store(window_ms, Ordering::Release);
    }

    fn reset(&self) {
        self.retry_after_ms.store(0, Ordering::Release);
    }

    fn remaining_ms(&self, now_ms: i64) -> u64 {
        let retry_after = self.retry_after_ms.load(Ordering::Acquire);
        if retry_after == 0 {
            return 0;
        }
        let armed_at = self.armed_at_ms.load(Ordering::Acquire);
        let elapsed = now_ms.saturating_sub(armed_at).max(0) as u64;
        retry_after.saturating_sub(elapsed)
    }
}

struct Inner {
    read: Window,
    write: Window,
    config: ThrottleConfig,
    clock: SharedClock,
}

/// Tracks rate-limit windows for read and write traffic.
///
/// Cloning is cheap; clones share the same windows.
///
/// ```
/// use std::time::Duration;
/// use stashbox::{Operation, Throttler};
///
/// let throttler = Throttler::new();
/// assert!(!throttler.is_rate_limited(Operation::Read));
///
/// let window = throttler.handle_rate_limit_response(Operation::Read, Some(Duration::from_secs(2)));
/// assert_eq!(window, Duration::from_secs(2));
/// assert!(throttler.is_rate_limited(Operation::Write));
/// ```
#[derive(Clone)]
pub struct Throttler {
    inner: Arc<Inner>,
}

impl fmt::Debug for Throttler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttler")
            .field("config", &self.inner.config)
            .field("read_remaining", &self.remaining(Operation::Read))
            .field("write_remaining", &self.remaining(Operation::Write))
            .finish()
    }
}

impl Default for Throttler {
    fn default() -> Self {
        Self::new()
    }
}

impl Throttler {
    /// Throttler with default configuration and the system clock.
    pub fn new() -> Self {
        Self::with_config(ThrottleConfig::default())
    }

    /// Throttler with the given configuration and the system clock.
    pub fn with_config(config: ThrottleConfig) -> Self {
        Self::with_clock(config, SystemClock::shared())
    }

    /// Throttler reading time from `clock`.
    pub fn with_clock(config: ThrottleConfig, clock: SharedClock) -> Self {
        Self {
            inner: Arc::new(Inner {
                read: Window::default(),
                write: Window::default(),
                config,
                clock,
            }),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &ThrottleConfig {
        &self.inner.config
    }

    fn window(&self, op: Operation) -> &Window {
        match op {
            Operation::Read => &self.inner.read,
            Operation::Write => &self.inner.write,
        }
    }

    /// Returns `true` while `op` must wait before calling the remote.
    pub fn is_rate_limited(&self, op: Operation) -> bool {
        self.remaining(op).is_some()
    }

    /// Time left in the window for `op`, or `None` if not throttled.
    pub fn remaining(&self, op: Operation) -> Option<Duration> {
        let now = self.inner.clock.now_millis();
        match self.window(op).remaining_ms(now) {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    /// Arms the throttle after the remote signalled rate limiting.
    ///
    /// The window is `retry_after`, or the configured default backoff when
    /// the remote gave no hint. [`ArmPolicy`] decides whether only `op` or
    /// both operations are armed. Returns the armed window.
    pub fn handle_rate_limit_response(
        &self,
        op: Operation,
        retry_after: Option<Duration>,
    ) -> Duration {
        let window = retry_after.unwrap_or(self.inner.config.default_backoff);
        let window_ms = window.as_millis().min(u64::MAX as u128) as u64;
        let now = self.inner.clock.now_millis();

        match self.inner.config.arm_policy {
            ArmPolicy::Shared => {
                self.inner.read.arm(window_ms, now);
                self.inner.write.arm(window_ms, now);
            }
            ArmPolicy::PerOperation => self.window(op).arm(window_ms, now),
        }
        debug!(
            operation = %op,
            window_ms,
            policy = ?self.inner.config.arm_policy,
            "throttle armed"
        );
        window
    }

    /// Waits until `op` is no longer rate limited.
    ///
    /// Sleeps in steps of at most the poll interval, re-checking the window
    /// between steps so a reset or re-arm from another task is observed.
    /// Returns the total time spent waiting.
    pub async fn stall_if_required(&self, op: Operation) -> Duration {
        let poll = self
            .inner
            .config
            .poll_interval
            .max(Duration::from_millis(1));
        let mut waited = Duration::ZERO;

        while let Some(remaining) = self.remaining(op) {
            let step = remaining.min(poll);
            debug!(operation = %op, remaining_ms = remaining.as_millis() as u64, "stalling for throttle");
            self.inner.clock.sleep(step).await;
            waited += step;
        }

        if !waited.is_zero() {
            metrics::record_stall(op, waited);
        }
        waited
    }

    /// Clears the read window.
    pub fn reset_read(&self) {
        self.inner.read.reset();
    }

    /// Clears the write window.
    pub fn reset_write(&self) {
        self.inner.write.reset();
    }
}
