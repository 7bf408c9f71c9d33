//! Time source abstraction.
//!
//! Cache timestamps and throttle windows both read the current time through
//! [`Clock`], and the throttler waits through [`Clock::sleep`]. Production
//! code uses [`SystemClock`]; tests swap in `MockClock` (feature
//! `test-helpers`), whose `sleep` advances simulated time instead of waiting.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

/// Source of wall-clock time and of suspension.
#[async_trait]
pub trait Clock: Send + Sync + Debug {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;

    /// Suspends the calling task for `duration`.
    async fn sleep(&self, duration: Duration);

    /// Current time in milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// Clock shared between caches and throttlers.
pub type SharedClock = Arc<dyn Clock>;

/// Real system clock backed by [`Utc::now`] and [`tokio::time::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Returns the system clock as a [`SharedClock`].
    pub fn shared() -> SharedClock {
        Arc::new(SystemClock)
    }
}

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(any(test, feature = "test-helpers"))]
pub use mock::MockClock;

#[cfg(any(test, feature = "test-helpers"))]
mod mock {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Manually driven clock for tests.
    ///
    /// Clones share the same simulated time. `sleep` advances the clock by
    /// the requested duration and yields once, so code that waits on a
    /// throttle finishes instantly while still observing the elapsed time.
    #[derive(Debug, Clone)]
    pub struct MockClock {
        base: DateTime<Utc>,
        offset_ms: Arc<AtomicI64>,
    }

    impl MockClock {
        /// Starts at the current real time.
        pub fn new() -> Self {
            Self::starting_at(Utc::now())
        }

        /// Starts at a fixed instant.
        pub fn starting_at(base: DateTime<Utc>) -> Self {
            Self {
                base,
                offset_ms: Arc::new(AtomicI64::new(0)),
            }
        }

        /// Moves simulated time forward.
        pub fn advance(&self, duration: Duration) {
            self.offset_ms
                .fetch_add(duration.as_millis() as i64, Ordering::SeqCst);
        }

        /// Total simulated time elapsed since creation.
        pub fn elapsed(&self) -> Duration {
            Duration::from_millis(self.offset_ms.load(Ordering::SeqCst).max(0) as u64)
        }

        /// Returns this clock as a [`SharedClock`].
        pub fn shared(&self) -> SharedClock {
            Arc::new(self.clone())
        }
    }

    impl Default for MockClock {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl Clock for MockClock {
        fn now(&self) -> DateTime<Utc> {
            self.base + chrono::Duration::milliseconds(self.offset_ms.load(Ordering::SeqCst))
        }

        async fn sleep(&self, duration: Duration) {
            self.advance(duration);
            tokio::task::yield_now().await;
        }
    }
}
