// Time Ports (for testability)

use async_trait::async_trait;
use std::time::Duration;

/// Time provider interface (allows mocking in tests)
pub trait TimeProvider: Send + Sync {
    /// Get current time in milliseconds since epoch
    fn now_millis(&self) -> i64;
}

/// System time provider (production)
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Suspends the caller for a duration.
///
/// The dispatcher waits through this port so tests can run a cycle without
/// real waiting.
#[async_trait]
pub trait Timer: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// tokio-backed timer (production). Honours a paused tokio clock in tests.
pub struct TokioTimer;

#[async_trait]
impl Timer for TokioTimer {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Mutex;

    /// Returns immediately and records each requested duration
    #[derive(Default)]
    pub struct InstantTimer {
        requested: Mutex<Vec<Duration>>,
    }

    impl InstantTimer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn requested(&self) -> Vec<Duration> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Timer for InstantTimer {
        async fn sleep(&self, duration: Duration) {
            self.requested.lock().unwrap().push(duration);
            // Let other tasks observe the "elapsed" interval
            tokio::task::yield_now().await;
        }
    }

    /// Fixed clock for asserting recorded timestamps
    pub struct FixedTimeProvider {
        now: AtomicI64,
    }

    impl FixedTimeProvider {
        pub fn new(now_millis: i64) -> Self {
            Self {
                now: AtomicI64::new(now_millis),
            }
        }
    }

    impl TimeProvider for FixedTimeProvider {
        fn now_millis(&self) -> i64 {
            self.now.load(Ordering::SeqCst)
        }
    }
}
