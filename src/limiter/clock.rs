//! Time source for the rate limiter

use std::time::{SystemTime, UNIX_EPOCH};

/// Millisecond clock
///
/// Abstracted so tests can move time forward without sleeping.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Wall clock, milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        // A clock set before 1970 reads as 0 rather than failing the request
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or_default()
    }
}

#[cfg(test)]
pub use manual::ManualClock;

#[cfg(test)]
mod manual {
    use super::Clock;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    /// Clock that only moves when told to
    #[derive(Debug, Clone, Default)]
    pub struct ManualClock {
        millis: Arc<AtomicU64>,
    }

    impl ManualClock {
        pub fn new(start_millis: u64) -> Self {
            Self {
                millis: Arc::new(AtomicU64::new(start_millis)),
            }
        }

        pub fn advance(&self, millis: u64) {
            self.millis.fetch_add(millis, Ordering::Relaxed);
        }
    }

    impl Clock for ManualClock {
        fn now_millis(&self) -> u64 {
            self.millis.load(Ordering::Relaxed)
        }
    }
}
