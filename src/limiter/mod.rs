//! Per-client fixed-window rate limiter
//!
//! Each client gets a bucket holding a request count and the instant its
//! window resets. A request arriving at or after `reset_at` opens a fresh
//! window; otherwise the count grows and anything past the limit is
//! rejected. Rejections do not move the window.
//!
//! Bursts straddling a window boundary can briefly reach twice the nominal
//! rate. Buckets are never evicted.

mod clock;

pub use clock::{Clock, SystemClock};

#[cfg(test)]
pub use clock::ManualClock;

use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Length of one rate-limit window
pub const WINDOW_MILLIS: u64 = 60_000;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    count: u32,
    reset_at: u64,
}

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed {
        /// Requests left in the current window
        remaining: u32,
        /// Milliseconds until the current window ends
        reset_after_millis: u64,
    },
    Limited {
        /// Milliseconds until the current window ends
        retry_after_millis: u64,
    },
}

impl RateDecision {
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Fixed-window limiter keyed by client identity `K`
pub struct RateLimiter<K>
where
    K: Hash + Eq,
{
    limit: u32,
    window_millis: u64,
    buckets: DashMap<K, Bucket>,
    clock: Arc<dyn Clock>,
}

impl<K> RateLimiter<K>
where
    K: Hash + Eq,
{
    /// Limiter allowing `requests_per_minute` per client (floored at 1)
    pub fn per_minute(requests_per_minute: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            limit: requests_per_minute.max(1),
            window_millis: WINDOW_MILLIS,
            buckets: DashMap::new(),
            clock,
        }
    }

    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Count a request from `client` and decide whether it may proceed
    pub fn check(&self, client: K) -> RateDecision {
        let now = self.clock.now_millis();

        // The entry guard holds the shard lock, so read-and-update is atomic per key
        let mut bucket = self.buckets.entry(client).or_insert(Bucket {
            count: 0,
            reset_at: now,
        });

        if now >= bucket.reset_at {
            *bucket = Bucket {
                count: 1,
                reset_at: now.saturating_add(self.window_millis),
            };
            return RateDecision::Allowed {
                remaining: self.limit - 1,
                reset_after_millis: self.window_millis,
            };
        }

        bucket.count = bucket.count.saturating_add(1);
        if bucket.count > self.limit {
            return RateDecision::Limited {
                retry_after_millis: bucket.reset_at - now,
            };
        }

        RateDecision::Allowed {
            remaining: self.limit - bucket.count,
            reset_after_millis: bucket.reset_at - now,
        }
    }

    /// Number of clients with a bucket
    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn limiter(limit: u32) -> (RateLimiter<IpAddr>, ManualClock) {
        let clock = ManualClock::new(1_000_000);
        (RateLimiter::per_minute(limit, Arc::new(clock.clone())), clock)
    }

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn test_allows_up_to_limit_then_rejects() {
        let (limiter, _clock) = limiter(60);
        for i in 0..60 {
            assert!(limiter.check(ip(1)).is_allowed(), "request {} rejected", i + 1);
        }
        assert_eq!(
            limiter.check(ip(1)),
            RateDecision::Limited {
                retry_after_millis: WINDOW_MILLIS
            }
        );
    }

    #[test]
    fn test_remaining_counts_down() {
        let (limiter, _clock) = limiter(3);
        let remaining: Vec<u32> = (0..3)
            .map(|_| match limiter.check(ip(1)) {
                RateDecision::Allowed { remaining, .. } => remaining,
                RateDecision::Limited { .. } => panic!("unexpected rejection"),
            })
            .collect();
        assert_eq!(remaining, vec![2, 1, 0]);
    }

    #[test]
    fn test_allowed_reports_time_to_reset() {
        let (limiter, clock) = limiter(5);
        assert_eq!(
            limiter.check(ip(1)),
            RateDecision::Allowed {
                remaining: 4,
                reset_after_millis: WINDOW_MILLIS
            }
        );

        clock.advance(45_000);
        assert_eq!(
            limiter.check(ip(1)),
            RateDecision::Allowed {
                remaining: 3,
                reset_after_millis: 15_000
            }
        );
    }

    #[test]
    fn test_window_expiry_resets_bucket() {
        let (limiter, clock) = limiter(2);
        assert!(limiter.check(ip(1)).is_allowed());
        assert!(limiter.check(ip(1)).is_allowed());
        assert!(!limiter.check(ip(1)).is_allowed());

        clock.advance(WINDOW_MILLIS - 1);
        assert!(!limiter.check(ip(1)).is_allowed());

        clock.advance(1);
        assert!(limiter.check(ip(1)).is_allowed());
    }

    #[test]
    fn test_rejection_does_not_advance_window() {
        let (limiter, clock) = limiter(1);
        assert!(limiter.check(ip(1)).is_allowed());

        clock.advance(30_000);
        assert_eq!(
            limiter.check(ip(1)),
            RateDecision::Limited {
                retry_after_millis: 30_000
            }
        );

        clock.advance(30_000);
        assert!(limiter.check(ip(1)).is_allowed());
    }

    #[test]
    fn test_clients_are_independent() {
        let (limiter, _clock) = limiter(1);
        assert!(limiter.check(ip(1)).is_allowed());
        assert!(!limiter.check(ip(1)).is_allowed());
        assert!(limiter.check(ip(2)).is_allowed());
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn test_zero_limit_is_floored() {
        let (limiter, _clock) = limiter(0);
        assert_eq!(limiter.limit(), 1);
        assert!(limiter.check(ip(1)).is_allowed());
        assert!(!limiter.check(ip(1)).is_allowed());
    }
}
