use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Exponential retry backoff applied when a feed has no rate budget left.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub max_retries: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            max_retries: 5,
        }
    }
}

/// In-memory request throttle shared by a feed adapter's calls.
#[derive(Clone)]
pub struct FeedThrottle {
    limiter: Arc<DirectRateLimiter>,
    backoff: BackoffPolicy,
}

impl FeedThrottle {
    pub fn new(quota_window: Duration, quota_limit: u32, backoff: BackoffPolicy) -> Self {
        let quota = quota_from_window(quota_window, quota_limit);
        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
            backoff,
        }
    }

    /// Tries to acquire rate budget; returns the recommended retry delay
    /// when budget is exhausted.
    pub fn acquire(&self, retry_count: u32) -> Result<(), Duration> {
        if self.limiter.check().is_ok() {
            return Ok(());
        }

        Err(self
            .retry_delay(retry_count)
            .unwrap_or(self.backoff.max_delay))
    }

    /// Backoff delay for the given retry attempt, `None` once retries are
    /// exhausted.
    pub fn retry_delay(&self, retry_count: u32) -> Option<Duration> {
        if retry_count > self.backoff.max_retries {
            return None;
        }

        let scale = self.backoff.multiplier.powf(f64::from(retry_count));
        let seconds = self.backoff.initial_delay.as_secs_f64() * scale;
        let capped = seconds.min(self.backoff.max_delay.as_secs_f64());
        Some(Duration::from_secs_f64(capped))
    }
}

fn quota_from_window(quota_window: Duration, quota_limit: u32) -> Quota {
    let safe_limit = quota_limit.max(1);
    let burst = NonZeroU32::new(safe_limit).expect("safe limit must be non-zero");

    let seconds_per_cell = (quota_window.as_secs_f64() / f64::from(safe_limit)).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .expect("period is always greater than zero")
        .allow_burst(burst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_once_quota_is_exhausted() {
        let throttle = FeedThrottle::new(
            Duration::from_secs(60),
            2,
            BackoffPolicy {
                initial_delay: Duration::from_secs(1),
                max_delay: Duration::from_secs(10),
                multiplier: 2.0,
                max_retries: 3,
            },
        );

        assert!(throttle.acquire(0).is_ok());
        assert!(throttle.acquire(0).is_ok());

        let delay = throttle.acquire(0).expect_err("third request should wait");
        assert_eq!(delay, Duration::from_secs(1));
    }

    #[test]
    fn backoff_is_exponential_and_capped() {
        let throttle = FeedThrottle::new(
            Duration::from_secs(60),
            1,
            BackoffPolicy {
                initial_delay: Duration::from_secs(2),
                max_delay: Duration::from_secs(10),
                multiplier: 2.0,
                max_retries: 3,
            },
        );

        assert_eq!(throttle.retry_delay(0), Some(Duration::from_secs(2)));
        assert_eq!(throttle.retry_delay(1), Some(Duration::from_secs(4)));
        assert_eq!(throttle.retry_delay(2), Some(Duration::from_secs(8)));
        assert_eq!(throttle.retry_delay(3), Some(Duration::from_secs(10)));
        assert_eq!(throttle.retry_delay(4), None);
    }
}
