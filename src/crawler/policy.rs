//! Retry and pacing policies for outbound requests
//!
//! Both are plain values handed to the [`Fetcher`](super::Fetcher) so tests
//! can swap in zero-delay versions.

use crate::config::{FetchConfig, MAX_DELAY_SECS};
use rand::Rng;
use std::time::{Duration, Instant};

/// Converts configured seconds, clamped to `[0, MAX_DELAY_SECS]`; NaN is zero
fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.clamp(0.0, MAX_DELAY_SECS)).unwrap_or(Duration::ZERO)
}

/// How often a failing request is repeated and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per fetch, the first one included
    pub max_attempts: u32,

    /// Wait after the first failed attempt; doubles after each further one
    pub base_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_backoff,
        }
    }

    /// Retries without any backoff
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(
            config.max_retries,
            secs_to_duration(config.backoff_base_secs),
        )
    }

    /// Backoff to wait after `failed_attempt` (1-based) before trying again
    ///
    /// `base * 2^(failed_attempt - 1)`: 1s, 2s, 4s, ... for a 1s base.
    pub fn backoff_after(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(16);
        self.base_backoff.saturating_mul(1u32 << exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Enforces a jittered minimum interval between any two requests
///
/// Applied before every request, retries included.
#[derive(Debug, Clone)]
pub struct RequestThrottle {
    min_interval: Duration,
    max_interval: Duration,
    last_request: Option<Instant>,
}

impl RequestThrottle {
    pub fn new(min_interval: Duration, max_interval: Duration) -> Self {
        Self {
            min_interval,
            max_interval: max_interval.max(min_interval),
            last_request: None,
        }
    }

    /// A throttle that never waits
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(
            secs_to_duration(config.delay_min_secs),
            secs_to_duration(config.delay_max_secs),
        )
    }

    /// Draws the interval for the next request from `[min, max]`
    pub fn next_interval(&self) -> Duration {
        if self.max_interval <= self.min_interval {
            return self.min_interval;
        }
        let secs = rand::thread_rng()
            .gen_range(self.min_interval.as_secs_f64()..=self.max_interval.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    /// Sleeps until the interval since the previous request has elapsed,
    /// then records the current request
    pub async fn wait(&mut self) {
        if let Some(last) = self.last_request {
            let interval = self.next_interval();
            let elapsed = last.elapsed();
            if interval > elapsed {
                let remaining = interval - elapsed;
                tracing::trace!("Throttling next request for {:?}", remaining);
                tokio::time::sleep(remaining).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}
