//! Retry backoff for slice loads.
//!
//! Deterministic exponential backoff: `min(cap, base * 2^(retry - 1))`.
//! Slices retry a handful of times at most, so no jitter is applied.

use std::time::Duration;

/// Default delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Default ceiling for any single retry delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(5);

/// Default number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Exponential backoff policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub base: Duration,
    /// Upper bound on a single delay.
    pub cap: Duration,
    /// Retries after the initial attempt.
    pub max_retries: u32,
}

impl BackoffPolicy {
    /// Create a policy.
    pub fn new(base: Duration, cap: Duration, max_retries: u32) -> Self {
        Self {
            base,
            cap,
            max_retries,
        }
    }

    /// Delay before retry number `retry` (1-based).
    ///
    /// Returns `None` once `retry` exceeds `max_retries`.
    pub fn delay(&self, retry: u32) -> Option<Duration> {
        if retry == 0 || retry > self.max_retries {
            return None;
        }
        let factor = 2u32.saturating_pow(retry.saturating_sub(1).min(16));
        Some(self.base.saturating_mul(factor).min(self.cap))
    }

    /// Total attempts, initial one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY, DEFAULT_MAX_RETRIES)
    }
}
