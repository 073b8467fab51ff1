//! Circuit breaker state machine.
//!
//! Counts consecutive failures of a slice's external calls. Once the count
//! reaches the threshold the breaker opens for a fixed cooldown; while open,
//! callers must not touch the network. The breaker never reads a clock: the
//! caller passes `now` in, which keeps this module pure and testable.

use std::time::{Duration, Instant};

/// Default number of consecutive failures that opens the breaker.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Default time the breaker stays open.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);

/// Snapshot of a breaker, for observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerState {
    /// Failures since the last success.
    pub consecutive_failures: u32,
    /// Calls short-circuit until this instant.
    pub open_until: Option<Instant>,
}

/// Result of recording a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Failure counted, breaker still closed.
    Counted {
        /// Failures since the last success.
        consecutive_failures: u32,
    },
    /// This failure reached the threshold and opened the breaker.
    Tripped {
        /// When the breaker closes again.
        open_until: Instant,
    },
}

/// Consecutive-failure circuit breaker.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    cooldown: Duration,
    consecutive_failures: u32,
    open_until: Option<Instant>,
}

impl CircuitBreaker {
    /// Create a closed breaker.
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            cooldown,
            consecutive_failures: 0,
            open_until: None,
        }
    }

    /// Whether calls must short-circuit at `now`.
    pub fn is_open(&self, now: Instant) -> bool {
        matches!(self.open_until, Some(until) if now < until)
    }

    /// Time left before the breaker closes, if it is open.
    pub fn remaining_cooldown(&self, now: Instant) -> Option<Duration> {
        self.open_until
            .filter(|until| now < *until)
            .map(|until| until - now)
    }

    /// Count a failed call.
    ///
    /// After the cooldown elapses the count is not reset, so a single
    /// further failure reopens the breaker immediately.
    pub fn record_failure(&mut self, now: Instant) -> FailureOutcome {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.consecutive_failures >= self.failure_threshold {
            let until = now + self.cooldown;
            self.open_until = Some(until);
            FailureOutcome::Tripped { open_until: until }
        } else {
            FailureOutcome::Counted {
                consecutive_failures: self.consecutive_failures,
            }
        }
    }

    /// Reset after a successful call.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.open_until = None;
    }

    /// Failures since the last success.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Current snapshot.
    pub fn state(&self) -> BreakerState {
        BreakerState {
            consecutive_failures: self.consecutive_failures,
            open_until: self.open_until,
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD, DEFAULT_COOLDOWN)
    }
}
