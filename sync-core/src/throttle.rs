//! Minimum-interval throttle for slice loads.

use std::time::{Duration, Instant};

/// Default minimum spacing between two loads of the same slice.
pub const DEFAULT_LOAD_INTERVAL: Duration = Duration::from_secs(1);

/// Admits at most one call per `min_interval`.
#[derive(Debug, Clone)]
pub struct LoadThrottle {
    min_interval: Duration,
    last_admitted: Option<Instant>,
}

impl LoadThrottle {
    /// Create a throttle that has admitted nothing yet.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_admitted: None,
        }
    }

    /// Admit a call at `now` if the interval has elapsed since the last one.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        match self.last_admitted {
            Some(last) if now.saturating_duration_since(last) < self.min_interval => false,
            _ => {
                self.last_admitted = Some(now);
                true
            }
        }
    }

    /// Record a call admitted outside the throttle (e.g. a forced refresh).
    pub fn mark(&mut self, now: Instant) {
        self.last_admitted = Some(now);
    }

    /// Forget the last admission.
    pub fn reset(&mut self) {
        self.last_admitted = None;
    }
}

impl Default for LoadThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_LOAD_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_call_is_admitted() {
        let mut throttle = LoadThrottle::default();
        assert!(throttle.try_acquire(Instant::now()));
    }

    #[test]
    fn calls_within_interval_are_rejected() {
        let now = Instant::now();
        let mut throttle = LoadThrottle::default();
        assert!(throttle.try_acquire(now));
        assert!(!throttle.try_acquire(now + Duration::from_millis(999)));
        assert!(throttle.try_acquire(now + Duration::from_secs(1)));
    }

    #[test]
    fn mark_and_reset() {
        let now = Instant::now();
        let mut throttle = LoadThrottle::default();
        throttle.mark(now);
        assert!(!throttle.try_acquire(now));
        throttle.reset();
        assert!(throttle.try_acquire(now));
    }
}
