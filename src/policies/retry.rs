//! # Retry budget for container startup.
//!
//! [`RetryPolicy`] bounds how many readiness probes one `start()` makes and how
//! long each probe may take before it counts as failed.

use std::time::Duration;

/// How many start/probe attempts to make and the budget of each probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (values below 1 are treated as 1).
    pub limit: u32,
    /// Per-probe timeout; each attempt gets a fresh budget.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    /// Returns `limit = 10`, `delay = 5000ms`.
    fn default() -> Self {
        Self {
            limit: 10,
            delay: Duration::from_millis(5000),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy from an attempt limit and per-probe timeout.
    pub fn new(limit: u32, delay: Duration) -> Self {
        Self { limit, delay }
    }

    /// Attempt limit clamped to a minimum of 1.
    #[inline]
    pub fn attempts(&self) -> u32 {
        self.limit.max(1)
    }

    /// Whether `attempt` (0-based) is the last one allowed.
    #[inline]
    pub fn is_last(&self, attempt: u32) -> bool {
        attempt + 1 >= self.attempts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = RetryPolicy::default();
        assert_eq!(p.limit, 10);
        assert_eq!(p.delay, Duration::from_secs(5));
    }

    #[test]
    fn test_zero_limit_still_allows_one_attempt() {
        let p = RetryPolicy::new(0, Duration::from_secs(1));
        assert_eq!(p.attempts(), 1);
        assert!(p.is_last(0));
    }

    #[test]
    fn test_is_last() {
        let p = RetryPolicy::new(3, Duration::from_secs(1));
        assert!(!p.is_last(0));
        assert!(!p.is_last(1));
        assert!(p.is_last(2));
    }
}
