//! # Inter-attempt pause.
//!
//! [`PollPolicy`] controls how long the start loop sleeps between two probes.
//! It is independent of the per-probe timeout in
//! [`RetryPolicy`](crate::RetryPolicy).
//!
//! The pause for attempt `n` is `interval × factor^n`, clamped to `max`.
//! The default is a constant 300ms.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use containervisor::PollPolicy;
//!
//! let poll = PollPolicy {
//!     interval: Duration::from_millis(100),
//!     factor: 2.0,
//!     max: Duration::from_secs(1),
//! };
//! assert_eq!(poll.next(0), Duration::from_millis(100));
//! assert_eq!(poll.next(2), Duration::from_millis(400));
//! assert_eq!(poll.next(10), Duration::from_secs(1));
//! ```

use std::time::Duration;

/// Pause between readiness probes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PollPolicy {
    /// Pause after the first failed attempt.
    pub interval: Duration,
    /// Multiplicative growth (`1.0` = constant).
    pub factor: f64,
    /// Upper bound for the pause.
    pub max: Duration,
}

impl Default for PollPolicy {
    /// Constant 300ms.
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(300),
            factor: 1.0,
            max: Duration::from_millis(300),
        }
    }
}

impl PollPolicy {
    /// A constant pause.
    pub fn constant(interval: Duration) -> Self {
        Self {
            interval,
            factor: 1.0,
            max: interval,
        }
    }

    /// Pause after attempt `attempt` (0-based), clamped to [`PollPolicy::max`].
    pub fn next(&self, attempt: u32) -> Duration {
        let exp = attempt.min(i32::MAX as u32) as i32;
        let secs = self.interval.as_secs_f64() * self.factor.powi(exp);
        if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}
