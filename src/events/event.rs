//! # Lifecycle events emitted by the container supervisor.
//!
//! [`EventKind`] classifies what happened; [`Event`] carries the metadata
//! (attempt, port, delay, reason, signal) relevant to that kind.
//!
//! ## Ordering guarantees
//! Every event gets a globally unique, monotonically increasing `seq`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use containervisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::RetryScheduled)
//!     .with_attempt(2)
//!     .with_delay(Duration::from_millis(300))
//!     .with_reason("ping timed out");
//!
//! assert_eq!(ev.kind, EventKind::RetryScheduled);
//! assert_eq!(ev.delay_ms, Some(300));
//! assert_eq!(ev.reason.as_deref(), Some("ping timed out"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of supervisor events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Startup ===
    /// A start command was issued to the host.
    ///
    /// Sets: `attempt`
    StartIssued,

    /// A readiness probe failed.
    ///
    /// Sets: `attempt`, `port`, `reason`
    ProbeFailed,

    /// The loop will try again after a pause.
    ///
    /// Sets: `attempt` (the failed one), `delay_ms`
    RetryScheduled,

    /// The container is ready (or running, when readiness was not requested).
    ///
    /// Sets: `attempt`, `port`
    Ready,

    /// Startup gave up and returned an error.
    ///
    /// Sets: `attempt`, `reason`
    Escalated,

    /// The execution context was asked to tear down.
    ///
    /// Sets: `reason`
    Aborted,

    /// The caller cancelled startup.
    ///
    /// Sets: `attempt`, `reason`
    Cancelled,

    // === Administration ===
    /// A signal was forwarded to the running container.
    ///
    /// Sets: `signal`
    SignalSent,

    /// Forceful teardown was requested.
    DestroyRequested,

    // === Subscriber events ===
    /// A subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `reason`
    SubscriberOverflow,

    /// A subscriber panicked while handling an event.
    ///
    /// Sets: `reason`
    SubscriberPanicked,
}

/// Supervisor event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Attempt number (0-based, per `start()`).
    pub attempt: Option<u32>,
    /// Container port involved.
    pub port: Option<u16>,
    /// Pause before the next attempt in milliseconds.
    pub delay_ms: Option<u32>,
    /// Numeric signal forwarded to the container.
    pub signal: Option<i32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            attempt: None,
            port: None,
            delay_ms: None,
            signal: None,
            reason: None,
        }
    }

    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    #[inline]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    #[inline]
    pub fn with_signal(mut self, signo: i32) -> Self {
        self.signal = Some(signo);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} panic={info}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::StartIssued);
        let b = Event::new(EventKind::Ready);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_delay_saturates() {
        let ev = Event::new(EventKind::RetryScheduled).with_delay(Duration::from_secs(u64::MAX));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }
}
