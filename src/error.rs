//! Error types used by the container supervisor.
//!
//! Everything the crate can fail with is a [`ContainerError`]. Failures reported
//! by the host (the container runtime behind [`ContainerHandle`](crate::ContainerHandle))
//! are wrapped in [`HostError`], which carries an optional structured
//! [`HostErrorKind`] next to the raw message.
//!
//! Errors are `Clone` so a single startup result can be shared between
//! coalesced `start()` callers.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::classify::{Classification, classify};

/// Structured classification a host may attach to its errors.
///
/// Hosts that only produce messages leave the kind unset; the classifier then
/// falls back to matching well-known message text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostErrorKind {
    /// No container instance can be allocated to the coordinator right now.
    NoInstance,
    /// The maximum number of concurrently running instances was exceeded.
    InstanceLimit,
    /// The container process is up but nothing accepts connections on the port yet.
    NotListening,
    /// The connection to the process-hosting layer was lost.
    ConnectionLost,
    /// Anything else.
    Other,
}

/// A failure reported by the host runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostError {
    kind: Option<HostErrorKind>,
    message: Arc<str>,
}

impl HostError {
    /// Creates a host error with a structured kind.
    pub fn new(kind: HostErrorKind, message: impl Into<Arc<str>>) -> Self {
        Self {
            kind: Some(kind),
            message: message.into(),
        }
    }

    /// Creates a host error that only carries a message.
    pub fn untyped(message: impl Into<Arc<str>>) -> Self {
        Self {
            kind: None,
            message: message.into(),
        }
    }

    /// Structured kind, if the host supplied one.
    pub fn kind(&self) -> Option<HostErrorKind> {
        self.kind
    }

    /// Raw message as reported by the host.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// # Errors produced by the container supervisor.
///
/// The variants fall into the groups the supervisor treats differently:
/// - host failures ([`ContainerError::Host`], [`ContainerError::Exited`]), classified
///   as retryable or fatal by [`classify`];
/// - probe failures ([`ContainerError::ProbeTimeout`]);
/// - caller cancellation ([`ContainerError::Cancelled`]);
/// - configuration errors (`Missing*`, `Invalid*`), never retried;
/// - lifecycle hook failures ([`ContainerError::Hook`]).
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum ContainerError {
    /// Failure reported by the host runtime.
    #[error("{0}")]
    Host(HostError),

    /// The container process exited with a non-zero code.
    #[error("Container exited with unexpected exit code: {code}")]
    Exited {
        /// Process exit code.
        code: i32,
    },

    /// A readiness probe did not complete within its per-attempt budget.
    #[error("ping timed out")]
    ProbeTimeout,

    /// The caller's cancellation token fired.
    #[error("container start cancelled: {reason}")]
    Cancelled {
        /// Where the cancellation was observed.
        reason: Arc<str>,
    },

    /// The execution context exposes no container capability.
    #[error("execution context does not provide a container")]
    MissingContainer,

    /// Neither a default port nor a port in the request destination is available.
    #[error("no target port: set a default port or address the request to an explicit port")]
    MissingPort,

    /// A duration expression could not be parsed.
    #[error("invalid duration {input:?}: expected <digits><s|m|h> or whole seconds")]
    InvalidDuration {
        /// The rejected input.
        input: String,
    },

    /// A signal name or number is not acceptable.
    #[error("invalid signal {signal:?}")]
    InvalidSignal {
        /// The rejected input.
        signal: String,
    },

    /// An environment variable cannot be passed to the container.
    #[error("invalid environment variable {name:?}: {reason}")]
    InvalidEnv {
        /// Variable name.
        name: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// The inactivity timeout was zero.
    #[error("inactivity timeout must be greater than zero")]
    InvalidTimeout,

    /// Port 0 cannot be addressed.
    #[error("invalid port {port}: must be greater than zero")]
    InvalidPort {
        /// The rejected port.
        port: u16,
    },

    /// A lifecycle hook returned an error.
    #[error("lifecycle hook failed: {error}")]
    Hook {
        /// Message returned by the hook.
        error: Arc<str>,
    },
}

impl ContainerError {
    /// Shorthand for a typed host error.
    pub fn host(kind: HostErrorKind, message: impl Into<Arc<str>>) -> Self {
        ContainerError::Host(HostError::new(kind, message))
    }

    /// Shorthand for an untyped host error (message only).
    pub fn host_message(message: impl Into<Arc<str>>) -> Self {
        ContainerError::Host(HostError::untyped(message))
    }

    /// Shorthand for a cancellation error.
    pub fn cancelled(reason: impl Into<Arc<str>>) -> Self {
        ContainerError::Cancelled {
            reason: reason.into(),
        }
    }

    /// Shorthand for a hook error.
    pub fn hook(error: impl Into<Arc<str>>) -> Self {
        ContainerError::Hook {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/events.
    ///
    /// # Example
    /// ```
    /// use containervisor::ContainerError;
    ///
    /// assert_eq!(ContainerError::ProbeTimeout.as_label(), "probe_timeout");
    /// assert_eq!(ContainerError::MissingPort.as_label(), "missing_port");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ContainerError::Host(_) => "host_error",
            ContainerError::Exited { .. } => "container_exited",
            ContainerError::ProbeTimeout => "probe_timeout",
            ContainerError::Cancelled { .. } => "cancelled",
            ContainerError::MissingContainer => "missing_container",
            ContainerError::MissingPort => "missing_port",
            ContainerError::InvalidDuration { .. } => "invalid_duration",
            ContainerError::InvalidSignal { .. } => "invalid_signal",
            ContainerError::InvalidEnv { .. } => "invalid_env",
            ContainerError::InvalidTimeout => "invalid_timeout",
            ContainerError::InvalidPort { .. } => "invalid_port",
            ContainerError::Hook { .. } => "hook_failed",
        }
    }

    /// Indicates whether the start loop may absorb this error and try again.
    ///
    /// # Example
    /// ```
    /// use containervisor::{ContainerError, HostErrorKind};
    ///
    /// let busy = ContainerError::host(HostErrorKind::InstanceLimit, "too many");
    /// assert!(busy.is_retryable());
    ///
    /// let crash = ContainerError::Exited { code: 1 };
    /// assert!(!crash.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        classify(self) == Classification::Retryable
    }

    /// Whether this error is the caller's cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ContainerError::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_message_matches_host_wording() {
        let err = ContainerError::Exited { code: 137 };
        assert_eq!(
            err.to_string(),
            "Container exited with unexpected exit code: 137"
        );
    }

    #[test]
    fn test_host_error_displays_raw_message() {
        let err = ContainerError::host_message("Network connection lost.");
        assert_eq!(err.to_string(), "Network connection lost.");
        assert_eq!(err.as_label(), "host_error");
    }

    #[test]
    fn test_cancelled_is_distinguishable() {
        let err = ContainerError::cancelled("aborted by caller");
        assert!(err.is_cancelled());
        assert!(!err.is_retryable());
        assert!(!ContainerError::ProbeTimeout.is_cancelled());
    }
}
