//! # Failure classification for the start loop.
//!
//! [`classify`] decides whether a failure is transient infrastructure
//! unavailability ([`Classification::Retryable`]) or anything else
//! ([`Classification::Fatal`]).
//!
//! Structured [`HostErrorKind`]s are consulted first. Hosts that only report
//! messages are matched against the well-known wording, lowercased:
//!
//! ```text
//! retryable:        "there is no container instance that can be provided to this durable object"
//!                   "maximum number of running container instances exceeded"
//! not listening:    "the container is not listening"
//! connection lost:  "network connection lost"
//! ```

use crate::error::{ContainerError, HostError, HostErrorKind};

const NO_INSTANCE: &str =
    "there is no container instance that can be provided to this durable object";
const INSTANCE_LIMIT: &str = "maximum number of running container instances exceeded";
const NOT_LISTENING: &str = "the container is not listening";
const CONNECTION_LOST: &str = "network connection lost";

/// Outcome of [`classify`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    /// Transient; the start command may be re-issued on the next attempt.
    Retryable,
    /// Crash, misconfiguration, or anything unknown.
    Fatal,
}

/// Classifies a failure for the start loop.
///
/// # Example
/// ```
/// use containervisor::{classify, Classification, ContainerError};
///
/// let err = ContainerError::host_message(
///     "Maximum number of running container instances exceeded, try again later",
/// );
/// assert_eq!(classify(&err), Classification::Retryable);
/// assert_eq!(classify(&ContainerError::Exited { code: 2 }), Classification::Fatal);
/// ```
pub fn classify(err: &ContainerError) -> Classification {
    match host_kind(err) {
        Some(HostErrorKind::NoInstance | HostErrorKind::InstanceLimit) => {
            Classification::Retryable
        }
        _ => Classification::Fatal,
    }
}

/// The container runs, but its application does not accept connections yet.
pub fn is_not_listening(err: &ContainerError) -> bool {
    host_kind(err) == Some(HostErrorKind::NotListening)
}

/// The transport to the process-hosting layer is gone; local retries cannot repair it.
pub fn is_connection_lost(err: &ContainerError) -> bool {
    host_kind(err) == Some(HostErrorKind::ConnectionLost)
}

/// Structured kind of a host error, inferred from the message when absent.
fn host_kind(err: &ContainerError) -> Option<HostErrorKind> {
    match err {
        ContainerError::Host(host) => Some(host.kind().unwrap_or_else(|| infer_kind(host))),
        _ => None,
    }
}

fn infer_kind(host: &HostError) -> HostErrorKind {
    let msg = host.message().to_lowercase();
    if msg.contains(NO_INSTANCE) {
        HostErrorKind::NoInstance
    } else if msg.contains(INSTANCE_LIMIT) {
        HostErrorKind::InstanceLimit
    } else if msg.contains(NOT_LISTENING) {
        HostErrorKind::NotListening
    } else if msg.contains(CONNECTION_LOST) {
        HostErrorKind::ConnectionLost
    } else {
        HostErrorKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_kinds_win_over_message() {
        let err = ContainerError::host(HostErrorKind::NoInstance, "something unrelated");
        assert_eq!(classify(&err), Classification::Retryable);

        let err = ContainerError::host(HostErrorKind::Other, "Network connection lost.");
        assert_eq!(classify(&err), Classification::Fatal);
        assert!(!is_connection_lost(&err));
    }

    #[test]
    fn test_message_fallback_is_case_insensitive() {
        let err = ContainerError::host_message(
            "There is no Container instance that can be provided to this Durable Object",
        );
        assert_eq!(classify(&err), Classification::Retryable);

        let err = ContainerError::host_message("Network connection lost.");
        assert!(is_connection_lost(&err));
        assert_eq!(classify(&err), Classification::Fatal);
    }

    #[test]
    fn test_not_listening_is_not_retryable() {
        let err = ContainerError::host_message(
            "connect(): The container is not listening in the TCP address 10.0.0.1:8080",
        );
        assert!(is_not_listening(&err));
        assert_eq!(classify(&err), Classification::Fatal);
    }

    #[test]
    fn test_non_host_errors_are_fatal() {
        assert_eq!(classify(&ContainerError::ProbeTimeout), Classification::Fatal);
        assert_eq!(
            classify(&ContainerError::cancelled("caller")),
            Classification::Fatal
        );
        assert!(!is_not_listening(&ContainerError::ProbeTimeout));
    }
}
