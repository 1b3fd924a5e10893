//! # Per-probe cancellation.
//!
//! [`ProbeToken::compose`] merges the caller's [`CancellationToken`] with a
//! per-probe timeout into one derived token:
//!
//! ```text
//! caller token ──┐
//!                ├─► watcher (first wins) ──► derived.cancel() + reason
//! sleep(timeout) ┘
//! ```
//!
//! ## Rules
//! - The reason is recorded **once**, before the derived token fires.
//! - The watcher exits on every path: timeout, caller cancellation, or the
//!   [`ProbeToken`] being dropped. No timer outlives its probe.
//! - Cancelling the derived token never touches the caller's token.

use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::time;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::ContainerError;

/// Why a [`ProbeToken`] fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelReason {
    /// The per-probe budget elapsed ("ping timed out").
    Timeout,
    /// The caller's token fired.
    Caller,
}

/// Cancellation token for a single readiness probe.
pub struct ProbeToken {
    token: CancellationToken,
    reason: Arc<OnceLock<CancelReason>>,
    _guard: DropGuard,
}

impl ProbeToken {
    /// Derives a token that fires when `timeout` elapses or `caller` is cancelled.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn compose(caller: Option<&CancellationToken>, timeout: Duration) -> Self {
        let token = CancellationToken::new();
        let reason = Arc::new(OnceLock::new());
        let caller = caller.cloned().unwrap_or_default();

        let derived = token.clone();
        let slot = Arc::clone(&reason);
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = caller.cancelled() => {
                    let _ = slot.set(CancelReason::Caller);
                    derived.cancel();
                }
                _ = derived.cancelled() => {}
                _ = time::sleep(timeout) => {
                    let _ = slot.set(CancelReason::Timeout);
                    derived.cancel();
                }
            }
        });

        Self {
            _guard: token.clone().drop_guard(),
            token,
            reason,
        }
    }

    /// The derived token, to hand to the probe request.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Whether the derived token has fired.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Why the token fired, if it did.
    pub fn reason(&self) -> Option<CancelReason> {
        self.reason.get().copied()
    }

    /// Error describing why the token fired.
    ///
    /// Unfired tokens report a timeout; callers only ask after cancellation.
    pub fn error(&self) -> ContainerError {
        match self.reason() {
            Some(CancelReason::Caller) => ContainerError::cancelled("cancelled during readiness probe"),
            Some(CancelReason::Timeout) | None => ContainerError::ProbeTimeout,
        }
    }

    /// Runs `fut` until it completes or the token fires, whichever is first.
    ///
    /// A fired token wins over a future that fails because of it.
    pub async fn guard<T, F>(&self, fut: F) -> Result<T, ContainerError>
    where
        F: Future<Output = Result<T, ContainerError>>,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(self.error()),
            res = fut => res,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fires_with_timeout_reason() {
        let probe = ProbeToken::compose(None, Duration::from_millis(50));
        assert!(!probe.is_cancelled());

        probe.token().cancelled().await;
        assert_eq!(probe.reason(), Some(CancelReason::Timeout));
        assert_eq!(probe.error().to_string(), "ping timed out");
    }

    #[tokio::test(start_paused = true)]
    async fn test_caller_cancellation_wins_before_timeout() {
        let caller = CancellationToken::new();
        let probe = ProbeToken::compose(Some(&caller), Duration::from_secs(60));

        caller.cancel();
        probe.token().cancelled().await;
        assert_eq!(probe.reason(), Some(CancelReason::Caller));
        assert!(probe.error().is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_cancelled_caller_fires_immediately() {
        let caller = CancellationToken::new();
        caller.cancel();
        let probe = ProbeToken::compose(Some(&caller), Duration::ZERO);

        probe.token().cancelled().await;
        assert_eq!(probe.reason(), Some(CancelReason::Caller));
    }

    #[tokio::test(start_paused = true)]
    async fn test_derived_never_cancels_caller() {
        let caller = CancellationToken::new();
        let probe = ProbeToken::compose(Some(&caller), Duration::from_millis(1));
        probe.token().cancelled().await;
        assert!(!caller.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_releases_derived_token() {
        let probe = ProbeToken::compose(None, Duration::from_secs(3600));
        let derived = probe.token();
        drop(probe);
        assert!(derived.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_maps_timeout() {
        let probe = ProbeToken::compose(None, Duration::from_millis(10));
        let res: Result<(), _> = probe.guard(std::future::pending()).await;
        assert!(matches!(res, Err(ContainerError::ProbeTimeout)));

        let probe = ProbeToken::compose(None, Duration::from_secs(10));
        let res = probe.guard(async { Ok::<_, ContainerError>(7) }).await;
        assert_eq!(res.unwrap(), 7);
    }
}
