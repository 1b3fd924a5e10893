//! # Host collaborators.
//!
//! The supervisor never runs containers itself. The host provides:
//! - [`ContainerHandle`]: a sandboxed process that can be started, signalled,
//!   destroyed, monitored and reached over TCP ports;
//! - [`ExecutionContext`]: the coordinator the supervisor lives in, offering a
//!   critical section and an escalation hatch (`abort`).
//!
//! [`LocalContext`] is a ready-made [`ExecutionContext`] for plain Tokio hosts.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::BoxFuture;
use http::{Request, Response};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::ContainerError;

/// Future that completes when the container process terminates.
///
/// Resolves `Ok(())` on a clean exit and `Err` on a crash, a non-zero exit
/// ([`ContainerError::Exited`]) or a host-side failure.
pub type MonitorFuture = BoxFuture<'static, Result<(), ContainerError>>;

/// Parameters of a single start command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LaunchSpec {
    /// Overrides the image entrypoint.
    pub entrypoint: Option<Vec<String>>,
    /// Whether the container may reach the internet.
    pub enable_internet: bool,
    /// Environment variables.
    pub env: Option<BTreeMap<String, String>>,
    /// Host-enforced hard runtime limit.
    pub hard_timeout: Option<Duration>,
}

/// Host-provided handle to a sandboxed container process.
///
/// `running` is owned by the host; the supervisor reads it after every
/// suspension point and never caches it.
#[async_trait]
pub trait ContainerHandle: Send + Sync + 'static {
    /// Whether the host currently considers the process running.
    fn running(&self) -> bool;

    /// Issues a start command.
    async fn start(&self, spec: LaunchSpec) -> Result<(), ContainerError>;

    /// Returns a future tracking the current process generation.
    fn monitor(&self) -> MonitorFuture;

    /// Requests forceful teardown; `reason` is surfaced by the monitor if set.
    async fn destroy(&self, reason: Option<String>) -> Result<(), ContainerError>;

    /// Delivers a signal to the process.
    async fn signal(&self, signo: i32) -> Result<(), ContainerError>;

    /// Sends an HTTP request to `port` inside the container.
    ///
    /// Implementations should abandon the request once `cancel` fires.
    async fn fetch(
        &self,
        port: u16,
        request: Request<Bytes>,
        cancel: CancellationToken,
    ) -> Result<Response<Bytes>, ContainerError>;

    /// Lets the host stop the container after `duration` without activity.
    async fn set_inactivity_timeout(&self, duration: Duration) -> Result<(), ContainerError>;
}

/// Host-provided coordinator the supervisor runs in.
#[async_trait]
pub trait ExecutionContext: Send + Sync + 'static {
    /// The container capability, if this coordinator has one.
    fn container(&self) -> Option<Arc<dyn ContainerHandle>>;

    /// Runs `section` under the coordinator's mutual exclusion.
    async fn exclusive(
        &self,
        section: BoxFuture<'_, Result<(), ContainerError>>,
    ) -> Result<(), ContainerError>;

    /// Escalates: asks the coordinator to tear itself down and restart clean.
    fn abort(&self, reason: &str);
}

/// In-process [`ExecutionContext`] backed by a Tokio mutex.
///
/// `abort()` cancels [`LocalContext::aborted`] so an outer supervisor can
/// observe the escalation and rebuild the coordinator.
pub struct LocalContext {
    container: Option<Arc<dyn ContainerHandle>>,
    lock: Mutex<()>,
    aborted: CancellationToken,
    aborts: AtomicUsize,
}

impl LocalContext {
    /// Creates a context exposing `container`.
    pub fn new(container: Arc<dyn ContainerHandle>) -> Self {
        Self {
            container: Some(container),
            lock: Mutex::new(()),
            aborted: CancellationToken::new(),
            aborts: AtomicUsize::new(0),
        }
    }

    /// Creates a context without a container capability.
    pub fn without_container() -> Self {
        Self {
            container: None,
            lock: Mutex::new(()),
            aborted: CancellationToken::new(),
            aborts: AtomicUsize::new(0),
        }
    }

    /// Token cancelled on the first `abort()`.
    pub fn aborted(&self) -> CancellationToken {
        self.aborted.clone()
    }

    /// Number of `abort()` calls so far.
    pub fn abort_count(&self) -> usize {
        self.aborts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExecutionContext for LocalContext {
    fn container(&self) -> Option<Arc<dyn ContainerHandle>> {
        self.container.clone()
    }

    async fn exclusive(
        &self,
        section: BoxFuture<'_, Result<(), ContainerError>>,
    ) -> Result<(), ContainerError> {
        let _held = self.lock.lock().await;
        section.await
    }

    fn abort(&self, _reason: &str) {
        self.aborts.fetch_add(1, Ordering::SeqCst);
        self.aborted.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::AtomicBool;

    #[tokio::test]
    async fn test_exclusive_serializes_sections() {
        let ctx = Arc::new(LocalContext::without_container());
        let inside = Arc::new(AtomicBool::new(false));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let ctx = Arc::clone(&ctx);
            let inside = Arc::clone(&inside);
            handles.push(tokio::spawn(async move {
                ctx.exclusive(
                    async move {
                        assert!(!inside.swap(true, Ordering::SeqCst));
                        tokio::task::yield_now().await;
                        inside.store(false, Ordering::SeqCst);
                        Ok(())
                    }
                    .boxed(),
                )
                .await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
    }

    #[test]
    fn test_abort_is_counted_and_observable() {
        let ctx = LocalContext::without_container();
        assert!(ctx.container().is_none());
        ctx.abort("network connection lost");
        assert_eq!(ctx.abort_count(), 1);
        assert!(ctx.aborted().is_cancelled());
    }
}
