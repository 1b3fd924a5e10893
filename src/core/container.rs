//! # Container: the supervisor's public face.
//!
//! [`Container`] ties a host [`ContainerHandle`] to its [`ExecutionContext`]
//! and exposes `start`, `stop`, `destroy`, `state` and (in `router`) `handle`.
//!
//! ## Coalescing
//! ```text
//! start(plan) ─► InFlight::join ─► await loop result, racing own cancel token
//!                                     ├─ Ok, loop covers plan       ─► Ok
//!                                     ├─ Ok, other port / no wait   ─► run again for plan
//!                                     ├─ Cancelled, not by caller   ─► run again for plan
//!                                     └─ otherwise                  ─► result
//! ```
//! - At most one start loop runs per container.
//! - A caller's cancellation only ends that caller's wait; the loop stops
//!   once no caller is waiting on it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::DropGuard;

use super::builder::ContainerBuilder;
use super::inflight::InFlight;
use super::options::{StartOptions, StartPlan};
use super::startup::Startup;
use crate::{
    config::ContainerConfig,
    error::ContainerError,
    events::{Bus, Event, EventKind},
    host::{ContainerHandle, ExecutionContext},
    signal::Signal,
};

pub(crate) struct Inner {
    pub startup: Startup,
    pub handle: Arc<dyn ContainerHandle>,
    pub cfg: ContainerConfig,
    pub bus: Bus,
    pub inactivity: Duration,
    pub inflight: InFlight,
    pub _listener: DropGuard,
}

/// Whether the host reports the container as running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerStatus {
    Running,
    Stopped,
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerStatus::Running => f.write_str("running"),
            ContainerStatus::Stopped => f.write_str("stopped"),
        }
    }
}

/// Snapshot returned by [`Container::state`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContainerState {
    pub status: ContainerStatus,
}

/// A supervised container.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use containervisor::{Container, ContainerConfig, ContainerHandle, LocalContext, StartOptions};
///
/// # async fn demo(handle: Arc<dyn ContainerHandle>) -> Result<(), containervisor::ContainerError> {
/// let mut cfg = ContainerConfig::default();
/// cfg.default_port = Some(8080);
///
/// let ctx = Arc::new(LocalContext::new(handle));
/// let container = Container::builder(cfg, ctx).build()?;
/// container.start(StartOptions::default()).await?;
/// assert_eq!(container.state().status.to_string(), "running");
/// # Ok(())
/// # }
/// ```
pub struct Container {
    inner: Arc<Inner>,
}

impl Container {
    /// Starts building a container for `ctx`.
    pub fn builder(cfg: ContainerConfig, ctx: Arc<dyn ExecutionContext>) -> ContainerBuilder {
        ContainerBuilder::new(cfg, ctx)
    }

    pub(crate) fn from_inner(inner: Inner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Static configuration.
    pub fn config(&self) -> &ContainerConfig {
        &self.inner.cfg
    }

    /// Event bus; subscribe to observe the supervisor.
    pub fn bus(&self) -> &Bus {
        &self.inner.bus
    }

    pub(crate) fn handle_ref(&self) -> &Arc<dyn ContainerHandle> {
        &self.inner.handle
    }

    /// Current status as reported by the host.
    pub fn state(&self) -> ContainerState {
        let status = if self.inner.handle.running() {
            ContainerStatus::Running
        } else {
            ContainerStatus::Stopped
        };
        ContainerState { status }
    }

    /// Starts the container (if needed) and waits for readiness.
    ///
    /// Returns immediately when the container runs and `wait_for_ready` is
    /// false. Concurrent calls share one start loop.
    pub async fn start(&self, opts: StartOptions) -> Result<(), ContainerError> {
        let plan = StartPlan::resolve(opts, &self.inner.cfg, self.inner.inactivity)?;
        if plan.cancel.is_cancelled() {
            return Err(ContainerError::cancelled("cancelled before start attempt"));
        }

        loop {
            let (ticket, waiter) = self.inner.inflight.join(&self.inner.startup, &plan);
            let res = tokio::select! {
                biased;
                _ = plan.cancel.cancelled() => {
                    return Err(ContainerError::cancelled("cancelled while waiting for start"));
                }
                res = ticket.fut.clone() => res,
            };
            drop(waiter);

            match res {
                Ok(()) if ticket.covers(&plan) => return Ok(()),
                Ok(()) => continue,
                Err(err) if err.is_cancelled() && !plan.cancel.is_cancelled() => continue,
                Err(err) => return Err(err),
            }
        }
    }

    /// Sends `signal` to the container; a no-op when it is not running.
    pub async fn stop(&self, signal: Signal) -> Result<(), ContainerError> {
        if !self.inner.handle.running() {
            return Ok(());
        }
        let signo = signal.number()?;
        self.inner.handle.signal(signo).await?;
        self.inner
            .bus
            .publish(Event::new(EventKind::SignalSent).with_signal(signo));
        Ok(())
    }

    /// Requests forceful teardown regardless of state. Not retried.
    pub async fn destroy(&self) -> Result<(), ContainerError> {
        self.inner
            .bus
            .publish(Event::new(EventKind::DestroyRequested));
        self.inner.handle.destroy(None).await
    }
}
