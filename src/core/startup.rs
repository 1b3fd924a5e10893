//! # Startup supervisor: start, probe, retry, escalate.
//!
//! Drives one container from "maybe not running" to "ready", or fails.
//!
//! ## States
//! ```text
//! NotStarted ──► Starting ──► Probing ──► Ready
//!     ▲              │           │
//!     └── retry ─────┴───────────┴──► Escalated (error returned)
//! ```
//!
//! ## Loop
//! ```text
//! running && !wait_for_ready ─► return
//! for attempt in 0..limit {
//!   ├─► loop cancelled?                          ─► Cancelled
//!   ├─► !running && (attempt == 0 || last error retryable)
//!   │        └─► handle.start(), set_inactivity_timeout()
//!   ├─► take monitor (once per container generation)
//!   ├─► probe port with ProbeToken(loop token, retries.delay)
//!   │     ├─ Ok                                  ─► Ready
//!   │     └─ Err
//!   │          ├─ loop cancelled                 ─► Cancelled
//!   │          ├─ running:
//!   │          │    ├─ not listening && !wait    ─► Ready
//!   │          │    └─ otherwise                 ─► retry
//!   │          └─ stopped: await monitor (racing cancellation), classify
//!   │               ├─ Retryable                 ─► drop monitor, retry
//!   │               └─ Fatal                     ─► Escalated
//!   ├─► retry on the last attempt                ─► Escalated
//!   └─► sleep(poll.next(attempt)) racing loop cancellation
//! }
//! Escalated: last attempt && connection lost ─► ctx.abort(); on_error(); return error
//! Ready:     !was_running ─► ctx.exclusive(on_start()), failures as Hook
//! ```
//!
//! ## Rules
//! - `running` is re-read from the handle after every await.
//! - The start command is only re-issued after a retryable failure.
//! - Attempt state lives in [`Attempts`], owned by a single run.

use std::sync::Arc;

use bytes::Bytes;
use http::{Request, Uri};
use tokio::time;

use crate::cancel::ProbeToken;
use crate::classify::{is_connection_lost, is_not_listening};
use crate::core::options::StartPlan;
use crate::error::ContainerError;
use crate::events::{Bus, Event, EventKind};
use crate::hooks::Lifecycle;
use crate::host::{ContainerHandle, ExecutionContext, MonitorFuture};

/// Attempt state of one run.
#[derive(Default)]
struct Attempts {
    attempt: u32,
    last_error: Option<ContainerError>,
    monitor: Option<MonitorFuture>,
}

/// Outcome of one attempt.
enum Step {
    Ready,
    Retry(ContainerError),
    Fatal(ContainerError),
    Cancelled(ContainerError),
}

/// Everything a startup run needs; cheap to clone.
#[derive(Clone)]
pub(crate) struct Startup {
    pub handle: Arc<dyn ContainerHandle>,
    pub ctx: Arc<dyn ExecutionContext>,
    pub hooks: Arc<dyn Lifecycle>,
    pub bus: Bus,
}

impl Startup {
    /// Runs the start loop to completion.
    pub async fn run(&self, plan: StartPlan) -> Result<(), ContainerError> {
        let was_running = self.handle.running();
        if was_running && !plan.wait_for_ready {
            return Ok(());
        }

        let mut state = Attempts::default();
        let ready_at = loop {
            let attempt = state.attempt;
            if plan.cancel.is_cancelled() {
                return Err(self.cancelled(attempt, "cancelled before start attempt"));
            }

            match self.attempt(&plan, &mut state).await {
                Step::Ready => break attempt,
                Step::Cancelled(err) => return Err(self.report_cancel(attempt, err)),
                Step::Retry(err) if !plan.retries.is_last(attempt) => {
                    self.pause(&plan, attempt, &err).await?;
                    state.attempt += 1;
                }
                Step::Retry(err) | Step::Fatal(err) => {
                    let last = plan.retries.is_last(attempt);
                    return Err(self.escalate(err, attempt, last).await);
                }
            }
        };

        self.bus.publish(
            Event::new(EventKind::Ready)
                .with_attempt(ready_at)
                .with_port(plan.port),
        );

        if !was_running {
            self.ctx
                .exclusive(self.hooks.on_start())
                .await
                .map_err(|err| match err {
                    ContainerError::Hook { .. } => err,
                    other => ContainerError::hook(other.to_string()),
                })?;
        }
        Ok(())
    }

    async fn attempt(&self, plan: &StartPlan, state: &mut Attempts) -> Step {
        let attempt = state.attempt;
        let may_start = attempt == 0
            || state
                .last_error
                .as_ref()
                .is_some_and(ContainerError::is_retryable);

        if !self.handle.running() && may_start {
            if let Err(err) = self.launch(plan, attempt).await {
                return if err.is_retryable() {
                    state.last_error = Some(err.clone());
                    Step::Retry(err)
                } else {
                    Step::Fatal(err)
                };
            }
            state.last_error = None;
        }

        if state.monitor.is_none() {
            state.monitor = Some(self.handle.monitor());
        }

        let probe = ProbeToken::compose(Some(&plan.cancel), plan.retries.delay);
        let res = probe
            .guard(self.handle.fetch(plan.port, ping_request(), probe.token()))
            .await;
        let err = match res {
            Ok(_) => return Step::Ready,
            Err(err) => err,
        };

        if plan.cancel.is_cancelled() {
            return Step::Cancelled(err);
        }
        self.bus.publish(
            Event::new(EventKind::ProbeFailed)
                .with_attempt(attempt)
                .with_port(plan.port)
                .with_reason(err.to_string()),
        );

        if self.handle.running() {
            if !plan.wait_for_ready && is_not_listening(&err) {
                return Step::Ready;
            }
            return Step::Retry(err);
        }

        // The process is gone: its monitor knows why.
        let err = match state.monitor.take() {
            Some(monitor) => tokio::select! {
                res = monitor => res.err().unwrap_or(err),
                _ = plan.cancel.cancelled() => {
                    return Step::Cancelled(ContainerError::cancelled(
                        "cancelled while waiting for the container to exit",
                    ));
                }
            },
            None => err,
        };
        if err.is_retryable() {
            state.last_error = Some(err.clone());
            Step::Retry(err)
        } else {
            Step::Fatal(err)
        }
    }

    async fn launch(&self, plan: &StartPlan, attempt: u32) -> Result<(), ContainerError> {
        self.handle.start(plan.launch.clone()).await?;
        self.bus
            .publish(Event::new(EventKind::StartIssued).with_attempt(attempt));
        self.handle.set_inactivity_timeout(plan.inactivity).await
    }

    async fn pause(
        &self,
        plan: &StartPlan,
        attempt: u32,
        err: &ContainerError,
    ) -> Result<(), ContainerError> {
        let delay = plan.poll.next(attempt);
        self.bus.publish(
            Event::new(EventKind::RetryScheduled)
                .with_attempt(attempt)
                .with_delay(delay)
                .with_reason(err.to_string()),
        );

        tokio::select! {
            _ = time::sleep(delay) => Ok(()),
            _ = plan.cancel.cancelled() => {
                Err(self.cancelled(attempt, "cancelled while waiting to retry"))
            }
        }
    }

    async fn escalate(&self, err: ContainerError, attempt: u32, last: bool) -> ContainerError {
        if last && is_connection_lost(&err) {
            let reason = err.to_string();
            self.ctx.abort(&reason);
            self.bus
                .publish(Event::new(EventKind::Aborted).with_reason(reason));
        }
        self.bus.publish(
            Event::new(EventKind::Escalated)
                .with_attempt(attempt)
                .with_reason(err.to_string()),
        );
        self.hooks.on_error(&err).await;
        err
    }

    fn cancelled(&self, attempt: u32, reason: &'static str) -> ContainerError {
        self.report_cancel(attempt, ContainerError::cancelled(reason))
    }

    fn report_cancel(&self, attempt: u32, err: ContainerError) -> ContainerError {
        let err = if err.is_cancelled() {
            err
        } else {
            ContainerError::cancelled("cancelled during readiness probe")
        };
        self.bus.publish(
            Event::new(EventKind::Cancelled)
                .with_attempt(attempt)
                .with_reason(err.to_string()),
        );
        err
    }
}

/// Lightweight request used to check that the port accepts connections.
fn ping_request() -> Request<Bytes> {
    let mut req = Request::new(Bytes::new());
    *req.uri_mut() = Uri::from_static("http://ping/");
    req
}
