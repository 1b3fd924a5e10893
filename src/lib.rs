//! # containervisor
//!
//! **Containervisor** supervises the lifecycle of a sandboxed container that
//! lives behind a host-provided coordinator.
//!
//! It starts the container on demand, probes its port until the application
//! accepts connections, retries transient infrastructure failures, escalates
//! unrecoverable ones to the coordinator, and routes inbound HTTP requests
//! into the container once it is ready.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   inbound request          explicit start()        stop() / destroy()
//!         │                        │                         │
//!         ▼                        ▼                         │
//! ┌───────────────────────────────────────────────────────┐  │
//! │  Container (one per coordinator)                      │  │
//! │  - router: port resolution, scheme rewrite, forward   │  │
//! │  - coalescing: one in-flight start loop               │  │
//! └──────┬────────────────────────────────────────────────┘  │
//!        ▼                                                   │
//! ┌───────────────────────────────────────────────────────┐  │
//! │  Startup loop                                         │  │
//! │  - classify(): retryable / fatal                      │  │
//! │  - ProbeToken: loop cancellation ∪ probe timeout      │  │
//! │  - RetryPolicy / PollPolicy                           │  │
//! └──────┬───────────────────────────┬────────────────────┘  │
//!        ▼                           ▼                       ▼
//! ┌──────────────────┐    ┌───────────────────────────────────────┐
//! │ ExecutionContext │    │ ContainerHandle (host capability)     │
//! │ exclusive, abort │    │ start, monitor, fetch, signal, destroy│
//! └──────────────────┘    └───────────────────────────────────────┘
//!
//!   every step ── publish(Event) ──► Bus ──► SubscriberSet ──► LogWriter, custom
//! ```
//!
//! ### Start loop
//! ```text
//! running && !wait_for_ready ─► return
//! for attempt in 0..limit {
//!   ├─► start the container if stopped (first attempt, or after a retryable failure)
//!   ├─► probe the port, bounded by RetryPolicy::delay
//!   │     ├─ Ok                      ─► ready
//!   │     ├─ running, not listening  ─► retry (or ready when not waiting)
//!   │     └─ stopped                 ─► monitor result, classify
//!   └─► pause PollPolicy::next(attempt)
//! }
//! ready:  on_start() under the coordinator's exclusion (fresh starts only)
//! failed: abort() the coordinator on a lost connection at the last attempt, on_error()
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                                  |
//! |-------------------|--------------------------------------------------------------|-----------------------------------------------------|
//! | **Supervision**   | Start, probe, retry, escalate; coalesced concurrent starts.  | [`Container`], [`ContainerBuilder`], [`StartOptions`]|
//! | **Routing**       | Forward requests once the container is ready.                | [`Container::handle`]                               |
//! | **Host seam**     | Capabilities the supervisor drives.                          | [`ContainerHandle`], [`ExecutionContext`]           |
//! | **Hooks**         | User callbacks on fresh start and on failure.                | [`Lifecycle`]                                       |
//! | **Policies**      | Attempt limit, probe timeout, pause between attempts.        | [`RetryPolicy`], [`PollPolicy`]                     |
//! | **Errors**        | Typed errors and retryable/fatal classification.             | [`ContainerError`], [`classify`]                    |
//! | **Subscriber API**| Observe supervisor events (logging, metrics).                | [`Subscribe`], [`LogWriter`]                        |
//! | **Configuration** | Defaults for every start.                                    | [`ContainerConfig`], [`parse_duration`]             |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::time::Duration;
//!
//! use async_trait::async_trait;
//! use bytes::Bytes;
//! use futures::FutureExt;
//! use http::{Request, Response};
//! use tokio_util::sync::CancellationToken;
//! use containervisor::{
//!     Container, ContainerConfig, ContainerError, ContainerHandle, LaunchSpec, LocalContext,
//!     LogWriter, MonitorFuture, StartOptions, Subscribe,
//! };
//!
//! #[derive(Default)]
//! struct AlwaysUp(AtomicBool);
//!
//! #[async_trait]
//! impl ContainerHandle for AlwaysUp {
//!     fn running(&self) -> bool { self.0.load(Ordering::SeqCst) }
//!     async fn start(&self, _: LaunchSpec) -> Result<(), ContainerError> {
//!         self.0.store(true, Ordering::SeqCst);
//!         Ok(())
//!     }
//!     fn monitor(&self) -> MonitorFuture { futures::future::pending().boxed() }
//!     async fn destroy(&self, _: Option<String>) -> Result<(), ContainerError> { Ok(()) }
//!     async fn signal(&self, _: i32) -> Result<(), ContainerError> { Ok(()) }
//!     async fn fetch(&self, _: u16, _: Request<Bytes>, _: CancellationToken)
//!         -> Result<Response<Bytes>, ContainerError> {
//!         Ok(Response::new(Bytes::from_static(b"ok")))
//!     }
//!     async fn set_inactivity_timeout(&self, _: Duration) -> Result<(), ContainerError> { Ok(()) }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), ContainerError> {
//!     let mut cfg = ContainerConfig::default();
//!     cfg.default_port = Some(8080);
//!
//!     let ctx = Arc::new(LocalContext::new(Arc::new(AlwaysUp::default())));
//!     let container = Container::builder(cfg, ctx)
//!         .with_subscribers(vec![Arc::new(LogWriter) as Arc<dyn Subscribe>])
//!         .build()?;
//!
//!     container.start(StartOptions::default()).await?;
//!     assert_eq!(container.state().status.to_string(), "running");
//!     Ok(())
//! }
//! ```
mod cancel;
mod classify;
mod config;
mod core;
mod duration;
mod error;
mod events;
mod hooks;
mod host;
mod policies;
mod signal;
mod subscribers;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use cancel::{CancelReason, ProbeToken};
pub use classify::{Classification, classify, is_connection_lost, is_not_listening};
pub use config::{ContainerConfig, FALLBACK_PORT};
pub use core::{Container, ContainerBuilder, ContainerState, ContainerStatus, StartOptions};
pub use duration::{SleepAfter, parse_duration};
pub use error::{ContainerError, HostError, HostErrorKind};
pub use events::{Bus, Event, EventKind};
pub use hooks::{Lifecycle, NoopLifecycle};
pub use host::{ContainerHandle, ExecutionContext, LaunchSpec, LocalContext, MonitorFuture};
pub use policies::{PollPolicy, RetryPolicy};
pub use signal::Signal;
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
