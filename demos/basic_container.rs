//! # Example: basic_container
//!
//! Starts a simulated container whose application needs a moment to bind
//! its port, then stops it with a signal.
//!
//! ## Flow
//! ```text
//! start()
//!   ├─► handle.start()                      publish(StartIssued)
//!   ├─► probe :8080 → "not listening"      publish(ProbeFailed, RetryScheduled)
//!   ├─► sleep(300ms)
//!   ├─► probe :8080 → "not listening"      ...
//!   ├─► probe :8080 → 200                  publish(Ready)
//!   └─► on_start()                          (seeds the app)
//! stop(SIGTERM)                             publish(SignalSent)
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=containervisor=debug cargo run --example basic_container
//! ```

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::FutureExt;
use http::{Request, Response};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use containervisor::{
    Container, ContainerConfig, ContainerError, ContainerHandle, LaunchSpec, Lifecycle,
    LocalContext, LogWriter, MonitorFuture, Signal, StartOptions, Subscribe,
};

/// Accepts connections `warmup` after being started.
struct SlowBoot {
    warmup: Duration,
    started_at: Mutex<Option<Instant>>,
}

impl SlowBoot {
    fn new(warmup: Duration) -> Self {
        Self {
            warmup,
            started_at: Mutex::new(None),
        }
    }

    fn listening(&self) -> bool {
        let started_at = self.started_at.lock().unwrap_or_else(|e| e.into_inner());
        (*started_at).is_some_and(|at| at.elapsed() >= self.warmup)
    }
}

#[async_trait]
impl ContainerHandle for SlowBoot {
    fn running(&self) -> bool {
        self.started_at
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    async fn start(&self, spec: LaunchSpec) -> Result<(), ContainerError> {
        println!("[host] start entrypoint={:?} env={:?}", spec.entrypoint, spec.env);
        *self.started_at.lock().unwrap_or_else(|e| e.into_inner()) = Some(Instant::now());
        Ok(())
    }

    fn monitor(&self) -> MonitorFuture {
        futures::future::pending().boxed()
    }

    async fn destroy(&self, _reason: Option<String>) -> Result<(), ContainerError> {
        *self.started_at.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }

    async fn signal(&self, signo: i32) -> Result<(), ContainerError> {
        println!("[host] signal {signo}");
        *self.started_at.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }

    async fn fetch(
        &self,
        port: u16,
        _request: Request<Bytes>,
        _cancel: CancellationToken,
    ) -> Result<Response<Bytes>, ContainerError> {
        if !self.listening() {
            return Err(ContainerError::host_message(format!(
                "connect(): The container is not listening in the TCP address 10.0.0.1:{port}"
            )));
        }
        Ok(Response::new(Bytes::from_static(b"pong")))
    }

    async fn set_inactivity_timeout(&self, duration: Duration) -> Result<(), ContainerError> {
        println!("[host] inactivity timeout {duration:?}");
        Ok(())
    }
}

struct Seed;

#[async_trait]
impl Lifecycle for Seed {
    async fn on_start(&self) -> Result<(), ContainerError> {
        println!("[hooks] container started, seeding");
        Ok(())
    }

    async fn on_error(&self, error: &ContainerError) {
        println!("[hooks] startup failed: {error}");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 1. Defaults for every start
    let mut cfg = ContainerConfig::default();
    cfg.default_port = Some(8080);
    cfg.sleep_after = "2m".into();
    cfg.entrypoint = vec!["/bin/server".into(), "--listen".into(), ":8080".into()];

    // 2. Host side: a container that needs ~700ms to bind
    let handle = Arc::new(SlowBoot::new(Duration::from_millis(700)));
    let ctx = Arc::new(LocalContext::new(handle));

    // 3. Supervisor with hooks and a logging subscriber
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter)];
    let container = Container::builder(cfg, ctx)
        .with_hooks(Arc::new(Seed))
        .with_subscribers(subs)
        .build()?;

    // 4. Start and wait for readiness
    container.start(StartOptions::default()).await?;
    println!("state: {}", container.state().status);

    // 5. Graceful stop
    container.stop(Signal::Term).await?;
    println!("state: {}", container.state().status);

    // Let the log subscriber drain.
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
