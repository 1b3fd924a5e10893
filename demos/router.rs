//! # Example: router
//!
//! Routes concurrent requests into a cold container. All requests share one
//! start loop; each is forwarded over plain HTTP once the container is ready.
//!
//! ## Flow
//! ```text
//! handle(GET https://app:8080/a) ─┐
//! handle(GET https://app:8080/b) ─┼─► one start loop ─► ready ─► fetch(8080, http://app:8080/..)
//! handle(GET https://app:8080/c) ─┘
//! handle(GET https://app/)        ─► MissingPort (no default, no port in URL)
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=containervisor=info cargo run --example router
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::FutureExt;
use http::{Request, Response};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use containervisor::{
    Container, ContainerConfig, ContainerError, ContainerHandle, LaunchSpec, LocalContext,
    LogWriter, MonitorFuture, Subscribe,
};

/// Echoes the forwarded URI; takes 200ms to start.
#[derive(Default)]
struct Echo {
    running: AtomicBool,
    starts: AtomicUsize,
}

#[async_trait]
impl ContainerHandle for Echo {
    fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn start(&self, _spec: LaunchSpec) -> Result<(), ContainerError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(200)).await;
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn monitor(&self) -> MonitorFuture {
        futures::future::pending().boxed()
    }

    async fn destroy(&self, _reason: Option<String>) -> Result<(), ContainerError> {
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn signal(&self, _signo: i32) -> Result<(), ContainerError> {
        Ok(())
    }

    async fn fetch(
        &self,
        port: u16,
        request: Request<Bytes>,
        _cancel: CancellationToken,
    ) -> Result<Response<Bytes>, ContainerError> {
        let body = format!("port={port} uri={}", request.uri());
        Ok(Response::new(Bytes::from(body)))
    }

    async fn set_inactivity_timeout(&self, _duration: Duration) -> Result<(), ContainerError> {
        Ok(())
    }
}

fn request(uri: &str) -> Result<Request<Bytes>, http::Error> {
    Request::get(uri).body(Bytes::new())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let echo = Arc::new(Echo::default());
    let ctx = Arc::new(LocalContext::new(echo.clone()));
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter)];
    let container = Container::builder(ContainerConfig::default(), ctx)
        .with_subscribers(subs)
        .build()?;

    let (a, b, c) = tokio::join!(
        container.handle(request("https://app.internal:8080/a")?),
        container.handle(request("https://app.internal:8080/b")?),
        container.handle(request("https://app.internal:8080/c?x=1")?),
    );
    for res in [a, b, c] {
        let res = res?;
        println!("{}", String::from_utf8_lossy(res.body()));
    }
    println!("start commands issued: {}", echo.starts.load(Ordering::SeqCst));

    // A request that cancels itself before the container answers.
    let mut cancelled = request("https://app.internal:8080/slow")?;
    let token = CancellationToken::new();
    token.cancel();
    cancelled.extensions_mut().insert(token);
    if let Err(err) = container.handle(cancelled).await {
        println!("cancelled request: {err}");
    }

    match container.handle(request("https://app.internal/")?).await {
        Err(err) => println!("no port: {err}"),
        Ok(_) => println!("unexpected success"),
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
