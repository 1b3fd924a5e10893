//! Scripted host doubles for unit tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::FutureExt;
use http::{Request, Response, Uri};
use tokio_util::sync::CancellationToken;

use crate::error::{ContainerError, HostErrorKind};
use crate::hooks::Lifecycle;
use crate::host::{ContainerHandle, LaunchSpec, MonitorFuture};

/// Outcome of one readiness probe.
#[derive(Clone, Debug)]
pub(crate) enum Probe {
    Ok,
    /// Fails; the process keeps running.
    Fail(ContainerError),
    /// Fails and the process is gone.
    Crash(ContainerError),
    /// Never answers; only the probe token ends it.
    Hang,
}

pub(crate) fn not_listening() -> ContainerError {
    ContainerError::host_message(
        "connect(): The container is not listening in the TCP address 10.0.0.1:8080",
    )
}

pub(crate) fn connection_lost() -> ContainerError {
    ContainerError::host_message("Network connection lost.")
}

pub(crate) fn no_instance() -> ContainerError {
    ContainerError::host(
        HostErrorKind::NoInstance,
        "there is no container instance that can be provided to this durable object",
    )
}

pub(crate) struct MockHandle {
    running: AtomicBool,
    probes: Mutex<VecDeque<Probe>>,
    fallback: Probe,
    monitor_results: Mutex<VecDeque<Result<(), ContainerError>>>,
    monitor_pending: bool,
    start_results: Mutex<VecDeque<Result<(), ContainerError>>>,

    pub starts: AtomicUsize,
    pub probe_count: AtomicUsize,
    pub monitors: AtomicUsize,
    pub destroys: AtomicUsize,
    pub launches: Mutex<Vec<LaunchSpec>>,
    pub probe_ports: Mutex<Vec<u16>>,
    pub signals: Mutex<Vec<i32>>,
    pub inactivity: Mutex<Vec<Duration>>,
    pub forwarded: Mutex<Vec<(u16, Uri)>>,
}

impl MockHandle {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            probes: Mutex::new(VecDeque::new()),
            fallback: Probe::Ok,
            monitor_results: Mutex::new(VecDeque::new()),
            monitor_pending: false,
            start_results: Mutex::new(VecDeque::new()),
            starts: AtomicUsize::new(0),
            probe_count: AtomicUsize::new(0),
            monitors: AtomicUsize::new(0),
            destroys: AtomicUsize::new(0),
            launches: Mutex::new(Vec::new()),
            probe_ports: Mutex::new(Vec::new()),
            signals: Mutex::new(Vec::new()),
            inactivity: Mutex::new(Vec::new()),
            forwarded: Mutex::new(Vec::new()),
        }
    }

    pub fn already_running(self) -> Self {
        self.running.store(true, Ordering::SeqCst);
        self
    }

    /// Probe outcomes in order; `fallback` once exhausted.
    pub fn with_probes(self, probes: Vec<Probe>) -> Self {
        *self.probes.lock().unwrap() = probes.into();
        self
    }

    pub fn with_fallback(mut self, probe: Probe) -> Self {
        self.fallback = probe;
        self
    }

    /// Results of successive monitor futures; `Ok(())` once exhausted.
    pub fn with_monitor(self, results: Vec<Result<(), ContainerError>>) -> Self {
        *self.monitor_results.lock().unwrap() = results.into();
        self
    }

    /// Monitor futures never resolve.
    pub fn with_pending_monitor(mut self) -> Self {
        self.monitor_pending = true;
        self
    }

    /// Results of successive start commands; `Ok(())` once exhausted.
    pub fn with_start_results(self, results: Vec<Result<(), ContainerError>>) -> Self {
        *self.start_results.lock().unwrap() = results.into();
        self
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.probe_count.load(Ordering::SeqCst)
    }

    async fn probe(&self, port: u16, cancel: CancellationToken) -> Result<Response<Bytes>, ContainerError> {
        self.probe_count.fetch_add(1, Ordering::SeqCst);
        self.probe_ports.lock().unwrap().push(port);
        let next = self
            .probes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match next {
            Probe::Ok => Ok(Response::new(Bytes::from_static(b"pong"))),
            Probe::Fail(err) => Err(err),
            Probe::Crash(err) => {
                self.running.store(false, Ordering::SeqCst);
                Err(err)
            }
            Probe::Hang => {
                cancel.cancelled().await;
                Err(ContainerError::host_message("request aborted"))
            }
        }
    }
}

#[async_trait]
impl ContainerHandle for MockHandle {
    fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn start(&self, spec: LaunchSpec) -> Result<(), ContainerError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        let res = self
            .start_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()));
        if res.is_ok() {
            self.launches.lock().unwrap().push(spec);
            self.running.store(true, Ordering::SeqCst);
        }
        res
    }

    fn monitor(&self) -> MonitorFuture {
        self.monitors.fetch_add(1, Ordering::SeqCst);
        if self.monitor_pending {
            return futures::future::pending().boxed();
        }
        let res = self
            .monitor_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()));
        async move { res }.boxed()
    }

    async fn destroy(&self, _reason: Option<String>) -> Result<(), ContainerError> {
        self.destroys.fetch_add(1, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn signal(&self, signo: i32) -> Result<(), ContainerError> {
        self.signals.lock().unwrap().push(signo);
        Ok(())
    }

    async fn fetch(
        &self,
        port: u16,
        request: Request<Bytes>,
        cancel: CancellationToken,
    ) -> Result<Response<Bytes>, ContainerError> {
        if request.uri() == "http://ping/" {
            return self.probe(port, cancel).await;
        }
        self.forwarded
            .lock()
            .unwrap()
            .push((port, request.uri().clone()));
        Ok(Response::new(Bytes::from_static(b"proxied")))
    }

    async fn set_inactivity_timeout(&self, duration: Duration) -> Result<(), ContainerError> {
        self.inactivity.lock().unwrap().push(duration);
        Ok(())
    }
}

/// Counts hook invocations; `on_start` returns `start_error` when set.
#[derive(Default)]
pub(crate) struct CountingHooks {
    pub start_error: Option<ContainerError>,
    pub starts: AtomicUsize,
    pub errors: Mutex<Vec<String>>,
}

impl CountingHooks {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Lifecycle for CountingHooks {
    async fn on_start(&self) -> Result<(), ContainerError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        match &self.start_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn on_error(&self, error: &ContainerError) {
        self.errors.lock().unwrap().push(error.to_string());
    }
}

pub(crate) fn shared(handle: MockHandle) -> Arc<MockHandle> {
    Arc::new(handle)
}
