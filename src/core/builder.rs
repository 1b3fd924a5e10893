use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::container::{Container, Inner};
use super::inflight::InFlight;
use super::startup::Startup;
use crate::{
    config::ContainerConfig,
    error::ContainerError,
    events::Bus,
    hooks::{Lifecycle, NoopLifecycle},
    host::ExecutionContext,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for a supervised [`Container`].
pub struct ContainerBuilder {
    cfg: ContainerConfig,
    ctx: Arc<dyn ExecutionContext>,
    hooks: Arc<dyn Lifecycle>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl ContainerBuilder {
    /// Creates a builder for a container living in `ctx`.
    pub fn new(cfg: ContainerConfig, ctx: Arc<dyn ExecutionContext>) -> Self {
        Self {
            cfg,
            ctx,
            hooks: Arc::new(NoopLifecycle),
            subscribers: Vec::new(),
        }
    }

    /// Sets lifecycle hooks.
    pub fn with_hooks(mut self, hooks: Arc<dyn Lifecycle>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Sets event subscribers.
    ///
    /// Subscribers receive events through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Validates configuration and builds the container.
    ///
    /// Fails with [`ContainerError::MissingContainer`] when the context has no
    /// container capability, or with a duration error for a bad `sleep_after`.
    /// Must be called from within a Tokio runtime when subscribers are set.
    pub fn build(self) -> Result<Container, ContainerError> {
        let handle = self
            .ctx
            .container()
            .ok_or(ContainerError::MissingContainer)?;
        let inactivity = self.cfg.inactivity_timeout()?;
        let bus = Bus::new(self.cfg.bus_capacity_clamped());

        let listener = CancellationToken::new();
        if !self.subscribers.is_empty() {
            spawn_listener(self.subscribers, bus.clone(), listener.clone());
        }

        Ok(Container::from_inner(Inner {
            startup: Startup {
                handle: Arc::clone(&handle),
                ctx: self.ctx,
                hooks: self.hooks,
                bus: bus.clone(),
            },
            handle,
            cfg: self.cfg,
            bus,
            inactivity,
            inflight: InFlight::default(),
            _listener: listener.drop_guard(),
        }))
    }
}

/// Forwards bus events to the subscriber set until `stop` fires.
fn spawn_listener(subscribers: Vec<Arc<dyn Subscribe>>, bus: Bus, stop: CancellationToken) {
    let mut rx = bus.subscribe();
    let set = SubscriberSet::new(subscribers, bus);
    tokio::spawn(async move {
        loop {
            tokio::select! {
                res = rx.recv() => match res {
                    Ok(ev) => set.emit(ev),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(target: "containervisor", skipped, "event listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = stop.cancelled() => break,
            }
        }
        set.shutdown().await;
    });
}
