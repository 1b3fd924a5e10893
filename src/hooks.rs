//! # Lifecycle hooks.
//!
//! [`Lifecycle`] lets the owner of a container react to supervisor transitions.
//! Both hooks default to no-ops.
//!
//! ## Rules
//! - `on_start` runs inside the execution context's critical section, after
//!   readiness is established and before any `start()` caller returns.
//! - `on_start` only runs when the container was not already running when
//!   `start()` began.
//! - `on_error` observes escalated startup failures; it cannot swallow them.

use async_trait::async_trait;

use crate::error::ContainerError;

/// Hooks invoked by the supervisor.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use containervisor::{ContainerError, Lifecycle};
///
/// struct Migrations;
///
/// #[async_trait]
/// impl Lifecycle for Migrations {
///     async fn on_start(&self) -> Result<(), ContainerError> {
///         // seed the freshly started container...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Lifecycle: Send + Sync + 'static {
    /// Called once a freshly started container is ready.
    async fn on_start(&self) -> Result<(), ContainerError> {
        Ok(())
    }

    /// Called with the error a startup escalates with.
    async fn on_error(&self, _error: &ContainerError) {}
}

/// Hooks that do nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLifecycle;

impl Lifecycle for NoopLifecycle {}
