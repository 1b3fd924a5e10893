//! Supervisor events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: the startup loop, `stop()`/`destroy()`, `SubscriberSet`
//!   workers (overflow/panic).
//! - **Consumers**: the container's subscriber listener (fans out to
//!   `SubscriberSet`) and anything holding [`Container::bus`](crate::Container::bus).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
