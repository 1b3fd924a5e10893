//! Supervisor core: startup state machine, container facade, routing.
//!
//! Internal modules:
//! - [`options`]: per-call [`StartOptions`] and their resolution against config;
//! - [`startup`]: the start/probe/retry/escalate loop;
//! - [`container`]: [`Container`], start/stop/destroy;
//! - [`inflight`]: the shared start loop and its waiters;
//! - [`builder`]: [`ContainerBuilder`], wiring of bus and subscribers;
//! - [`router`]: inbound request handling.

mod builder;
mod container;
mod inflight;
mod options;
mod router;
mod startup;


pub use builder::ContainerBuilder;
pub use container::{Container, ContainerState, ContainerStatus};
pub use options::StartOptions;
