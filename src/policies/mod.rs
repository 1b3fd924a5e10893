//! Startup policies.
//!
//! ## Contents
//! - [`RetryPolicy`] how many attempts `start()` makes and the timeout of each probe
//! - [`PollPolicy`]  how long to pause between attempts
//!
//! ## Defaults
//! - `RetryPolicy::default()` → limit=10, delay=5000ms.
//! - `PollPolicy::default()` → constant 300ms.

mod poll;
mod retry;

pub use poll::PollPolicy;
pub use retry::RetryPolicy;
