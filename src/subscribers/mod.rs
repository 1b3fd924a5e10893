//! # Event subscribers.
//!
//! ```text
//! start loop / stop / destroy ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                                   ┌────────┼────────┐
//!                                                                   ▼        ▼        ▼
//!                                                               LogWriter  Metrics  Custom
//! ```
//!
//! - [`Subscribe`] the extension point
//! - [`SubscriberSet`] bounded, panic-isolated fan-out
//! - [`LogWriter`] structured logging via `tracing`

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
