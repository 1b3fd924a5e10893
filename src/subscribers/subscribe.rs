//! # Subscriber trait
//!
//! [`Subscribe`] plugs custom handlers into the supervisor's event stream.
//! Each subscriber is driven by its own worker fed by a bounded queue owned by
//! the [`SubscriberSet`](crate::SubscriberSet); a slow subscriber never blocks
//! the start loop.

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
///
/// # Example
/// ```rust
/// use async_trait::async_trait;
/// use containervisor::{Event, EventKind, Subscribe};
///
/// struct CountEscalations;
///
/// #[async_trait]
/// impl Subscribe for CountEscalations {
///     async fn on_event(&self, ev: &Event) {
///         if ev.kind == EventKind::Escalated {
///             // bump a counter...
///         }
///     }
///     fn name(&self) -> &'static str { "escalations" }
/// }
/// ```
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles a single event.
    async fn on_event(&self, event: &Event);

    /// Name used in overflow/panic reports.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred queue capacity; on overflow events for this subscriber are dropped.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
