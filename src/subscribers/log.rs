//! # Tracing subscriber.
//!
//! [`LogWriter`] turns supervisor events into structured `tracing` records
//! under the `containervisor` target:
//!
//! ```text
//! DEBUG start issued attempt=0
//!  WARN probe failed attempt=1 port=8080 reason="ping timed out"
//! DEBUG retry scheduled attempt=1 delay_ms=300
//!  INFO container ready attempt=2 port=8080
//! ERROR startup escalated attempt=9 reason="Network connection lost."
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Logs every event through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let reason = e.reason.as_deref().unwrap_or_default();
        match e.kind {
            EventKind::StartIssued => {
                debug!(target: "containervisor", seq = e.seq, attempt = ?e.attempt, "start issued");
            }
            EventKind::ProbeFailed => {
                warn!(target: "containervisor", seq = e.seq, attempt = ?e.attempt, port = ?e.port, reason, "probe failed");
            }
            EventKind::RetryScheduled => {
                debug!(target: "containervisor", seq = e.seq, attempt = ?e.attempt, delay_ms = ?e.delay_ms, "retry scheduled");
            }
            EventKind::Ready => {
                info!(target: "containervisor", seq = e.seq, attempt = ?e.attempt, port = ?e.port, "container ready");
            }
            EventKind::Escalated => {
                error!(target: "containervisor", seq = e.seq, attempt = ?e.attempt, reason, "startup escalated");
            }
            EventKind::Aborted => {
                error!(target: "containervisor", seq = e.seq, reason, "execution context aborted");
            }
            EventKind::Cancelled => {
                info!(target: "containervisor", seq = e.seq, attempt = ?e.attempt, reason, "startup cancelled");
            }
            EventKind::SignalSent => {
                info!(target: "containervisor", seq = e.seq, signal = ?e.signal, "signal sent");
            }
            EventKind::DestroyRequested => {
                info!(target: "containervisor", seq = e.seq, "destroy requested");
            }
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked => {
                warn!(target: "containervisor", seq = e.seq, kind = ?e.kind, reason, "subscriber problem");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
