//! # In-flight start loop.
//!
//! At most one start loop runs per container. It runs in its own task, so a
//! caller that goes away never leaves it half-polled.
//!
//! ```text
//! join(plan) ── live loop? ── yes ──► waiters += 1 ──► (Ticket, Waiter)
//!                   │
//!                   └── no ──► spawn Startup::run(plan with loop token)
//!                                  └─ on completion: clear the slot
//!
//! Waiter dropped ──► waiters -= 1 ──► 0? ──► cancel the loop token
//! ```
//!
//! The loop token is owned by the slot, never by a caller: one caller's
//! cancellation only ends that caller's wait.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio_util::sync::CancellationToken;

use super::options::StartPlan;
use super::startup::Startup;
use crate::error::ContainerError;

type StartFuture = Shared<BoxFuture<'static, Result<(), ContainerError>>>;

/// What a caller awaits: the loop's result and the plan it runs.
pub(crate) struct Ticket {
    pub fut: StartFuture,
    port: u16,
    wait_for_ready: bool,
}

impl Ticket {
    /// Whether a successful loop also satisfies `plan`.
    ///
    /// A loop that checked another port, or did not wait for readiness while
    /// `plan` does, proves nothing about `plan`.
    pub fn covers(&self, plan: &StartPlan) -> bool {
        self.port == plan.port && (self.wait_for_ready || !plan.wait_for_ready)
    }
}

struct Running {
    id: u64,
    fut: StartFuture,
    port: u16,
    wait_for_ready: bool,
    cancel: CancellationToken,
    waiters: usize,
}

#[derive(Default)]
struct Slot {
    next_id: u64,
    current: Option<Running>,
}

/// Shared slot holding the live start loop, if any.
#[derive(Clone, Default)]
pub(crate) struct InFlight {
    slot: Arc<Mutex<Slot>>,
}

/// Registration of one caller on a running loop.
///
/// Dropping the last waiter cancels the loop.
pub(crate) struct Waiter {
    slot: Arc<Mutex<Slot>>,
    id: u64,
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

fn finish(slot: &Mutex<Slot>, id: u64) {
    let mut slot = lock(slot);
    if slot.current.as_ref().is_some_and(|run| run.id == id) {
        slot.current = None;
    }
}

impl InFlight {
    /// Joins the live loop, or spawns a new one running `plan`.
    ///
    /// A loop whose token already fired is winding down and is never joined.
    pub fn join(&self, startup: &Startup, plan: &StartPlan) -> (Ticket, Waiter) {
        let mut slot = lock(&self.slot);
        if let Some(run) = slot
            .current
            .as_mut()
            .filter(|run| !run.cancel.is_cancelled())
        {
            run.waiters += 1;
            return (self.ticket(run), self.waiter(run.id));
        }

        let id = slot.next_id;
        slot.next_id += 1;

        let cancel = CancellationToken::new();
        let mut own = plan.clone();
        own.cancel = cancel.clone();

        let startup = startup.clone();
        let done = Arc::clone(&self.slot);
        let task = tokio::spawn(async move {
            let res = startup.run(own).await;
            finish(&done, id);
            res
        });

        let aborted = Arc::clone(&self.slot);
        let fut = async move {
            task.await.unwrap_or_else(|err| {
                finish(&aborted, id);
                Err(ContainerError::hook(format!("start loop panicked: {err}")))
            })
        }
        .boxed()
        .shared();

        let run = slot.current.insert(Running {
            id,
            fut,
            port: plan.port,
            wait_for_ready: plan.wait_for_ready,
            cancel,
            waiters: 1,
        });
        (self.ticket(run), self.waiter(id))
    }

    fn ticket(&self, run: &Running) -> Ticket {
        Ticket {
            fut: run.fut.clone(),
            port: run.port,
            wait_for_ready: run.wait_for_ready,
        }
    }

    fn waiter(&self, id: u64) -> Waiter {
        Waiter {
            slot: Arc::clone(&self.slot),
            id,
        }
    }
}

impl Drop for Waiter {
    fn drop(&mut self) {
        let mut slot = lock(&self.slot);
        if let Some(run) = slot.current.as_mut().filter(|run| run.id == self.id) {
            run.waiters = run.waiters.saturating_sub(1);
            if run.waiters == 0 {
                run.cancel.cancel();
            }
        }
    }
}
