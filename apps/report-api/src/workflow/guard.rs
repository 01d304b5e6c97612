//! Workflow Guard — single-flight admission per interview.
//!
//! `admit` hands out a `WorkflowLease`; the slot is freed when the lease is
//! dropped, so every exit path (success, failure, panic, task abort) releases
//! it. `cancel` is the explicit release used when the view goes away.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::AbortHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::interview::InterviewId;

struct Slot {
    token: Uuid,
    abort: Option<AbortHandle>,
}

#[derive(Clone, Default)]
pub struct WorkflowGuard {
    slots: Arc<Mutex<HashMap<InterviewId, Slot>>>,
}

impl WorkflowGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the interview busy and returns its lease, or `None` when a run
    /// already holds it.
    pub fn admit(&self, interview_id: InterviewId) -> Option<WorkflowLease> {
        let mut slots = self.lock();
        if slots.contains_key(&interview_id) {
            debug!("Workflow for interview {interview_id} already in progress; not admitted");
            return None;
        }

        let token = Uuid::new_v4();
        slots.insert(
            interview_id,
            Slot {
                token,
                abort: None,
            },
        );

        Some(WorkflowLease {
            guard: self.clone(),
            interview_id,
            token,
        })
    }

    pub fn is_busy(&self, interview_id: InterviewId) -> bool {
        self.lock().contains_key(&interview_id)
    }

    /// Associates the task running under the lease identified by `ticket` so
    /// `cancel` can abort it. Ignored when that lease has already been released.
    pub fn attach(&self, ticket: LeaseTicket, abort: AbortHandle) {
        if let Some(slot) = self.lock().get_mut(&ticket.interview_id) {
            if slot.token == ticket.token {
                slot.abort = Some(abort);
            }
        }
    }

    /// Aborts the interview's in-flight run, if any, and frees the slot
    /// immediately. Returns the cancelled run's id.
    pub fn cancel(&self, interview_id: InterviewId) -> Option<Uuid> {
        let slot = self.lock().remove(&interview_id)?;
        if let Some(abort) = slot.abort {
            abort.abort();
        }
        info!("Cancelled report workflow {} for interview {interview_id}", slot.token);
        Some(slot.token)
    }

    fn release(&self, interview_id: InterviewId, token: Uuid) {
        let mut slots = self.lock();
        if slots.get(&interview_id).is_some_and(|slot| slot.token == token) {
            slots.remove(&interview_id);
            debug!("Released workflow guard for interview {interview_id}");
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<InterviewId, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Proof of admission. Dropping it releases the interview's slot, unless the
/// slot was already cancelled and re-admitted by a newer run.
pub struct WorkflowLease {
    guard: WorkflowGuard,
    interview_id: InterviewId,
    token: Uuid,
}

impl WorkflowLease {
    /// The run this lease admitted.
    pub fn run_id(&self) -> Uuid {
        self.token
    }

    pub fn ticket(&self) -> LeaseTicket {
        LeaseTicket {
            interview_id: self.interview_id,
            token: self.token,
        }
    }
}

/// Identifies a lease without owning it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaseTicket {
    interview_id: InterviewId,
    token: Uuid,
}

impl Drop for WorkflowLease {
    fn drop(&mut self) {
        self.guard.release(self.interview_id, self.token);
    }
}
