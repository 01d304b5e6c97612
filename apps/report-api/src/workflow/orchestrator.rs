//! Report Orchestrator — ties the guard, the coordinator and the progress
//! board together and runs each admitted workflow as its own task.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::info;

use super::coordinator::RetryCoordinator;
use super::guard::WorkflowGuard;
use super::progress::{ProgressBoard, WorkflowSnapshot};
use super::WorkflowPolicy;
use crate::backend::InterviewBackend;
use crate::models::interview::InterviewId;

#[derive(Clone)]
pub struct ReportOrchestrator {
    coordinator: Arc<RetryCoordinator>,
    guard: WorkflowGuard,
    board: ProgressBoard,
    /// Serializes `start` and `cancel`, so admission, snapshot creation and
    /// abort-handle attachment are never observed half done.
    lifecycle: Arc<Mutex<()>>,
}

impl ReportOrchestrator {
    pub fn new(backend: Arc<dyn InterviewBackend>, policy: WorkflowPolicy) -> Self {
        Self {
            coordinator: Arc::new(RetryCoordinator::new(backend, policy)),
            guard: WorkflowGuard::new(),
            board: ProgressBoard::with_retention(policy.snapshot_retention),
            lifecycle: Arc::default(),
        }
    }

    /// Starts a run from `Init` unless one is already in flight for this
    /// interview. Returns the fresh snapshot, or `None` when not admitted.
    pub fn start(&self, interview_id: InterviewId) -> Option<WorkflowSnapshot> {
        let _lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        let lease = self.guard.admit(interview_id)?;
        let ticket = lease.ticket();

        let reporter = self.board.begin(
            interview_id,
            lease.run_id(),
            self.coordinator.policy().max_timeout_retries,
        );
        let snapshot = reporter.current();
        info!(
            "Admitted report workflow {} for interview {interview_id}",
            reporter.run_id()
        );

        let coordinator = self.coordinator.clone();
        let handle = tokio::spawn(async move {
            // Held for the task's whole life; dropped on completion, panic or abort.
            let _lease = lease;
            let _panic_guard = reporter.fail_on_panic();
            let _ = coordinator.run(interview_id, &reporter).await;
        });
        self.guard.attach(ticket, handle.abort_handle());

        snapshot
    }

    pub fn snapshot(&self, interview_id: InterviewId) -> Option<WorkflowSnapshot> {
        self.board.snapshot(interview_id)
    }

    pub fn is_running(&self, interview_id: InterviewId) -> bool {
        self.guard.is_busy(interview_id)
    }

    /// Abandons the interview's run: in-flight timers and requests are dropped,
    /// the guard is released and the snapshot discarded.
    ///
    /// Only the cancelled run's snapshot, or an already finished one, is
    /// removed; a newer run's snapshot is never touched.
    pub fn cancel(&self, interview_id: InterviewId) -> bool {
        let _lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        match self.guard.cancel(interview_id) {
            Some(run_id) => {
                self.board.remove_run(interview_id, run_id);
                true
            }
            None => self.board.remove_finished(interview_id),
        }
    }
}
