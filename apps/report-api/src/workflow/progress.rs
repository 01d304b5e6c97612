//! Progress Board — the notification channel between running workflows and
//! the rendering layer. Nothing in the workflow reads it back.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use super::WorkflowError;
use crate::models::interview::InterviewId;
use crate::models::report::Report;

pub const STARTING: &str = "Starting report generation...";
pub const WAITING_FOR_DATA: &str = "Waiting for interview data to be saved...";
pub const DATA_READY: &str = "Interview data ready! Generating report...";
pub const ANALYZING: &str = "Analyzing interview responses with AI...";
pub const REPORT_READY: &str = "Report ready!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Init,
    WaitingForData,
    Generating,
    RetryWait,
    Ready,
    Failed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Ready | Phase::Failed)
    }
}

/// What the view shows for one interview's run.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSnapshot {
    pub interview_id: InterviewId,
    pub run_id: Uuid,
    pub phase: Phase,
    pub progress: String,
    pub retry_count: u32,
    pub max_retries: u32,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<Report>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// How long a finished snapshot stays readable when no client discards it.
pub const DEFAULT_SNAPSHOT_RETENTION: Duration = Duration::from_secs(600);

struct Entry {
    snapshot: WorkflowSnapshot,
    /// Set when the run reaches `Ready` or `Failed`.
    finished_at: Option<Instant>,
}

/// Latest snapshot per interview. Finished snapshots are evicted once they
/// are older than the retention period; in-flight ones never are.
#[derive(Clone)]
pub struct ProgressBoard {
    runs: Arc<Mutex<HashMap<InterviewId, Entry>>>,
    retention: Duration,
}

impl Default for ProgressBoard {
    fn default() -> Self {
        Self::with_retention(DEFAULT_SNAPSHOT_RETENTION)
    }
}

impl ProgressBoard {
    pub fn with_retention(retention: Duration) -> Self {
        Self {
            runs: Arc::default(),
            retention,
        }
    }

    /// Starts a fresh snapshot for run `run_id`, replacing any previous one.
    pub fn begin(
        &self,
        interview_id: InterviewId,
        run_id: Uuid,
        max_retries: u32,
    ) -> ProgressReporter {
        let now = Utc::now();
        let mut runs = self.lock();
        self.evict_expired(&mut runs);
        runs.insert(
            interview_id,
            Entry {
                snapshot: WorkflowSnapshot {
                    interview_id,
                    run_id,
                    phase: Phase::Init,
                    progress: STARTING.to_string(),
                    retry_count: 0,
                    max_retries,
                    started_at: now,
                    updated_at: now,
                    report: None,
                    error: None,
                },
                finished_at: None,
            },
        );

        ProgressReporter {
            board: self.clone(),
            interview_id,
            run_id,
        }
    }

    pub fn snapshot(&self, interview_id: InterviewId) -> Option<WorkflowSnapshot> {
        let mut runs = self.lock();
        self.evict_expired(&mut runs);
        runs.get(&interview_id).map(|entry| entry.snapshot.clone())
    }

    /// Removes the snapshot only while it still belongs to `run_id`.
    pub fn remove_run(&self, interview_id: InterviewId, run_id: Uuid) -> bool {
        let mut runs = self.lock();
        if runs
            .get(&interview_id)
            .is_some_and(|entry| entry.snapshot.run_id == run_id)
        {
            runs.remove(&interview_id);
            return true;
        }
        false
    }

    /// Removes the snapshot only if its run has already finished.
    pub fn remove_finished(&self, interview_id: InterviewId) -> bool {
        let mut runs = self.lock();
        if runs
            .get(&interview_id)
            .is_some_and(|entry| entry.snapshot.phase.is_terminal())
        {
            runs.remove(&interview_id);
            return true;
        }
        false
    }

    /// Applies `update` only while `run_id` is still the interview's current run.
    fn update(
        &self,
        interview_id: InterviewId,
        run_id: Uuid,
        update: impl FnOnce(&mut WorkflowSnapshot),
    ) {
        let mut runs = self.lock();
        if let Some(entry) = runs.get_mut(&interview_id) {
            if entry.snapshot.run_id == run_id {
                update(&mut entry.snapshot);
                entry.snapshot.updated_at = Utc::now();
                if entry.snapshot.phase.is_terminal() && entry.finished_at.is_none() {
                    entry.finished_at = Some(Instant::now());
                }
            }
        }
    }

    fn evict_expired(&self, runs: &mut HashMap<InterviewId, Entry>) {
        let retention = self.retention;
        runs.retain(|interview_id, entry| {
            let expired = entry
                .finished_at
                .is_some_and(|finished| finished.elapsed() >= retention);
            if expired {
                debug!("Evicting finished report snapshot for interview {interview_id}");
            }
            !expired
        });
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<InterviewId, Entry>> {
        self.runs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Write handle for one run. Writes after the run was replaced or removed are dropped.
#[derive(Clone)]
pub struct ProgressReporter {
    board: ProgressBoard,
    interview_id: InterviewId,
    run_id: Uuid,
}

impl ProgressReporter {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn message(&self, text: impl Into<String>) {
        let text = text.into();
        self.board
            .update(self.interview_id, self.run_id, |s| s.progress = text);
    }

    pub fn enter(&self, phase: Phase, retry_count: u32, text: impl Into<String>) {
        let text = text.into();
        self.board.update(self.interview_id, self.run_id, |s| {
            s.phase = phase;
            s.retry_count = retry_count;
            s.progress = text;
        });
    }

    pub fn ready(&self, report: &Report) {
        let report = report.clone();
        self.board.update(self.interview_id, self.run_id, |s| {
            s.phase = Phase::Ready;
            s.progress = REPORT_READY.to_string();
            s.report = Some(report);
            s.error = None;
        });
    }

    pub fn failed(&self, error: &WorkflowError) {
        let message = error.to_string();
        self.board.update(self.interview_id, self.run_id, |s| {
            s.phase = Phase::Failed;
            s.progress = String::new();
            s.error = Some(message);
        });
    }

    pub fn current(&self) -> Option<WorkflowSnapshot> {
        self.board
            .snapshot(self.interview_id)
            .filter(|s| s.run_id == self.run_id)
    }

    /// Returns a guard that marks the run failed if it is dropped while the
    /// thread is unwinding, so a panicking run never leaves a stuck snapshot.
    pub fn fail_on_panic(&self) -> PanicGuard {
        PanicGuard {
            reporter: self.clone(),
        }
    }
}

pub struct PanicGuard {
    reporter: ProgressReporter,
}

impl Drop for PanicGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.reporter.failed(&WorkflowError::Interrupted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_creates_init_snapshot() {
        let board = ProgressBoard::default();
        let reporter = board.begin(7, Uuid::new_v4(), 2);

        let snapshot = board.snapshot(7).unwrap();
        assert_eq!(snapshot.phase, Phase::Init);
        assert_eq!(snapshot.progress, STARTING);
        assert_eq!(snapshot.max_retries, 2);
        assert_eq!(snapshot.run_id, reporter.run_id());
    }

    #[test]
    fn test_enter_updates_phase_and_retry_count() {
        let board = ProgressBoard::default();
        let reporter = board.begin(7, Uuid::new_v4(), 2);

        reporter.enter(Phase::RetryWait, 1, "retrying");

        let snapshot = reporter.current().unwrap();
        assert_eq!(snapshot.phase, Phase::RetryWait);
        assert_eq!(snapshot.retry_count, 1);
        assert_eq!(snapshot.progress, "retrying");
    }

    #[test]
    fn test_stale_reporter_cannot_overwrite_new_run() {
        let board = ProgressBoard::default();
        let stale = board.begin(7, Uuid::new_v4(), 2);
        let fresh = board.begin(7, Uuid::new_v4(), 2);

        stale.failed(&WorkflowError::PermanentGenerationFailure("old".to_string()));

        let snapshot = board.snapshot(7).unwrap();
        assert_eq!(snapshot.run_id, fresh.run_id());
        assert_eq!(snapshot.phase, Phase::Init);
        assert!(stale.current().is_none());
    }

    #[test]
    fn test_writes_after_removal_are_dropped() {
        let board = ProgressBoard::default();
        let reporter = board.begin(7, Uuid::new_v4(), 2);
        assert!(board.remove_run(7, reporter.run_id()));

        reporter.message("late update");

        assert!(board.snapshot(7).is_none());
    }

    #[test]
    fn test_failed_records_error_message() {
        let board = ProgressBoard::default();
        let reporter = board.begin(3, Uuid::new_v4(), 2);

        reporter.failed(&WorkflowError::PermanentGenerationFailure(
            "validation error".to_string(),
        ));

        let snapshot = board.snapshot(3).unwrap();
        assert_eq!(snapshot.phase, Phase::Failed);
        assert_eq!(snapshot.error.as_deref(), Some("validation error"));
        assert!(snapshot.phase.is_terminal());
    }

    #[test]
    fn test_remove_run_ignores_other_runs() {
        let board = ProgressBoard::default();
        let old = board.begin(7, Uuid::new_v4(), 2);
        let fresh = board.begin(7, Uuid::new_v4(), 2);

        assert!(!board.remove_run(7, old.run_id()));
        assert_eq!(board.snapshot(7).unwrap().run_id, fresh.run_id());

        assert!(board.remove_run(7, fresh.run_id()));
        assert!(board.snapshot(7).is_none());
    }

    #[test]
    fn test_remove_finished_keeps_live_run() {
        let board = ProgressBoard::default();
        let reporter = board.begin(7, Uuid::new_v4(), 2);

        assert!(!board.remove_finished(7));
        assert!(board.snapshot(7).is_some());

        reporter.failed(&WorkflowError::Interrupted);
        assert!(board.remove_finished(7));
        assert!(board.snapshot(7).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_finished_snapshots_expire() {
        let board = ProgressBoard::with_retention(Duration::from_secs(30));
        let finished = board.begin(1, Uuid::new_v4(), 2);
        let running = board.begin(2, Uuid::new_v4(), 2);

        finished.failed(&WorkflowError::PermanentGenerationFailure("bad".to_string()));
        running.enter(Phase::Generating, 0, ANALYZING);

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(board.snapshot(1).is_some());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(board.snapshot(1).is_none());
        assert_eq!(board.snapshot(2).unwrap().phase, Phase::Generating);
    }

    #[tokio::test]
    async fn test_panic_guard_marks_run_failed() {
        let board = ProgressBoard::default();
        let reporter = board.begin(9, Uuid::new_v4(), 2);
        reporter.enter(Phase::Generating, 0, ANALYZING);

        let task_reporter = reporter.clone();
        let handle = tokio::spawn(async move {
            let _guard = task_reporter.fail_on_panic();
            panic!("synthesis blew up");
        });
        assert!(handle.await.is_err());

        let snapshot = reporter.current().unwrap();
        assert_eq!(snapshot.phase, Phase::Failed);
        assert_eq!(snapshot.error.as_deref(), Some("Report workflow stopped unexpectedly"));
    }

    #[test]
    fn test_panic_guard_is_silent_on_normal_drop() {
        let board = ProgressBoard::default();
        let reporter = board.begin(9, Uuid::new_v4(), 2);
        drop(reporter.fail_on_panic());
        assert_eq!(reporter.current().unwrap().phase, Phase::Init);
    }

    #[test]
    fn test_phase_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Phase::WaitingForData).unwrap(),
            r#""waiting_for_data""#
        );
    }
}
