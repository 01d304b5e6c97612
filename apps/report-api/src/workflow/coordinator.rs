//! Retry Coordinator — the workflow as an explicit state machine.
//!
//! ```text
//! Init → WaitingForData → Generating → Ready
//!                ↑             │
//!                └─ RetryWait ←┤ (timeout, retries left)
//!                              └→ Failed (permanent, or timeout with no retries left)
//! ```
//!
//! `WorkflowRun::apply` is the pure transition function; `RetryCoordinator::run`
//! drives it, performing the I/O each state asks for. Exactly one attempt is in
//! flight at any time.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::poller::DataReadinessPoller;
use super::progress::{Phase, ProgressReporter, ANALYZING, WAITING_FOR_DATA};
use super::requester::{ReportGenerationOutcome, ReportRequester};
use super::{WorkflowError, WorkflowPolicy};
use crate::backend::InterviewBackend;
use crate::models::interview::InterviewId;
use crate::models::report::Report;

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    Init,
    WaitingForData,
    Generating,
    RetryWait,
    Ready(Report),
    Failed(WorkflowError),
}

impl WorkflowState {
    pub fn phase(&self) -> Phase {
        match self {
            WorkflowState::Init => Phase::Init,
            WorkflowState::WaitingForData => Phase::WaitingForData,
            WorkflowState::Generating => Phase::Generating,
            WorkflowState::RetryWait => Phase::RetryWait,
            WorkflowState::Ready(_) => Phase::Ready,
            WorkflowState::Failed(_) => Phase::Failed,
        }
    }
}

#[derive(Debug)]
pub enum WorkflowEvent {
    Started,
    /// The readiness wait ended; `ready` is informational only.
    DataResolved { ready: bool },
    Generated(ReportGenerationOutcome),
    BackoffElapsed,
}

impl WorkflowEvent {
    fn name(&self) -> &'static str {
        match self {
            WorkflowEvent::Started => "started",
            WorkflowEvent::DataResolved { .. } => "data_resolved",
            WorkflowEvent::Generated(_) => "generated",
            WorkflowEvent::BackoffElapsed => "backoff_elapsed",
        }
    }
}

/// In-memory state of one orchestration attempt for one interview.
#[derive(Debug)]
pub struct WorkflowRun {
    pub interview_id: InterviewId,
    pub started_at: DateTime<Utc>,
    retry_count: u32,
    max_retries: u32,
    state: WorkflowState,
}

impl WorkflowRun {
    pub fn new(interview_id: InterviewId, max_retries: u32) -> Self {
        Self {
            interview_id,
            started_at: Utc::now(),
            retry_count: 0,
            max_retries,
            state: WorkflowState::Init,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Applies one event. An event the current state does not accept leaves
    /// the state untouched and returns `InvalidTransition`.
    pub fn apply(&mut self, event: WorkflowEvent) -> Result<Phase, WorkflowError> {
        let current = std::mem::replace(&mut self.state, WorkflowState::Init);

        let next = match (current, event) {
            (WorkflowState::Init, WorkflowEvent::Started) => WorkflowState::WaitingForData,
            (WorkflowState::WaitingForData, WorkflowEvent::DataResolved { .. }) => {
                WorkflowState::Generating
            }
            (
                WorkflowState::Generating,
                WorkflowEvent::Generated(ReportGenerationOutcome::Success(report)),
            ) => WorkflowState::Ready(report),
            (
                WorkflowState::Generating,
                WorkflowEvent::Generated(ReportGenerationOutcome::TimeoutFailure { message }),
            ) => {
                if self.retry_count < self.max_retries {
                    self.retry_count += 1;
                    WorkflowState::RetryWait
                } else {
                    WorkflowState::Failed(WorkflowError::TransientGenerationTimeout {
                        attempts: self.retry_count + 1,
                        message,
                    })
                }
            }
            (
                WorkflowState::Generating,
                WorkflowEvent::Generated(ReportGenerationOutcome::PermanentFailure { message }),
            ) => WorkflowState::Failed(WorkflowError::PermanentGenerationFailure(message)),
            (WorkflowState::RetryWait, WorkflowEvent::BackoffElapsed) => {
                WorkflowState::WaitingForData
            }
            (current, event) => {
                let err = WorkflowError::InvalidTransition {
                    from: current.phase(),
                    event: event.name(),
                };
                self.state = current;
                return Err(err);
            }
        };

        self.state = next;
        Ok(self.state.phase())
    }

    fn into_result(self) -> Result<Report, WorkflowError> {
        match self.state {
            WorkflowState::Ready(report) => Ok(report),
            WorkflowState::Failed(err) => Err(err),
            other => Err(WorkflowError::InvalidTransition {
                from: other.phase(),
                event: "finish",
            }),
        }
    }
}

pub struct RetryCoordinator {
    poller: DataReadinessPoller,
    requester: ReportRequester,
    policy: WorkflowPolicy,
}

impl RetryCoordinator {
    pub fn new(backend: Arc<dyn InterviewBackend>, policy: WorkflowPolicy) -> Self {
        Self {
            poller: DataReadinessPoller::new(backend.clone(), policy.readiness),
            requester: ReportRequester::new(backend),
            policy,
        }
    }

    pub fn policy(&self) -> &WorkflowPolicy {
        &self.policy
    }

    /// Drives one run from `Init` to a terminal state.
    pub async fn run(
        &self,
        interview_id: InterviewId,
        progress: &ProgressReporter,
    ) -> Result<Report, WorkflowError> {
        let mut run = WorkflowRun::new(interview_id, self.policy.max_timeout_retries);
        info!("Starting report workflow for interview {interview_id}");

        while !run.phase().is_terminal() {
            let event = match run.state() {
                WorkflowState::Init => WorkflowEvent::Started,
                WorkflowState::WaitingForData => {
                    progress.enter(Phase::WaitingForData, run.retry_count(), WAITING_FOR_DATA);
                    let ready = self.poller.wait_for_data(interview_id, progress).await;
                    WorkflowEvent::DataResolved { ready }
                }
                WorkflowState::Generating => {
                    progress.enter(Phase::Generating, run.retry_count(), ANALYZING);
                    WorkflowEvent::Generated(self.requester.generate(interview_id).await)
                }
                WorkflowState::RetryWait => {
                    warn!(
                        "Report generation for interview {interview_id} timed out; retry {}/{} in {}ms",
                        run.retry_count(),
                        self.policy.max_timeout_retries,
                        self.policy.retry_backoff.as_millis()
                    );
                    progress.enter(
                        Phase::RetryWait,
                        run.retry_count(),
                        format!(
                            "Data still processing, retrying (attempt {}/{})...",
                            run.retry_count(),
                            self.policy.max_timeout_retries
                        ),
                    );
                    sleep(self.policy.retry_backoff).await;
                    WorkflowEvent::BackoffElapsed
                }
                WorkflowState::Ready(_) | WorkflowState::Failed(_) => break,
            };

            if let Err(err) = run.apply(event) {
                error!("Report workflow for interview {interview_id} aborted: {err}");
                progress.failed(&err);
                return Err(err);
            }
        }

        let retries = run.retry_count();
        let elapsed = (Utc::now() - run.started_at).num_seconds();
        let result = run.into_result();
        match &result {
            Ok(report) => {
                info!(
                    "Report ready for interview {interview_id} after {retries} retries in {elapsed}s ({} sections, kind {:?})",
                    report.sections.len(),
                    report.interview_kind()
                );
                let missing = report.missing_headings();
                if !missing.is_empty() {
                    debug!(
                        "Report for interview {interview_id} has no {} section(s)",
                        missing.join(", ")
                    );
                }
                progress.ready(report);
            }
            Err(err) => {
                warn!("Report workflow for interview {interview_id} failed after {retries} retries in {elapsed}s: {err}");
                progress.failed(err);
            }
        }
        result
    }
}
