// Report synthesis workflow.
// Flow: guard admits one run per interview → wait for the voice agent's data →
// request synthesis → on upstream timeout, back off and start over from the
// readiness wait (bounded) → parsed Report or terminal failure.
// No internal retries anywhere except in the coordinator.

use std::time::Duration;

use thiserror::Error;

pub mod coordinator;
pub mod guard;
pub mod handlers;
pub mod orchestrator;
pub mod poller;
pub mod progress;
pub mod requester;

pub use coordinator::RetryCoordinator;
pub use guard::WorkflowGuard;
pub use orchestrator::ReportOrchestrator;
pub use progress::{Phase, ProgressBoard, WorkflowSnapshot, DEFAULT_SNAPSHOT_RETENTION};

/// Bounds for the readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    /// Hard wall-clock limit on the whole wait.
    pub deadline: Duration,
    /// Pause between probes.
    pub interval: Duration,
    /// Pause after data is seen, so trailing writes from the agent can land.
    pub settle_delay: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(30),
            interval: Duration::from_secs(2),
            settle_delay: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowPolicy {
    pub readiness: ReadinessPolicy,
    /// Timeout retries allowed after the first attempt.
    pub max_timeout_retries: u32,
    pub retry_backoff: Duration,
    /// How long a finished snapshot stays readable without an explicit discard.
    pub snapshot_retention: Duration,
}

impl Default for WorkflowPolicy {
    fn default() -> Self {
        Self {
            readiness: ReadinessPolicy::default(),
            max_timeout_retries: 2,
            retry_backoff: Duration::from_secs(5),
            snapshot_retention: DEFAULT_SNAPSHOT_RETENTION,
        }
    }
}

/// Terminal failures of a workflow run.
///
/// An exhausted readiness wait is not an error (generation is attempted
/// anyway), and a missing report section is represented by absence.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    #[error("Report generation timed out after {attempts} attempts: {message}")]
    TransientGenerationTimeout { attempts: u32, message: String },

    #[error("{0}")]
    PermanentGenerationFailure(String),

    #[error("Invalid workflow transition from {from:?} on {event}")]
    InvalidTransition { from: Phase, event: &'static str },

    #[error("Report workflow stopped unexpectedly")]
    Interrupted,
}
