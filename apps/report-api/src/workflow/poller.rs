//! Data Readiness Poller — waits for the voice agent to persist interview data.
//!
//! At-least-once probing: a failed probe is logged and the loop carries on.
//! Only the deadline ends the wait, and exhausting it is not an error.

use std::sync::Arc;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use super::progress::{ProgressReporter, DATA_READY, WAITING_FOR_DATA};
use super::ReadinessPolicy;
use crate::backend::InterviewBackend;
use crate::models::interview::InterviewId;

pub struct DataReadinessPoller {
    backend: Arc<dyn InterviewBackend>,
    policy: ReadinessPolicy,
}

impl DataReadinessPoller {
    pub fn new(backend: Arc<dyn InterviewBackend>, policy: ReadinessPolicy) -> Self {
        Self { backend, policy }
    }

    /// Returns `true` once a probe reports the data as available (after the
    /// settle delay), or `false` when the deadline passes first. Callers
    /// proceed to generation either way.
    pub async fn wait_for_data(
        &self,
        interview_id: InterviewId,
        progress: &ProgressReporter,
    ) -> bool {
        let ReadinessPolicy {
            deadline,
            interval,
            settle_delay,
        } = self.policy;
        let started = Instant::now();
        let mut attempts = 0u32;

        progress.message(WAITING_FOR_DATA);
        info!(
            "Waiting for interview {interview_id} data (deadline {}s)",
            deadline.as_secs()
        );

        while started.elapsed() < deadline {
            attempts += 1;
            let elapsed = started.elapsed();
            progress.message(format!(
                "Waiting for interview data ({}s elapsed, {}s remaining)...",
                elapsed.as_secs(),
                deadline.saturating_sub(elapsed).as_secs()
            ));

            match self.backend.check_interview_data(interview_id).await {
                Ok(availability) if availability.available => {
                    info!(
                        "Interview {interview_id} data found after {attempts} probes: qa_pairs={} transcript_items={}",
                        availability.qa_pair_count, availability.transcript_item_count
                    );
                    progress.message(DATA_READY);
                    sleep(settle_delay).await;
                    return true;
                }
                Ok(_) => debug!("Probe {attempts}: interview {interview_id} data not yet available"),
                Err(e) => warn!("Probe {attempts} for interview {interview_id} failed: {e}"),
            }

            let remaining = deadline.saturating_sub(started.elapsed());
            sleep(interval.min(remaining)).await;
        }

        warn!(
            "Timed out waiting for interview {interview_id} data after {attempts} probes; proceeding anyway"
        );
        false
    }
}
