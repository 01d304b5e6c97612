//! Upstream interview API — the only way this service talks to the system that
//! stores interview data and runs report synthesis.
//!
//! `AppState` holds an `Arc<dyn InterviewBackend>`; the HTTP implementation is
//! swapped for a scripted one in tests.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use thiserror::Error;

use crate::models::interview::{InterviewDataAvailability, InterviewId};

pub mod http;
#[cfg(test)]
pub mod mock;

pub use http::HttpInterviewBackend;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("could not decode upstream response: {0}")]
    Decode(String),
}

/// Wire shape of `GET /check-interview-data/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckDataResponse {
    pub success: bool,
    #[serde(default)]
    pub data_available: bool,
    #[serde(default)]
    pub qa_count: u32,
    #[serde(default)]
    pub transcript_items: u32,
}

impl From<CheckDataResponse> for InterviewDataAvailability {
    fn from(response: CheckDataResponse) -> Self {
        InterviewDataAvailability {
            available: response.success && response.data_available,
            qa_pair_count: response.qa_count,
            transcript_item_count: response.transcript_items,
        }
    }
}

#[async_trait]
pub trait InterviewBackend: Send + Sync {
    /// One readiness probe.
    async fn check_interview_data(
        &self,
        interview_id: InterviewId,
    ) -> Result<InterviewDataAvailability, BackendError>;

    /// Triggers synthesis and returns the raw response envelope, whatever its
    /// HTTP status. Classification of the envelope is the caller's job.
    async fn generate_report(&self, interview_id: InterviewId) -> Result<String, BackendError>;

    /// Fetches the rendered PDF for a previously generated report.
    async fn download_report(&self, interview_id: InterviewId) -> Result<Bytes, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_requires_success_and_flag() {
        let response: CheckDataResponse = serde_json::from_str(
            r#"{"success": true, "data_available": true, "qa_count": 6, "transcript_items": 14}"#,
        )
        .unwrap();
        let availability = InterviewDataAvailability::from(response);
        assert!(availability.available);
        assert_eq!(availability.qa_pair_count, 6);
        assert_eq!(availability.transcript_item_count, 14);
    }

    #[test]
    fn test_unsuccessful_probe_is_not_available() {
        let response: CheckDataResponse =
            serde_json::from_str(r#"{"success": false, "data_available": true}"#).unwrap();
        assert!(!InterviewDataAvailability::from(response).available);
    }

    #[test]
    fn test_missing_counts_default_to_zero() {
        let response: CheckDataResponse =
            serde_json::from_str(r#"{"success": true, "data_available": false}"#).unwrap();
        let availability = InterviewDataAvailability::from(response);
        assert!(!availability.available);
        assert_eq!(availability.qa_pair_count, 0);
    }
}
