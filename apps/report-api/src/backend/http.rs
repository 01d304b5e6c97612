use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{BackendError, CheckDataResponse, InterviewBackend};
use crate::models::interview::{InterviewDataAvailability, InterviewId};

#[derive(Debug, Deserialize)]
struct UpstreamError {
    error: String,
}

/// `InterviewBackend` over the upstream REST API.
///
/// No retries happen here. Readiness probes carry a short per-request timeout;
/// the generation call carries none, because the upstream reports its own
/// synthesis timeout and a slow success must not be cut off locally.
#[derive(Clone)]
pub struct HttpInterviewBackend {
    client: Client,
    base_url: String,
    probe_timeout: Duration,
}

impl HttpInterviewBackend {
    pub fn new(base_url: impl Into<String>, probe_timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            probe_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str, interview_id: InterviewId) -> String {
        format!("{}/{path}/{interview_id}", self.base_url)
    }
}

#[async_trait]
impl InterviewBackend for HttpInterviewBackend {
    async fn check_interview_data(
        &self,
        interview_id: InterviewId,
    ) -> Result<InterviewDataAvailability, BackendError> {
        let response = self
            .client
            .get(self.url("check-interview-data", interview_id))
            .header("content-type", "application/json")
            .timeout(self.probe_timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // The upstream answers "not found yet" with a JSON body too; only a body
        // that fails to decode is treated as a probe failure.
        let parsed: CheckDataResponse = serde_json::from_str(&body).map_err(|e| {
            if status.is_success() {
                BackendError::Decode(e.to_string())
            } else {
                BackendError::Status {
                    status: status.as_u16(),
                    message: upstream_message(body.clone()),
                }
            }
        })?;

        debug!(
            "Readiness probe for interview {interview_id}: status={status} available={} qa_count={}",
            parsed.data_available, parsed.qa_count
        );

        Ok(parsed.into())
    }

    async fn generate_report(&self, interview_id: InterviewId) -> Result<String, BackendError> {
        let response = self
            .client
            .post(format!("{}/generate-report", self.base_url))
            .json(&serde_json::json!({ "interview_id": interview_id }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("generate-report for interview {interview_id} returned {status}");
        }

        // Error envelopes ({success:false, error, timeout}) arrive with non-2xx
        // statuses; the body is returned either way.
        Ok(response.text().await?)
    }

    async fn download_report(&self, interview_id: InterviewId) -> Result<Bytes, BackendError> {
        let response = self
            .client
            .get(self.url("download-report", interview_id))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: upstream_message(body),
            });
        }

        Ok(response.bytes().await?)
    }
}

/// Extracts `error` from a JSON error body, falling back to the raw body.
fn upstream_message(body: String) -> String {
    serde_json::from_str::<UpstreamError>(&body)
        .map(|e| e.error)
        .unwrap_or(body)
}
