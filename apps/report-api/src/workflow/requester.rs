//! Report Requester — one synthesis call, classified.
//!
//! `timeout: true` in a failure envelope is the only retryable signal. Every
//! other failure (transport, malformed envelope, validation, server error)
//! is permanent. Retrying is the coordinator's decision, never this module's.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use crate::backend::InterviewBackend;
use crate::models::interview::InterviewId;
use crate::models::report::Report;
use crate::report::parse_sections;

/// Timestamp layouts the upstream has been seen to emit (naive, read as UTC).
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

#[derive(Debug, Clone, PartialEq)]
pub enum ReportGenerationOutcome {
    Success(Report),
    TimeoutFailure { message: String },
    PermanentFailure { message: String },
}

#[derive(Debug, Deserialize)]
struct GenerateReportEnvelope {
    success: bool,
    #[serde(default)]
    report_data: Option<ReportData>,
    #[serde(default)]
    pdf_path: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    timeout: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ReportData {
    interview_type: String,
    full_report: String,
    generated_at: String,
    #[serde(default)]
    qa_count: Option<u32>,
    #[serde(default)]
    is_fallback: bool,
}

pub struct ReportRequester {
    backend: Arc<dyn InterviewBackend>,
}

impl ReportRequester {
    pub fn new(backend: Arc<dyn InterviewBackend>) -> Self {
        Self { backend }
    }

    pub async fn generate(&self, interview_id: InterviewId) -> ReportGenerationOutcome {
        info!("Requesting report synthesis for interview {interview_id}");

        let body = match self.backend.generate_report(interview_id).await {
            Ok(body) => body,
            Err(e) => {
                warn!("generate-report request for interview {interview_id} failed: {e}");
                return ReportGenerationOutcome::PermanentFailure {
                    message: format!("Report generation request failed: {e}"),
                };
            }
        };

        classify_response(interview_id, &body)
    }
}

/// Classifies a raw `generate-report` response body.
pub fn classify_response(interview_id: InterviewId, body: &str) -> ReportGenerationOutcome {
    let envelope: GenerateReportEnvelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) => {
            return ReportGenerationOutcome::PermanentFailure {
                message: format!("Malformed report response: {e}"),
            }
        }
    };

    if !envelope.success {
        let message = envelope
            .error
            .unwrap_or_else(|| "Failed to generate report".to_string());
        return if envelope.timeout == Some(true) {
            ReportGenerationOutcome::TimeoutFailure { message }
        } else {
            ReportGenerationOutcome::PermanentFailure { message }
        };
    }

    let Some(data) = envelope.report_data else {
        return ReportGenerationOutcome::PermanentFailure {
            message: "Report response is missing report_data".to_string(),
        };
    };

    match build_report(interview_id, data, envelope.pdf_path) {
        Ok(report) => ReportGenerationOutcome::Success(report),
        Err(message) => ReportGenerationOutcome::PermanentFailure { message },
    }
}

fn build_report(
    interview_id: InterviewId,
    data: ReportData,
    pdf_path: Option<String>,
) -> Result<Report, String> {
    // A "successful" synthesis over zero answers is not a usable report.
    if data.qa_count == Some(0) {
        return Err("No interview answers were recorded; nothing to evaluate".to_string());
    }
    if data.full_report.trim().is_empty() {
        return Err("Report response contained an empty report".to_string());
    }
    let generated_at = parse_generated_at(&data.generated_at)
        .ok_or_else(|| format!("Unrecognised generated_at timestamp '{}'", data.generated_at))?;

    Ok(Report {
        interview_id,
        interview_type: data.interview_type,
        sections: parse_sections(&data.full_report),
        full_report_text: data.full_report,
        generated_at,
        pdf_path: pdf_path.filter(|p| !p.is_empty()),
        is_fallback: data.is_fallback,
        qa_count: data.qa_count,
    })
}

fn parse_generated_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}
