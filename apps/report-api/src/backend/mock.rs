//! Scripted in-memory backend for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use super::{BackendError, InterviewBackend};
use crate::models::interview::{InterviewDataAvailability, InterviewId};

pub type ProbeReply = Result<InterviewDataAvailability, BackendError>;
pub type GenerateReply = Result<String, BackendError>;

/// Replays queued replies in order. When a queue runs dry the probe reports
/// "not available" and generation reports a non-retryable error.
#[derive(Default)]
pub struct ScriptedBackend {
    probes: Mutex<VecDeque<ProbeReply>>,
    generations: Mutex<VecDeque<GenerateReply>>,
    pdf: Option<Bytes>,
    generation_panics: bool,
    probe_calls: AtomicU32,
    generate_calls: AtomicU32,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_probe(self, reply: ProbeReply) -> Self {
        self.probes.lock().unwrap().push_back(reply);
        self
    }

    pub fn with_generation(self, reply: GenerateReply) -> Self {
        self.generations.lock().unwrap().push_back(reply);
        self
    }

    pub fn with_pdf(mut self, bytes: &'static [u8]) -> Self {
        self.pdf = Some(Bytes::from_static(bytes));
        self
    }

    /// Every generation call panics instead of replying.
    pub fn with_generation_panic(mut self) -> Self {
        self.generation_panics = true;
        self
    }

    pub fn probe_calls(&self) -> u32 {
        self.probe_calls.load(Ordering::SeqCst)
    }

    pub fn generate_calls(&self) -> u32 {
        self.generate_calls.load(Ordering::SeqCst)
    }
}

pub fn available(qa_pair_count: u32) -> ProbeReply {
    Ok(InterviewDataAvailability {
        available: true,
        qa_pair_count,
        transcript_item_count: qa_pair_count * 2,
    })
}

pub fn not_yet() -> ProbeReply {
    Ok(InterviewDataAvailability {
        available: false,
        qa_pair_count: 0,
        transcript_item_count: 0,
    })
}

pub fn probe_error() -> ProbeReply {
    Err(BackendError::Status {
        status: 503,
        message: "connection refused".to_string(),
    })
}

pub fn success_envelope(full_report: &str) -> GenerateReply {
    Ok(serde_json::json!({
        "success": true,
        "report_data": {
            "interview_type": "Technical Interview",
            "full_report": full_report,
            "generated_at": "2025-03-01T10:15:30.123456",
            "qa_count": 5
        },
        "pdf_path": "reports/interview_report.pdf"
    })
    .to_string())
}

pub fn timeout_envelope() -> GenerateReply {
    Ok(serde_json::json!({
        "success": false,
        "error": "Report generation timed out",
        "timeout": true
    })
    .to_string())
}

pub fn failure_envelope(error: &str) -> GenerateReply {
    Ok(serde_json::json!({ "success": false, "error": error }).to_string())
}

#[async_trait]
impl InterviewBackend for ScriptedBackend {
    async fn check_interview_data(
        &self,
        _interview_id: InterviewId,
    ) -> Result<InterviewDataAvailability, BackendError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.probes.lock().unwrap().pop_front();
        next.unwrap_or_else(not_yet)
    }

    async fn generate_report(&self, _interview_id: InterviewId) -> Result<String, BackendError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        if self.generation_panics {
            panic!("scripted generation panic");
        }
        let next = self.generations.lock().unwrap().pop_front();
        next.unwrap_or_else(|| failure_envelope("no scripted generation reply"))
    }

    async fn download_report(&self, interview_id: InterviewId) -> Result<Bytes, BackendError> {
        self.pdf.clone().ok_or_else(|| BackendError::Status {
            status: 404,
            message: format!("No report found for interview {interview_id}"),
        })
    }
}
