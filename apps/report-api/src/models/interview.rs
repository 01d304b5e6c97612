use serde::{Deserialize, Serialize};

/// Interview identifiers are issued by the upstream interview-creation flow.
pub type InterviewId = i64;

/// The four interview formats offered by the upstream application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewType {
    Technical,
    Behavioral,
    ResumeBased,
    CompanySpecific,
}

impl InterviewType {
    /// Maps the upstream display label (or a snake_case identifier) onto the enum.
    /// Unknown labels yield `None`; the raw label stays canonical on the report.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "technical" | "technical interview" => Some(Self::Technical),
            "behavioral" | "hr & behavioral" | "hr and behavioral" | "hr behavioral" => {
                Some(Self::Behavioral)
            }
            "resume based" | "resume" => Some(Self::ResumeBased),
            "company specific" | "company" => Some(Self::CompanySpecific),
            _ => None,
        }
    }
}

/// Point-in-time answer to "has the voice agent persisted this interview yet".
/// Derived from a readiness probe; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InterviewDataAvailability {
    pub available: bool,
    pub qa_pair_count: u32,
    pub transcript_item_count: u32,
}
