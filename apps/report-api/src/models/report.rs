use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::interview::{InterviewId, InterviewType};

/// Named sections of a synthesized interview report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionName {
    ExecutiveSummary,
    QuestionAnalysis,
    CompetencyAssessment,
    Strengths,
    Improvements,
    Scores,
    Recommendation,
}

impl SectionName {
    pub const ALL: [SectionName; 7] = [
        SectionName::ExecutiveSummary,
        SectionName::QuestionAnalysis,
        SectionName::CompetencyAssessment,
        SectionName::Strengths,
        SectionName::Improvements,
        SectionName::Scores,
        SectionName::Recommendation,
    ];

    /// Canonical heading text the report generator writes for this section.
    pub fn heading(self) -> &'static str {
        match self {
            SectionName::ExecutiveSummary => "EXECUTIVE SUMMARY",
            SectionName::QuestionAnalysis => "DETAILED QUESTION ANALYSIS",
            SectionName::CompetencyAssessment => "COMPETENCY ASSESSMENT",
            SectionName::Strengths => "STRENGTHS",
            SectionName::Improvements => "AREAS FOR IMPROVEMENT",
            SectionName::Scores => "OVERALL SCORES",
            SectionName::Recommendation => "FINAL RECOMMENDATION",
        }
    }
}

/// Structural view over `Report::full_report_text`. A missing key means the
/// heading was absent from the document.
pub type ReportSections = BTreeMap<SectionName, String>;

/// A successfully synthesized report. Immutable once built.
///
/// `full_report_text` is canonical; `sections` is a best-effort derived view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub interview_id: InterviewId,
    pub interview_type: String,
    pub full_report_text: String,
    pub generated_at: DateTime<Utc>,
    pub pdf_path: Option<String>,
    pub sections: ReportSections,
    /// Set when the upstream generator fell back to a minimal template.
    pub is_fallback: bool,
    pub qa_count: Option<u32>,
}

impl Report {
    pub fn interview_kind(&self) -> Option<InterviewType> {
        InterviewType::from_label(&self.interview_type)
    }

    pub fn section(&self, name: SectionName) -> Option<&str> {
        self.sections.get(&name).map(String::as_str)
    }

    /// Headings of the sections absent from `full_report_text`, in report order.
    pub fn missing_headings(&self) -> Vec<&'static str> {
        SectionName::ALL
            .into_iter()
            .filter(|name| !self.sections.contains_key(name))
            .map(SectionName::heading)
            .collect()
    }
}
