//! Section Parser — decomposes the generated report text into named sections.
//!
//! The generator writes a markdown document whose main sections are level-two
//! headings (`## EXECUTIVE SUMMARY`). One pass over the lines collects every
//! level-two heading; each known section's body is the slice between its
//! heading and the next level-two heading (known or not) or end of document.

use crate::models::report::{ReportSections, SectionName};

/// Heading vocabulary, matched case-insensitively as a prefix of the heading title.
const HEADING_VOCABULARY: &[(&str, SectionName)] = &[
    ("EXECUTIVE SUMMARY", SectionName::ExecutiveSummary),
    ("DETAILED QUESTION ANALYSIS", SectionName::QuestionAnalysis),
    (
        "DETAILED QUESTION-BY-QUESTION ANALYSIS",
        SectionName::QuestionAnalysis,
    ),
    ("COMPETENCY ASSESSMENT", SectionName::CompetencyAssessment),
    ("KEY STRENGTHS", SectionName::Strengths),
    ("STRENGTHS", SectionName::Strengths),
    ("AREAS FOR IMPROVEMENT", SectionName::Improvements),
    ("OVERALL SCORES", SectionName::Scores),
    ("FINAL RECOMMENDATION", SectionName::Recommendation),
];

struct Heading {
    /// Byte offset where the heading line starts.
    start: usize,
    /// Byte offset just past the heading line.
    body_start: usize,
    section: Option<SectionName>,
}

/// Parses `full_report_text` into its known sections.
///
/// Absent headings produce no entry. Bodies are trimmed but otherwise kept
/// verbatim. When a heading repeats, the first occurrence wins.
pub fn parse_sections(full_report_text: &str) -> ReportSections {
    let headings = collect_headings(full_report_text);
    let mut sections = ReportSections::new();

    for (idx, heading) in headings.iter().enumerate() {
        let Some(name) = heading.section else {
            continue;
        };
        let end = headings
            .get(idx + 1)
            .map(|next| next.start)
            .unwrap_or(full_report_text.len());

        sections
            .entry(name)
            .or_insert_with(|| full_report_text[heading.body_start..end].trim().to_string());
    }

    sections
}

fn collect_headings(text: &str) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let start = offset;
        offset += line.len();

        if let Some(title) = level_two_title(line) {
            headings.push(Heading {
                start,
                body_start: offset,
                section: classify_heading(title),
            });
        }
    }

    headings
}

/// Returns the title of a `## ` heading line. `###` and deeper are body text.
fn level_two_title(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix("##")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim())
}

fn classify_heading(title: &str) -> Option<SectionName> {
    let title = title.trim_matches('*').trim();
    let title = strip_numbering(title).to_uppercase();

    HEADING_VOCABULARY
        .iter()
        .find(|(keyword, _)| {
            title.strip_prefix(keyword).is_some_and(|rest| {
                !rest
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_alphanumeric() || c == '-')
            })
        })
        .map(|(_, name)| *name)
}

/// Drops a leading `1.` / `2)` section number.
fn strip_numbering(title: &str) -> &str {
    let digits_end = title
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(title.len());
    if digits_end == 0 {
        return title;
    }
    match title[digits_end..].strip_prefix(['.', ')']) {
        Some(rest) => rest.trim_start(),
        None => title,
    }
}
