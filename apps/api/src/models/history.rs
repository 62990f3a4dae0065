use serde::{Deserialize, Serialize};

use crate::models::report::Report;

/// Number of job-description characters kept in a history snippet.
pub const SNIPPET_CHARS: usize = 50;

/// A persisted record pairing a report with the job description it was scored against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Creation time in milliseconds since the Unix epoch. Unique within a history list.
    pub id: i64,
    pub report: Report,
    /// First 50 characters of the job description followed by "...".
    #[serde(rename = "jobDescription")]
    pub job_description_snippet: String,
    /// Localized creation date, e.g. "10/16/2026".
    pub timestamp: String,
}

/// Truncates on character boundaries, never bytes.
pub fn job_description_snippet(job_description: &str) -> String {
    let head: String = job_description.chars().take(SNIPPET_CHARS).collect();
    format!("{head}...")
}
