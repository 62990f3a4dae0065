//! View: renders session state, library readiness and history into the model the
//! client draws. No decisions live here beyond control enabling and score banding.

use serde::Serialize;

use crate::loader::LibraryReadiness;
use crate::models::history::HistoryEntry;
use crate::models::report::Report;
use crate::session::SessionState;

pub const UPLOAD_ACCEPT: &str = ".pdf,.docx,.txt";

/// Colour band for a match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Good,
    Caution,
    Poor,
}

impl ScoreBand {
    pub fn for_score(score: f64) -> Self {
        if score >= 70.0 {
            ScoreBand::Good
        } else if score >= 50.0 {
            ScoreBand::Caution
        } else {
            ScoreBand::Poor
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    pub job_description: String,
    pub resume_text: String,
    pub loading: bool,
    pub error_message: Option<String>,
    pub libraries: LibraryReadiness,
    pub upload: UploadControl,
    pub classify: ClassifyControl,
    pub report: Option<ReportView>,
    pub history: HistoryView,
}

#[derive(Debug, Serialize)]
pub struct UploadControl {
    pub enabled: bool,
    pub label: &'static str,
    pub accept: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ClassifyControl {
    pub enabled: bool,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub score: f64,
    pub band: ScoreBand,
    pub summary: String,
    pub email: String,
    pub matched: String,
    pub missing: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryView {
    pub items: Vec<HistoryItemView>,
    /// The clear control is only offered when there is something to clear.
    pub can_clear: bool,
    pub empty_message: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItemView {
    pub id: i64,
    pub score: f64,
    pub band: ScoreBand,
    pub job_description: String,
    pub timestamp: String,
}

impl From<&Report> for ReportView {
    fn from(report: &Report) -> Self {
        Self {
            score: report.match_score_percent,
            band: ScoreBand::for_score(report.match_score_percent),
            summary: report.match_summary.clone(),
            email: report.extracted_email.clone(),
            matched: report.top_keywords_matched.join(", "),
            missing: report.crucial_skills_missing.join(", "),
        }
    }
}

impl From<&HistoryEntry> for HistoryItemView {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            id: entry.id,
            score: entry.report.match_score_percent,
            band: ScoreBand::for_score(entry.report.match_score_percent),
            job_description: entry.job_description_snippet.clone(),
            timestamp: entry.timestamp.clone(),
        }
    }
}

pub fn render(
    state: &SessionState,
    libraries: LibraryReadiness,
    history: &[HistoryEntry],
) -> ViewModel {
    let upload = match &libraries {
        LibraryReadiness::Ready => UploadControl {
            enabled: true,
            label: "Upload PDF / DOCX / TXT",
            accept: UPLOAD_ACCEPT,
        },
        LibraryReadiness::Loading => UploadControl {
            enabled: false,
            label: "Loading Libraries...",
            accept: UPLOAD_ACCEPT,
        },
        LibraryReadiness::Failed(_) => UploadControl {
            enabled: false,
            label: "Document libraries unavailable",
            accept: UPLOAD_ACCEPT,
        },
    };

    let classify = ClassifyControl {
        enabled: !state.loading
            && !state.job_description.trim().is_empty()
            && !state.resume_text.trim().is_empty(),
        label: if state.loading {
            "Analyzing..."
        } else {
            "Classify Resume"
        },
    };

    ViewModel {
        job_description: state.job_description.clone(),
        resume_text: state.resume_text.clone(),
        loading: state.loading,
        error_message: state.error_message.clone(),
        libraries,
        upload,
        classify,
        report: state.current_report.as_ref().map(ReportView::from),
        history: HistoryView {
            items: history.iter().map(HistoryItemView::from).collect(),
            can_clear: !history.is_empty(),
            empty_message: history.is_empty().then_some("No recent scans."),
        },
    }
}
