use serde::{Deserialize, Serialize};

/// Structured classification result returned by the AI endpoint.
/// Field names on the wire match the response schema sent with every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub extracted_email: String,
    pub match_score_percent: f64,
    pub match_summary: String,
    pub top_keywords_matched: Vec<String>,
    pub crucial_skills_missing: Vec<String>,
}

impl Report {
    /// Models occasionally drift outside 0–100; the view assumes a percentage.
    pub fn clamped(mut self) -> Self {
        if self.match_score_percent.is_nan() {
            self.match_score_percent = 0.0;
        }
        self.match_score_percent = self.match_score_percent.clamp(0.0, 100.0);
        self
    }
}
