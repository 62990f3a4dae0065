//! Match Requester: scores a resume against a job description through the LLM.
//!
//! `AppState` holds an `Arc<dyn Classifier>`; the default backend is `GeminiClassifier`.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::models::report::Report;

pub mod prompts;

use prompts::{build_classify_prompt, CLASSIFY_SYSTEM};

/// The classifier trait. Implement this to swap scoring backends without touching
/// session or handler code.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, job_description: &str, resume_text: &str) -> Result<Report, AppError>;
}

/// Response schema constraining the model to the five `Report` fields.
pub fn report_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "extractedEmail": { "type": "STRING" },
            "matchScorePercent": { "type": "NUMBER" },
            "matchSummary": { "type": "STRING" },
            "topKeywordsMatched": { "type": "ARRAY", "items": { "type": "STRING" } },
            "crucialSkillsMissing": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": [
            "extractedEmail",
            "matchScorePercent",
            "matchSummary",
            "topKeywordsMatched",
            "crucialSkillsMissing"
        ]
    })
}

/// Both documents must contain something other than whitespace.
pub fn validate_inputs(job_description: &str, resume_text: &str) -> Result<(), AppError> {
    if job_description.trim().is_empty() || resume_text.trim().is_empty() {
        return Err(AppError::Validation(
            "Please provide both Job Description and Resume.".to_string(),
        ));
    }
    Ok(())
}

/// Schema-constrained Gemini classification. One request per call.
pub struct GeminiClassifier {
    llm: LlmClient,
    schema: Value,
}

impl GeminiClassifier {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            schema: report_schema(),
        }
    }
}

#[async_trait]
impl Classifier for GeminiClassifier {
    async fn classify(&self, job_description: &str, resume_text: &str) -> Result<Report, AppError> {
        validate_inputs(job_description, resume_text)?;

        let prompt = build_classify_prompt(job_description, resume_text);
        let report: Report = self
            .llm
            .call_json(&prompt, CLASSIFY_SYSTEM, &self.schema)
            .await?;
        let report = report.clamped();

        info!(
            "Resume classified: score={}%, matched={}, missing={}",
            report.match_score_percent,
            report.top_keywords_matched.len(),
            report.crucial_skills_missing.len()
        );
        Ok(report)
    }
}
