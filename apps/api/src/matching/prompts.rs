// Prompt constants for resume classification.

/// System instruction sent with every classification call.
pub const CLASSIFY_SYSTEM: &str = "You are a JSON-only AI recruiter.";

/// Classification prompt template. Replace `{job_description}` and `{resume_text}` before sending.
pub const CLASSIFY_PROMPT_TEMPLATE: &str = "\
You are a senior HR Recruiter AI. Classify this resume strictly against the job description.
Response MUST be valid JSON adhering to the schema.
--- JOB DESCRIPTION ---
{job_description}
--- CANDIDATE RESUME ---
{resume_text}
";

/// Builds the classification prompt with both documents embedded verbatim.
pub fn build_classify_prompt(job_description: &str, resume_text: &str) -> String {
    // Placeholders are substituted in one pass so document text containing
    // "{resume_text}" is never expanded twice.
    let (head, tail) = CLASSIFY_PROMPT_TEMPLATE
        .split_once("{job_description}")
        .unwrap_or((CLASSIFY_PROMPT_TEMPLATE, ""));
    let tail = tail.replacen("{resume_text}", resume_text, 1);
    format!("{head}{job_description}{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_both_documents_in_order() {
        let prompt = build_classify_prompt("JD BODY", "RESUME BODY");
        let jd_at = prompt.find("JD BODY").unwrap();
        let resume_at = prompt.find("RESUME BODY").unwrap();
        assert!(prompt.starts_with("You are a senior HR Recruiter AI."));
        assert!(prompt.contains("--- JOB DESCRIPTION ---\nJD BODY\n"));
        assert!(prompt.contains("--- CANDIDATE RESUME ---\nRESUME BODY\n"));
        assert!(jd_at < resume_at);
    }

    #[test]
    fn test_placeholder_text_inside_job_description_is_kept_verbatim() {
        let prompt = build_classify_prompt("literal {resume_text} here", "CV");
        assert!(prompt.contains("literal {resume_text} here"));
        assert!(prompt.contains("--- CANDIDATE RESUME ---\nCV\n"));
    }
}
