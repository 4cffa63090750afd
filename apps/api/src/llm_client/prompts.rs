// All LLM prompt constants for candidate extraction.

/// System prompt for resume field extraction — enforces JSON-only output.
pub const EXTRACTION_SYSTEM: &str =
    "You are an expert IT recruiter extracting candidate details from resumes. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Extraction prompt template. Replace `{jd_text}` and `{resume_text}` before sending.
/// The resume text must already be truncated to the configured prompt limit.
pub const EXTRACTION_PROMPT_TEMPLATE: &str = r#"Extract candidate details from the following resume text.

Job Description: {jd_text}

Resume Text: {resume_text}

Respond STRICTLY with a valid JSON object containing exactly these keys:
{
    "Name": "candidate full name or N/A",
    "Email": "email or N/A",
    "Phone": "phone or N/A",
    "Experience": "calculate total years, e.g. 7 Years, or N/A",
    "Skills": "comma-separated list of top 5 skills, or N/A",
    "Match": integer from 0 to 100 representing JD fit
}"#;

/// Builds the extraction prompt from a JD and a pre-truncated resume excerpt.
pub fn extraction_prompt(jd_text: &str, resume_excerpt: &str) -> String {
    let jd = if jd_text.trim().is_empty() {
        "None provided."
    } else {
        jd_text
    };
    EXTRACTION_PROMPT_TEMPLATE
        .replace("{jd_text}", jd)
        .replace("{resume_text}", resume_excerpt)
}
