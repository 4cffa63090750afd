//! LLM extraction strategy — structured field extraction plus a JD fit score
//! from a single model call. Any failure here is recoverable: the caller falls
//! through to the regex heuristic.

use async_trait::async_trait;
use serde_json::Value;

use crate::llm_client::prompts::{extraction_prompt, EXTRACTION_SYSTEM};
use crate::llm_client::LlmClient;
use crate::models::candidate::CandidateProfile;
use crate::scoring::{ProfileStrategy, ScoreError};

pub struct LlmStrategy {
    client: LlmClient,
    /// Maximum resume characters included in the prompt.
    prompt_limit: usize,
}

impl LlmStrategy {
    pub fn new(client: LlmClient, prompt_limit: usize) -> Self {
        Self {
            client,
            prompt_limit,
        }
    }
}

#[async_trait]
impl ProfileStrategy for LlmStrategy {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn extract(&self, text: &str, jd: &str) -> Result<CandidateProfile, ScoreError> {
        let excerpt: String = text.chars().take(self.prompt_limit).collect();
        let prompt = extraction_prompt(jd, &excerpt);

        let raw: Value = self.client.call_json(&prompt, EXTRACTION_SYSTEM).await?;
        profile_from_value(&raw)
    }
}

/// Lenient mapping from the model's JSON object to a profile. Models drift on
/// field types (numbers as strings, skills as arrays, "Match %" instead of
/// "Match"), so each field is coerced rather than strictly deserialized.
pub fn profile_from_value(value: &Value) -> Result<CandidateProfile, ScoreError> {
    if !value.is_object() {
        return Err(ScoreError::InvalidResponse(
            "expected a JSON object".to_string(),
        ));
    }

    let match_score = value
        .get("Match")
        .or_else(|| value.get("Match %"))
        .map(coerce_score)
        .unwrap_or(0);

    Ok(CandidateProfile {
        name: string_field(value, "Name"),
        email: string_field(value, "Email"),
        phone: string_field(value, "Phone"),
        experience: string_field(value, "Experience"),
        skills: skills_field(value),
        match_score,
    })
}

fn string_field(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "N/A".to_string(),
    }
}

fn skills_field(value: &Value) -> String {
    match value.get("Skills") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Array(items)) => {
            let joined = items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            if joined.is_empty() {
                "N/A".to_string()
            } else {
                joined
            }
        }
        _ => "N/A".to_string(),
    }
}

/// Coerces a score value (integer, float, or numeric string) into 0–100.
fn coerce_score(value: &Value) -> u8 {
    let score = value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.round() as i64))
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<i64>().ok()))
        .unwrap_or(0);
    score.clamp(0, 100) as u8
}
