/// LLM Client — the single point of entry for all LLM API calls.
///
/// ARCHITECTURAL RULE: No other module may call a model provider directly.
/// All LLM interactions MUST go through this module.
///
/// Three providers are supported behind one client; the provider and key are
/// chosen per scan request, so a client is constructed per run rather than at
/// startup.
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Models are intentionally hardcoded per provider to prevent drift.
const ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-20241022";
const OPENAI_MODEL: &str = "gpt-4o-mini";
const GEMINI_MODEL: &str = "gemini-2.5-flash";

const MAX_TOKENS: u32 = 1000;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// The model provider backing an `LlmClient`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Anthropic,
    Openai,
    Gemini,
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LlmProvider::Anthropic => "anthropic",
            LlmProvider::Openai => "openai",
            LlmProvider::Gemini => "gemini",
        };
        f.write_str(name)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Provider response shapes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// Wraps the three structured-extraction providers with retry logic and
/// lenient JSON output handling.
#[derive(Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    provider: LlmProvider,
    api_key: String,
}

impl LlmClient {
    pub fn new(provider: LlmProvider, api_key: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            provider,
            api_key,
        }
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    /// Makes a raw call to the configured provider, returning the response text.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self.build_request(prompt, system).send().await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("{} API returned {}: {}", self.provider, status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ProviderError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let body = response.text().await?;
            let text = extract_text(self.provider, &body)?;

            debug!("{} call succeeded ({} chars)", self.provider, text.len());
            return Ok(text);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    /// Convenience method that calls the LLM and deserializes the text response as JSON.
    /// The prompt must instruct the model to return valid JSON.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
    ) -> Result<T, LlmError> {
        let text = self.call(prompt, system).await?;

        // Strip markdown code fences if the model wraps JSON in them
        let text = strip_json_fences(&text);

        serde_json::from_str(text).map_err(LlmError::Parse)
    }

    fn build_request(&self, prompt: &str, system: &str) -> reqwest::RequestBuilder {
        match self.provider {
            LlmProvider::Anthropic => self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&serde_json::json!({
                    "model": ANTHROPIC_MODEL,
                    "max_tokens": MAX_TOKENS,
                    "temperature": 0,
                    "system": system,
                    "messages": [{"role": "user", "content": prompt}],
                })),
            LlmProvider::Openai => self
                .client
                .post(OPENAI_API_URL)
                .bearer_auth(&self.api_key)
                .json(&serde_json::json!({
                    "model": OPENAI_MODEL,
                    "response_format": {"type": "json_object"},
                    "messages": [
                        {"role": "system", "content": system},
                        {"role": "user", "content": prompt},
                    ],
                })),
            LlmProvider::Gemini => self
                .client
                .post(format!(
                    "{GEMINI_API_BASE}/{GEMINI_MODEL}:generateContent"
                ))
                .query(&[("key", self.api_key.as_str())])
                .json(&serde_json::json!({
                    "system_instruction": {"parts": [{"text": system}]},
                    "contents": [{"parts": [{"text": prompt}]}],
                    "generationConfig": {
                        "response_mime_type": "application/json",
                        "temperature": 0,
                    },
                })),
        }
    }
}

/// Pulls the generated text out of a provider-specific response body.
fn extract_text(provider: LlmProvider, body: &str) -> Result<String, LlmError> {
    let text = match provider {
        LlmProvider::Anthropic => {
            let parsed: AnthropicResponse = serde_json::from_str(body)?;
            parsed
                .content
                .into_iter()
                .find(|b| b.block_type == "text")
                .and_then(|b| b.text)
        }
        LlmProvider::Openai => {
            let parsed: OpenAiResponse = serde_json::from_str(body)?;
            parsed.choices.into_iter().next().and_then(|c| c.message.content)
        }
        LlmProvider::Gemini => {
            let parsed: GeminiResponse = serde_json::from_str(body)?;
            parsed
                .candidates
                .into_iter()
                .next()
                .and_then(|c| c.content.parts.into_iter().next())
                .and_then(|p| p.text)
        }
    };

    match text {
        Some(t) if !t.trim().is_empty() => Ok(t),
        _ => Err(LlmError::EmptyContent),
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_extract_text_anthropic() {
        let body = r#"{"content": [{"type": "text", "text": "{\"Name\": \"Jane\"}"}]}"#;
        let text = extract_text(LlmProvider::Anthropic, body).unwrap();
        assert!(text.contains("Jane"));
    }

    #[test]
    fn test_extract_text_openai() {
        let body = r#"{"choices": [{"message": {"content": "{\"Match\": 80}"}}]}"#;
        let text = extract_text(LlmProvider::Openai, body).unwrap();
        assert!(text.contains("80"));
    }

    #[test]
    fn test_extract_text_gemini() {
        let body = r#"{"candidates": [{"content": {"parts": [{"text": "{}"}]}}]}"#;
        assert_eq!(extract_text(LlmProvider::Gemini, body).unwrap(), "{}");
    }

    #[test]
    fn test_extract_text_empty_is_error() {
        let body = r#"{"content": [{"type": "text", "text": "  "}]}"#;
        assert!(matches!(
            extract_text(LlmProvider::Anthropic, body),
            Err(LlmError::EmptyContent)
        ));
    }

    #[test]
    fn test_provider_serde_labels() {
        assert_eq!(
            serde_json::from_str::<LlmProvider>(r#""anthropic""#).unwrap(),
            LlmProvider::Anthropic
        );
        assert_eq!(
            serde_json::from_str::<LlmProvider>(r#""openai""#).unwrap(),
            LlmProvider::Openai
        );
        assert_eq!(
            serde_json::from_str::<LlmProvider>(r#""gemini""#).unwrap(),
            LlmProvider::Gemini
        );
    }
}
