use anyhow::{ensure, Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable has a default — the service boots with zero environment.
/// Mail credentials and LLM keys are NOT config: they arrive per scan request
/// and are never persisted.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// IMAP host used by the Gmail source.
    pub imap_host: String,
    /// Scores strictly above this bucket as "Interview".
    pub interview_threshold: u8,
    /// Scores at or above this (and not above interview) bucket as "Hold".
    pub hold_threshold: u8,
    /// Minimum extracted-text length for an attachment to count as a resume.
    pub min_text_len: usize,
    /// Bounded worker pool size for extraction + scoring.
    pub scan_concurrency: usize,
    /// Maximum number of resume characters included in the LLM prompt.
    pub resume_prompt_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let config = Config {
            port: env_parse("PORT", 8080_u16)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            imap_host: std::env::var("IMAP_HOST").unwrap_or_else(|_| "imap.gmail.com".to_string()),
            interview_threshold: env_parse("INTERVIEW_THRESHOLD", 50_u8)?,
            hold_threshold: env_parse("HOLD_THRESHOLD", 30_u8)?,
            min_text_len: env_parse("MIN_TEXT_LEN", 20_usize)?,
            scan_concurrency: env_parse("SCAN_CONCURRENCY", 4_usize)?,
            resume_prompt_limit: env_parse("RESUME_PROMPT_LIMIT", 6000_usize)?,
        };

        ensure!(
            config.hold_threshold <= config.interview_threshold,
            "HOLD_THRESHOLD ({}) must not exceed INTERVIEW_THRESHOLD ({})",
            config.hold_threshold,
            config.interview_threshold
        );
        ensure!(
            config.scan_concurrency > 0,
            "SCAN_CONCURRENCY must be at least 1"
        );

        Ok(config)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("'{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
