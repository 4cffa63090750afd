//! Candidate Scorer — ordered, pluggable extraction strategies plus the
//! TF-IDF similarity scorer used when no LLM key is supplied.
//!
//! The fallback chain is explicit: strategies are tried in order until one
//! succeeds, and the regex heuristic is the guaranteed tail. This replaces the
//! implicit exception-driven fallback of the legacy scripts.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm_client::LlmError;
use crate::models::candidate::CandidateProfile;

pub mod heuristic;
pub mod llm;
pub mod tfidf;

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("invalid extraction response: {0}")]
    InvalidResponse(String),
}

/// One way of turning resume text (plus the JD) into a candidate profile.
/// Strategies are carried as `Box<dyn ProfileStrategy>` in the scan context
/// and tried in order.
#[async_trait]
pub trait ProfileStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn extract(&self, text: &str, jd: &str) -> Result<CandidateProfile, ScoreError>;
}

/// Runs the strategies in order, returning the first success. Failures are
/// logged and never propagate — the regex heuristic is the unconditional
/// fallback, so every candidate gets a profile.
pub async fn run_strategies(
    strategies: &[Box<dyn ProfileStrategy>],
    text: &str,
    jd: &str,
) -> CandidateProfile {
    for strategy in strategies {
        match strategy.extract(text, jd).await {
            Ok(profile) => {
                debug!("Profile extracted via {} strategy", strategy.name());
                return profile;
            }
            Err(e) => {
                warn!("{} extraction failed, trying next strategy: {e}", strategy.name());
            }
        }
    }
    heuristic::extract_profile(text)
}

/// The regex heuristic as a strategy, for use as the tail of the chain.
pub struct HeuristicStrategy;

#[async_trait]
impl ProfileStrategy for HeuristicStrategy {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn extract(&self, text: &str, _jd: &str) -> Result<CandidateProfile, ScoreError> {
        Ok(heuristic::extract_profile(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingStrategy;

    #[async_trait]
    impl ProfileStrategy for FailingStrategy {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn extract(&self, _text: &str, _jd: &str) -> Result<CandidateProfile, ScoreError> {
            Err(ScoreError::InvalidResponse("boom".to_string()))
        }
    }

    #[tokio::test]
    async fn test_failed_strategy_falls_back_to_heuristic() {
        let strategies: Vec<Box<dyn ProfileStrategy>> =
            vec![Box::new(FailingStrategy), Box::new(HeuristicStrategy)];
        let profile = run_strategies(&strategies, "Contact: jane@example.com", "").await;
        assert_eq!(profile.email, "jane@example.com");
    }

    #[tokio::test]
    async fn test_empty_strategy_list_still_produces_profile() {
        let profile = run_strategies(&[], "Contact: jane@example.com", "").await;
        assert_eq!(profile.email, "jane@example.com");
        assert_eq!(profile.match_score, 0);
    }
}
