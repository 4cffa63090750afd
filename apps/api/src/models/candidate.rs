//! Candidate records produced by a scan. Transient — rebuilt every run, never persisted.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured fields pulled from one resume, by whichever extraction strategy
/// succeeded. Fields the strategy could not determine hold `"N/A"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub experience: String,
    pub skills: String,
    /// JD fit, 0–100.
    pub match_score: u8,
}

impl Default for CandidateProfile {
    fn default() -> Self {
        Self {
            name: "Candidate".to_string(),
            email: "N/A".to_string(),
            phone: "N/A".to_string(),
            experience: "N/A".to_string(),
            skills: "N/A".to_string(),
            match_score: 0,
        }
    }
}

/// Display bucket derived from the match score. Thresholds are configuration,
/// not canon — they differed across the legacy variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Interview,
    Hold,
    Reject,
}

impl Verdict {
    /// Strictly above `interview` → Interview; at or above `hold` → Hold; else Reject.
    pub fn from_score(score: u8, interview: u8, hold: u8) -> Self {
        if score > interview {
            Verdict::Interview
        } else if score >= hold {
            Verdict::Hold
        } else {
            Verdict::Reject
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Verdict::Interview => "Interview",
            Verdict::Hold => "Hold",
            Verdict::Reject => "Reject",
        };
        f.write_str(label)
    }
}

/// One ranked candidate: extracted profile plus the original attachment so the
/// export endpoints can serve the exact bytes back.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub profile: CandidateProfile,
    pub verdict: Verdict,
    pub source_filename: String,
    pub bytes: Bytes,
    pub extracted_text: String,
    pub received: Option<DateTime<Utc>>,
}
