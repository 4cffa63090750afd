//! Axum route handlers for the Scan API.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::harvest::graph::GraphSource;
use crate::harvest::imap::ImapSource;
use crate::harvest::{MailSource, TimeWindow, WindowUnit};
use crate::llm_client::{LlmClient, LlmProvider};
use crate::models::candidate::{Candidate, Verdict};
use crate::scan::export::{candidates_to_csv, export_filename};
use crate::scan::pipeline::{run_scan, ScanContext};
use crate::scoring::llm::LlmStrategy;
use crate::scoring::{HeuristicStrategy, ProfileStrategy};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub provider: ProviderConfig,
    pub window: WindowConfig,
    #[serde(default)]
    pub job_description: String,
    pub llm: Option<LlmConfig>,
}

/// Mail provider credentials, supplied per run and never persisted.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    Imap {
        email: String,
        app_password: String,
    },
    Graph {
        access_token: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WindowConfig {
    Relative { amount: u32, unit: WindowUnit },
    Range { start: NaiveDate, end: NaiveDate },
}

impl WindowConfig {
    fn to_window(&self) -> Result<TimeWindow, AppError> {
        match self {
            WindowConfig::Relative { amount: 0, .. } => Err(AppError::Validation(
                "window amount must be at least 1".to_string(),
            )),
            WindowConfig::Relative { amount, unit } => Ok(TimeWindow::last(*amount, *unit)),
            WindowConfig::Range { start, end } => {
                if start > end {
                    return Err(AppError::Validation(
                        "window start must not be after window end".to_string(),
                    ));
                }
                Ok(TimeWindow::range(*start, *end))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub scan_id: Uuid,
    pub status: String,
    /// Attachments the provider returned, before extraction filtering.
    pub harvested: usize,
    pub candidates: Vec<CandidateSummary>,
}

/// One ranked candidate, without the raw attachment bytes (those are served by
/// the download endpoint).
#[derive(Debug, Serialize)]
pub struct CandidateSummary {
    /// Position in the ranked list; doubles as the attachment download index.
    pub index: usize,
    pub match_score: u8,
    pub verdict: Verdict,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub experience: String,
    pub skills: String,
    pub filename: String,
}

impl CandidateSummary {
    fn from_candidate(index: usize, candidate: &Candidate) -> Self {
        let profile = &candidate.profile;
        Self {
            index,
            match_score: profile.match_score,
            verdict: candidate.verdict,
            name: profile.name.clone(),
            phone: profile.phone.clone(),
            email: profile.email.clone(),
            experience: profile.experience.clone(),
            skills: profile.skills.clone(),
            filename: candidate.source_filename.clone(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/scans
///
/// Runs the full pipeline: harvest → extract → score → rank. Synchronous —
/// the response carries the ranked candidates. Results are kept in memory so
/// the export endpoints can serve them until the process restarts.
pub async fn handle_create_scan(
    State(state): State<AppState>,
    Json(request): Json<ScanRequest>,
) -> Result<Json<ScanResponse>, AppError> {
    let window = request.window.to_window()?;

    let source: Box<dyn MailSource> = match request.provider {
        ProviderConfig::Imap {
            email,
            app_password,
        } => {
            if email.trim().is_empty() || app_password.trim().is_empty() {
                return Err(AppError::Validation(
                    "email and app_password are required for the IMAP provider".to_string(),
                ));
            }
            Box::new(ImapSource::new(
                state.config.imap_host.clone(),
                email,
                app_password,
            ))
        }
        ProviderConfig::Graph { access_token } => {
            Box::new(GraphSource::new(state.http.clone(), access_token))
        }
    };

    // An LLM config with a blank key means "no LLM" — same as omitting it.
    let llm = request.llm.filter(|c| {
        if c.api_key.trim().is_empty() {
            warn!("Ignoring {} config with empty API key", c.provider);
            return false;
        }
        true
    });

    let mut strategies: Vec<Box<dyn ProfileStrategy>> = Vec::new();
    let use_tfidf = llm.is_none();
    if let Some(llm) = llm {
        strategies.push(Box::new(LlmStrategy::new(
            LlmClient::new(llm.provider, llm.api_key),
            state.config.resume_prompt_limit,
        )));
    }
    strategies.push(Box::new(HeuristicStrategy));

    let ctx = Arc::new(ScanContext {
        window,
        job_description: request.job_description,
        strategies,
        use_tfidf,
        min_text_len: state.config.min_text_len,
        concurrency: state.config.scan_concurrency,
        interview_threshold: state.config.interview_threshold,
        hold_threshold: state.config.hold_threshold,
    });

    let outcome = run_scan(ctx, source.as_ref()).await?;

    let candidates = outcome
        .candidates
        .iter()
        .enumerate()
        .map(|(index, c)| CandidateSummary::from_candidate(index, c))
        .collect();
    let scan_id = state.scans.insert(outcome.candidates).await;

    Ok(Json(ScanResponse {
        scan_id,
        status: outcome.status.message(),
        harvested: outcome.harvested,
        candidates,
    }))
}

/// GET /api/v1/scans/:id/export.csv
///
/// Downloads the ranked list as CSV with the legacy column layout.
pub async fn handle_export_csv(
    State(state): State<AppState>,
    Path(scan_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let scan = state
        .scans
        .get(scan_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Scan {scan_id} not found")))?;

    let csv = candidates_to_csv(&scan.candidates)?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_filename(Utc::now().date_naive())
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

/// GET /api/v1/scans/:id/attachments/:index
///
/// Serves the original attachment bytes, byte-for-byte, under the original
/// filename.
pub async fn handle_download_attachment(
    State(state): State<AppState>,
    Path((scan_id, index)): Path<(Uuid, usize)>,
) -> Result<impl IntoResponse, AppError> {
    let scan = state
        .scans
        .get(scan_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Scan {scan_id} not found")))?;

    let candidate = scan.candidates.get(index).ok_or_else(|| {
        AppError::NotFound(format!("Scan {scan_id} has no candidate {index}"))
    })?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/octet-stream".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", candidate.source_filename),
            ),
        ],
        candidate.bytes.clone(),
    ))
}
