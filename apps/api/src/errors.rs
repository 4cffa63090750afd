use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::harvest::HarvestError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Mapping from the failure taxonomy: auth failures and missing Graph
/// authentication surface as `Auth`; provider query/transport failures as
/// `Provider`. Empty result sets are NOT errors — they come back as a
/// non-error scan status. Extraction and per-candidate LLM failures never
/// reach this type; they fail soft inside the pipeline.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Mail provider error: {0}")]
    Provider(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<HarvestError> for AppError {
    fn from(err: HarvestError) -> Self {
        match err {
            HarvestError::Auth(msg) => AppError::Auth(msg),
            HarvestError::NotAuthenticated => {
                AppError::Auth("Not authenticated with the mail provider".to_string())
            }
            HarvestError::Provider(msg) => AppError::Provider(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, "AUTH_FAILED", msg.clone()),
            AppError::Provider(msg) => {
                tracing::error!("Provider error: {msg}");
                (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", msg.clone())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
