pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::scan::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Scan API
        .route("/api/v1/scans", post(handlers::handle_create_scan))
        .route(
            "/api/v1/scans/:id/export.csv",
            get(handlers::handle_export_csv),
        )
        .route(
            "/api/v1/scans/:id/attachments/:index",
            get(handlers::handle_download_attachment),
        )
        .with_state(state)
}
