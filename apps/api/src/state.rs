use crate::config::Config;
use crate::scan::store::ScanStore;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Deliberately thin: scans are request-scoped pipelines and carry their own
/// context object, so the only cross-request state is the ephemeral scan store
/// backing the export endpoints.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Shared HTTP client for Graph API calls.
    pub http: reqwest::Client,
    /// In-memory results of completed scans. Discarded on restart.
    pub scans: ScanStore,
}
