//! Shared application state injected into all Axum handlers.

use std::path::PathBuf;
use std::sync::Arc;

use crate::persistence::IdentityDirectory;
use crate::service::OfflineLogService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Offline log service for ingestion and browsing.
    pub log_service: Arc<OfflineLogService>,
    /// Host directory resolving bearer tokens to callers.
    pub directory: Arc<dyn IdentityDirectory>,
    /// Directory the service worker script is served from.
    pub static_dir: Arc<PathBuf>,
}
