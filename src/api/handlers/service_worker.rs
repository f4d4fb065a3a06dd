//! Service worker delivery.
//!
//! Browsers only let a worker control URLs under its own path unless the
//! response carries `Service-Worker-Allowed`. The script is served from
//! the site root with that header set to `/`.

use axum::Router;
use axum::extract::State;
use axum::http::HeaderName;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::get;

use crate::app_state::AppState;
use crate::error::GatewayError;

/// File name of the bundled worker inside the static directory.
pub const SERVICE_WORKER_FILE: &str = "pos_sw.js";

/// Header widening the scope a service worker may claim.
pub const SERVICE_WORKER_ALLOWED: HeaderName = HeaderName::from_static("service-worker-allowed");

/// `Cache-Control` value sent with the worker script.
pub const SERVICE_WORKER_CACHE_CONTROL: &str = "public, max-age=3600";

/// `GET /pos_sw.js` — Serve the POS service worker script.
#[utoipa::path(
    get,
    path = "/pos_sw.js",
    tag = "Static",
    summary = "POS service worker",
    description = "Returns the bundled service worker with `Service-Worker-Allowed: /` so it may control the whole origin.",
    responses(
        (status = 200, description = "Service worker script", content_type = "application/javascript", body = String),
        (status = 404, description = "Script not bundled"),
    )
)]
pub async fn service_worker_handler(State(state): State<AppState>) -> Response {
    let path = state.static_dir.join(SERVICE_WORKER_FILE);

    match tokio::fs::read_to_string(&path).await {
        Ok(content) => (
            [
                (CONTENT_TYPE, "application/javascript"),
                (SERVICE_WORKER_ALLOWED, "/"),
                (CACHE_CONTROL, SERVICE_WORKER_CACHE_CONTROL),
            ],
            content,
        )
            .into_response(),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "service worker script not found");
            GatewayError::NotFound(SERVICE_WORKER_FILE.to_string()).into_response()
        }
        Err(err) => {
            tracing::error!(
                path = %path.display(),
                error = %err,
                "failed to read service worker script"
            );
            GatewayError::Internal(format!("cannot read {SERVICE_WORKER_FILE}")).into_response()
        }
    }
}

/// Static routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new().route("/pos_sw.js", get(service_worker_handler))
}
