//! HTTP handlers for the guide service.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::store::GuideStore;

/// Body served at the root path.
pub const INDEX_TEXT: &str = "EPG Merge Service is running!";

/// Body served while no guide has been published yet.
pub const NOT_READY_TEXT: &str = "EPG not available yet. Try again in a few seconds.";

/// Content type of the published artifact.
pub const ARTIFACT_CONTENT_TYPE: &str = "application/gzip";

/// Shared application state.
pub struct AppState {
    /// Published guide store.
    pub store: Arc<GuideStore>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(store: Arc<GuideStore>) -> Self {
        Self { store }
    }
}

/// Root handler. Plain status text so the service is easy to probe.
pub async fn index() -> &'static str {
    INDEX_TEXT
}

/// Health check handler.
pub async fn health() -> &'static str {
    "OK"
}

/// Serve the current guide artifact.
///
/// Returns the compressed bytes exactly as published, or 503 with a plain
/// text body while no artifact exists yet.
pub async fn artifact(State(state): State<Arc<AppState>>) -> Response {
    match state.store.current() {
        Some(guide) => {
            let last_modified = guide
                .produced_at
                .format("%a, %d %b %Y %H:%M:%S GMT")
                .to_string();
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, ARTIFACT_CONTENT_TYPE.to_string()),
                    (header::LAST_MODIFIED, last_modified),
                ],
                guide.bytes.clone(),
            )
                .into_response()
        }
        None => (StatusCode::SERVICE_UNAVAILABLE, NOT_READY_TEXT).into_response(),
    }
}
