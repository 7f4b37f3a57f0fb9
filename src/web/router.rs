//! Router configuration for the guide service.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use super::handlers::{artifact, health, index, AppState};

/// Create the service router.
///
/// The artifact route is derived from the configured filename so the
/// published guide is reachable at `/<artifact_filename>`.
pub fn create_router(app_state: Arc<AppState>, artifact_filename: &str) -> Router {
    let artifact_path = format!("/{}", artifact_filename);

    Router::new()
        .route("/", get(index))
        .route(&artifact_path, get(artifact))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
