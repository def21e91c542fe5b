mod analyze;
pub(crate) mod health;
mod models;
mod readiness;
mod stream;

use axum::Router;
use axum::routing::{get, post};

use crate::state::AppState;

/// Assemble the four orchestration routes. The liveness check is added
/// separately by [`crate::Server::new`], since it is the one route whose
/// presence is configuration-gated.
#[must_use]
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orchestrator/analyze", post(analyze::analyze))
        .route("/api/orchestrator/stream", get(stream::stream))
        .route("/api/orchestrator/models", get(models::models))
        .route("/api/orchestrator/readiness", get(readiness::readiness))
}
