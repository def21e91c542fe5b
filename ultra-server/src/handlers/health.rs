use axum::response::IntoResponse;
use http::StatusCode;

/// Trivial liveness check — always `200 ok` once the process is serving
/// requests at all. Readiness (whether a specific request can be
/// admitted) is a separate, request-shaped question answered by
/// `/api/orchestrator/readiness`.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
