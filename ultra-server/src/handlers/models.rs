use axum::Json;
use axum::extract::State;
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use ultra_core::HealthStatus;

use crate::state::AppState;

#[derive(Debug, Serialize)]
struct ModelEntry {
    id: String,
    provider: String,
    status: HealthStatus,
}

/// `GET /api/orchestrator/models` — every registered model alongside its
/// provider's current health status.
pub async fn models(State(state): State<AppState>) -> Json<Value> {
    let health = state.health.snapshot();

    let mut entries: Vec<ModelEntry> = state
        .registry
        .all()
        .into_iter()
        .map(|descriptor| {
            let status = health.get(&descriptor.provider).map_or(HealthStatus::Unavailable, |h| h.status);
            ModelEntry { id: descriptor.id.clone(), provider: descriptor.provider.to_string(), status }
        })
        .collect();
    entries.sort_by(|a, b| a.id.cmp(&b.id));

    Json(serde_json::json!({
        "models": entries,
        "generated_at": OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339).unwrap_or_default(),
    }))
}
