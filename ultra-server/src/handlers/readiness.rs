use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use ultra_readiness::ReadinessSnapshot;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReadinessQuery {
    models: String,
}

/// `GET /api/orchestrator/readiness?models=a,b,c` — aggregate readiness
/// for a hypothetical request, without running one.
pub async fn readiness(State(state): State<AppState>, Query(query): Query<ReadinessQuery>) -> Json<ReadinessSnapshot> {
    let selected_models: Vec<String> = query.models.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned).collect();

    let health = state.health.snapshot();
    let snapshot = ultra_readiness::evaluate(&selected_models, &health, &state.registry);
    Json(snapshot)
}
