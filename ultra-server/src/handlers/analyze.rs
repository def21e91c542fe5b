use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde_json::Value;

use ultra_pipeline::{Engine, PipelineDeps, PipelineFailureReason, PipelineOutcome, PipelineRequest};

use crate::error::{ServerError, error_response};
use crate::request::AnalyzeRequestWire;
use crate::response::analyze_body;
use crate::state::AppState;

/// `POST /api/orchestrator/analyze` — run one pipeline execution to
/// completion and return the full result.
///
/// The execution itself runs in a detached task so that the streaming
/// endpoint (a separate consumer of the same `correlation_id`) is never
/// starved by this request's lifetime, and vice versa: a client
/// disconnecting from this request does not cancel the pipeline.
pub async fn analyze(State(state): State<AppState>, Json(wire): Json<AnalyzeRequestWire>) -> Response {
    let correlation_id = wire.correlation_id.clone().unwrap_or_else(ultra_core::ids::new_correlation_id);

    if let Err(validation_error) = wire.validate(state.pipeline_config.max_selected_models) {
        return error_response(&correlation_id, &validation_error, validation_error.detail());
    }

    let health = state.health.snapshot();
    let readiness = ultra_readiness::evaluate(&wire.selected_models, &health, &state.registry);

    if !readiness.ready {
        let not_ready = ServerError::NotReady(readiness.clone());
        return error_response(&correlation_id, &not_ready, not_ready.detail());
    }

    let admitted: Vec<String> =
        wire.selected_models.iter().filter(|id| readiness.per_model.get(id.as_str()).is_some_and(|a| a.available)).cloned().collect();

    let request = PipelineRequest {
        prompt: wire.prompt.clone(),
        selected_models: admitted.clone(),
        include_initial: wire.include_initial_responses,
        include_meta: wire.include_meta_responses,
        correlation_id: correlation_id.clone(),
    };

    let deps = PipelineDeps {
        registry: Arc::clone(&state.registry),
        providers: (*state.providers).clone(),
        health,
        progress: Arc::clone(&state.progress),
        config: state.pipeline_config.clone(),
    };

    let handle = tokio::spawn(async move { Engine::run(&request, admitted, &deps).await });

    let result = match handle.await {
        Ok(result) => result,
        Err(join_error) => {
            let incident_id = ultra_core::ids::new_correlation_id();
            tracing::error!(%correlation_id, incident_id, %join_error, "pipeline task panicked");
            let internal = ServerError::Internal(incident_id);
            return error_response(&correlation_id, &internal, Value::Null);
        }
    };

    let status = match result.outcome {
        PipelineOutcome::Success | PipelineOutcome::Failed(PipelineFailureReason::InitialAllFailed) => StatusCode::OK,
        PipelineOutcome::Failed(PipelineFailureReason::SynthesisFailed) => StatusCode::BAD_GATEWAY,
        PipelineOutcome::Failed(PipelineFailureReason::DeadlineExceeded) => StatusCode::GATEWAY_TIMEOUT,
    };

    let body = analyze_body(&result, wire.include_initial_responses, wire.include_meta_responses);
    (status, Json(body)).into_response()
}
