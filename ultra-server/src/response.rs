use std::collections::HashMap;

use serde_json::{Value, json};
use ultra_core::HttpError;
use ultra_pipeline::{PipelineError, PipelineOutcome, PipelineResult, StageResult};

fn successful_texts(stage: &StageResult) -> HashMap<String, String> {
    stage.per_model_outputs.iter().filter(|(_, o)| o.is_success()).map(|(id, o)| (id.clone(), o.text.clone())).collect()
}

fn total_duration_ms(result: &PipelineResult) -> i64 {
    let start = result.initial.started_at;
    let end = result
        .ultra
        .as_ref()
        .map(|s| s.ended_at)
        .or_else(|| result.meta.as_ref().map(|s| s.ended_at))
        .unwrap_or(result.initial.ended_at);
    (end - start).whole_milliseconds().try_into().unwrap_or(i64::MAX)
}

fn timings(result: &PipelineResult) -> Value {
    json!({
        "initial": result.initial.duration_ms(),
        "meta": result.meta.as_ref().map(StageResult::duration_ms),
        "ultra": result.ultra.as_ref().map(StageResult::duration_ms),
        "total": total_duration_ms(result),
    })
}

/// Build the full `POST /api/orchestrator/analyze` response body for a
/// completed pipeline execution.
///
/// On failure the body still carries `succeeded_models`/`failed_models`
/// and (when the respective `include_*` flag is set) any responses that
/// did succeed before the pipeline gave up — the "best-effort partial
/// artifacts" behavior §7 requires.
#[must_use]
pub fn analyze_body(result: &PipelineResult, include_initial: bool, include_meta: bool) -> Value {
    let mut body = json!({
        "correlation_id": result.correlation_id,
        "succeeded_models": sorted_vec(&result.succeeded_models),
        "failed_models": result.failed_models,
        "timings_ms": timings(result),
    });

    match &result.outcome {
        PipelineOutcome::Success => {
            let ultra_response = result.ultra.as_ref().and_then(|s| s.aggregate_text.clone()).unwrap_or_default();
            body["status"] = json!("success");
            body["ultra_response"] = json!(ultra_response);
        }
        PipelineOutcome::Failed(reason) => {
            let error: PipelineError = (*reason).into();
            body["status"] = json!("error");
            body["error"] = json!({
                "code": error.error_type(),
                "message": error.client_message(),
                "detail": Value::Null,
            });
        }
    }

    if include_initial {
        body["initial_responses"] = json!(successful_texts(&result.initial));
    }
    if include_meta {
        body["meta_responses"] = result.meta.as_ref().map_or(Value::Null, |stage| json!(successful_texts(stage)));
    }

    body
}

fn sorted_vec(ids: &std::collections::HashSet<String>) -> Vec<String> {
    let mut ids: Vec<String> = ids.iter().cloned().collect();
    ids.sort();
    ids
}
