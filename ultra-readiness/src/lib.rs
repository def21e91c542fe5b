//! Readiness Gate: pure, synchronous pre-flight decision on whether a
//! request's selected models can be admitted.
//!
//! `evaluate` is a pure function of its three inputs — no I/O, no
//! locking, never blocks — so it is deterministic and trivially testable
//! in isolation, matching the "Gate purity" invariant.

use std::collections::HashMap;

use serde::Serialize;
use time::OffsetDateTime;
use ultra_core::{HealthStatus, ProviderHealth, ProviderKind};
use ultra_registry::Registry;

/// One structured reason the gate recorded, either for a specific model
/// or (when `model` is `None`) for the overall decision.
#[derive(Debug, Clone, Serialize)]
pub struct ReasonEntry {
    pub model: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelAvailability {
    pub available: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadinessSnapshot {
    pub ready: bool,
    pub reasons: Vec<ReasonEntry>,
    pub per_model: HashMap<String, ModelAvailability>,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
}

/// Evaluate whether `selected_models` can be admitted, given the current
/// provider health snapshot and the model registry.
#[must_use]
pub fn evaluate(
    selected_models: &[String],
    health: &HashMap<ProviderKind, ProviderHealth>,
    registry: &Registry,
) -> ReadinessSnapshot {
    let mut per_model = HashMap::with_capacity(selected_models.len());
    let mut reasons = Vec::new();
    let mut available_count = 0usize;

    for model_id in selected_models {
        let availability = match registry.resolve(model_id) {
            None => {
                reasons.push(ReasonEntry { model: Some(model_id.clone()), reason: "unknown_model".to_owned() });
                ModelAvailability { available: false, reason: Some("unknown_model".to_owned()) }
            }
            Some(descriptor) => match health.get(&descriptor.provider) {
                Some(h) if h.status.is_available() => {
                    available_count += 1;
                    let reason = (h.status == HealthStatus::Degraded).then(|| "degraded".to_owned());
                    ModelAvailability { available: true, reason }
                }
                Some(h) => {
                    let reason = if h.detail.as_deref() == Some("not_yet_probed") {
                        "not_yet_probed"
                    } else {
                        "provider_unavailable"
                    };
                    reasons.push(ReasonEntry { model: Some(model_id.clone()), reason: reason.to_owned() });
                    ModelAvailability { available: false, reason: Some(reason.to_owned()) }
                }
                None => {
                    reasons.push(ReasonEntry { model: Some(model_id.clone()), reason: "not_yet_probed".to_owned() });
                    ModelAvailability { available: false, reason: Some("not_yet_probed".to_owned()) }
                }
            },
        };
        per_model.insert(model_id.clone(), availability);
    }

    let ready = available_count > 0;
    if !ready {
        reasons.push(ReasonEntry { model: None, reason: "no_available_models".to_owned() });
    }

    ReadinessSnapshot { ready, reasons, per_model, generated_at: OffsetDateTime::now_utc() }
}
