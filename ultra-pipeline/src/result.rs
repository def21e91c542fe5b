use std::collections::{HashMap, HashSet};

use serde::Serialize;
use time::OffsetDateTime;
use ultra_core::ModelOutput;

/// One of the three phases of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Initial,
    Meta,
    Ultra,
}

impl Stage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Meta => "meta",
            Self::Ultra => "ultra",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything produced by fanning out to one or more models within one
/// stage: every attempt's output, and (for Meta/Ultra) the fused text.
#[derive(Debug, Clone, Serialize)]
pub struct StageResult {
    pub stage: Stage,
    pub per_model_outputs: HashMap<String, ModelOutput>,
    /// Set for Meta (the synthesizer isn't chosen yet, this stage has no
    /// single aggregate) — actually unset for Meta, set for Ultra on
    /// success. Unset for Initial: the per-model collection is the
    /// artifact there.
    pub aggregate_text: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub ended_at: OffsetDateTime,
}

impl StageResult {
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.per_model_outputs.values().filter(|o| o.is_success()).count()
    }

    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.per_model_outputs.len() - self.success_count()
    }

    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        (self.ended_at - self.started_at).whole_milliseconds().try_into().unwrap_or(i64::MAX)
    }
}

/// Why the pipeline did not reach `DONE`. Never constructed for
/// adapter-level failures — those stay inside `ModelOutput`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineFailureReason {
    InitialAllFailed,
    SynthesisFailed,
    DeadlineExceeded,
}

impl PipelineFailureReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InitialAllFailed => "initial_all_failed",
            Self::SynthesisFailed => "synthesis_failed",
            Self::DeadlineExceeded => "deadline_exceeded",
        }
    }
}

/// Terminal outcome of one pipeline execution.
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    Success,
    Failed(PipelineFailureReason),
}

/// The full record of one pipeline execution, assembled from its stage
/// results. Owned exclusively by the execution that produced it; returned
/// to the caller and then discarded.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub correlation_id: String,
    pub outcome: PipelineOutcome,
    pub initial: StageResult,
    pub meta: Option<StageResult>,
    pub ultra: Option<StageResult>,
    pub succeeded_models: HashSet<String>,
    pub failed_models: HashMap<String, String>,
}

impl PipelineResult {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.outcome, PipelineOutcome::Success)
    }
}
