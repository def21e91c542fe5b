use serde::Serialize;
use time::OffsetDateTime;

/// The lifecycle event a `ProgressEvent` carries, adjacently tagged as
/// `{"type": "...", ...fields}` on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressKind {
    StageStarted { stage: String },
    ModelResponded { stage: String, model_id: String, latency_ms: u64 },
    ModelFailed { stage: String, model_id: String, reason: String },
    StageCompleted { stage: String, success_count: usize, failure_count: usize },
    PipelineCompleted,
    PipelineFailed { reason: String },
}

impl ProgressKind {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::PipelineCompleted | Self::PipelineFailed { .. })
    }
}

/// One lifecycle event emitted during a pipeline execution.
///
/// `sequence` is strictly increasing per `correlation_id`; the terminal
/// event (`pipeline_completed`/`pipeline_failed`) is always last.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub correlation_id: String,
    pub sequence: u64,
    #[serde(flatten)]
    pub kind: ProgressKind,
    #[serde(with = "time::serde::rfc3339")]
    pub emitted_at: OffsetDateTime,
}
