use serde::{Deserialize, Serialize};

/// Outcome of one adapter call, attempted for one (stage, model) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStatus {
    Success,
    Failed,
    TimedOut,
    Skipped,
}

/// Result of asking one provider adapter to generate one completion.
///
/// Always produced — an adapter never raises across its boundary for
/// vendor-side failures; they are encoded here instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelOutput {
    pub model_id: String,
    /// May be empty when `status != Success`.
    pub text: String,
    pub status: OutputStatus,
    pub latency_ms: u64,
    pub error_detail: Option<String>,
}

impl ModelOutput {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, OutputStatus::Success)
    }
}
