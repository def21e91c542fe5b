use serde::Deserialize;

/// Timing and fan-out limits for the Pipeline Engine and the adapters it
/// drives.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PipelineConfig {
    pub health_probe_interval_seconds: u64,
    pub initial_stage_deadline_seconds: u64,
    pub meta_stage_deadline_seconds: u64,
    pub ultra_stage_deadline_seconds: u64,
    pub pipeline_total_deadline_seconds: u64,
    pub max_selected_models: usize,
    /// Capped at 16 by `Config::validate` — the exponential backoff
    /// computed from this count would otherwise overflow `u32` well
    /// before reaching it.
    pub per_request_adapter_retries: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            health_probe_interval_seconds: 60,
            initial_stage_deadline_seconds: 60,
            meta_stage_deadline_seconds: 60,
            ultra_stage_deadline_seconds: 45,
            pipeline_total_deadline_seconds: 180,
            max_selected_models: 10,
            per_request_adapter_retries: 2,
        }
    }
}
