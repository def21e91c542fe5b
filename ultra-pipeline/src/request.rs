use ultra_core::ids::new_correlation_id;

/// A caller's request to run one pipeline execution.
///
/// Constructed at the HTTP boundary; owned exclusively by one execution
/// and never shared across requests.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub prompt: String,
    pub selected_models: Vec<String>,
    pub include_initial: bool,
    pub include_meta: bool,
    pub correlation_id: String,
}

impl PipelineRequest {
    /// Build a request with a freshly generated correlation id.
    #[must_use]
    pub fn new(prompt: String, selected_models: Vec<String>, include_initial: bool, include_meta: bool) -> Self {
        Self { prompt, selected_models, include_initial, include_meta, correlation_id: new_correlation_id() }
    }
}
