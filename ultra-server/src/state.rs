use std::collections::HashMap;
use std::sync::Arc;

use ultra_config::PipelineConfig;
use ultra_core::ProviderKind;
use ultra_health::HealthProbe;
use ultra_progress::ProgressBus;
use ultra_providers::Provider;
use ultra_registry::Registry;

/// Process-wide state shared across every request, assembled once at
/// startup in `ultra::main` and cloned (cheaply, via `Arc`) into each
/// axum handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub providers: Arc<HashMap<ProviderKind, Arc<dyn Provider>>>,
    pub health: Arc<HealthProbe>,
    pub progress: Arc<ProgressBus>,
    pub pipeline_config: PipelineConfig,
}
