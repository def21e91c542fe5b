use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::credentials::CredentialsConfig;
use crate::env::expand_env;
use crate::logging::LoggingConfig;
use crate::models::ModelEntry;
use crate::pipeline::PipelineConfig;
use crate::server::ServerConfig;

/// Top-level configuration for the orchestrator process.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub models: Vec<ModelEntry>,
    pub credentials: CredentialsConfig,
    pub pipeline: PipelineConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            models: Vec::new(),
            credentials: CredentialsConfig::default(),
            pipeline: PipelineConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, env placeholders fail
    /// to expand, the TOML is malformed, or `validate` rejects the result.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let expanded = expand_env(&raw).map_err(|e| anyhow::anyhow!("failed to expand config: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field invariants that `serde` alone cannot express.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invariant violated.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_models()?;
        self.validate_pipeline()?;
        Ok(())
    }

    fn validate_models(&self) -> anyhow::Result<()> {
        let mut seen = HashSet::with_capacity(self.models.len());
        for model in &self.models {
            if model.id.is_empty() {
                anyhow::bail!("model entry has an empty id");
            }
            if !seen.insert(model.id.as_str()) {
                anyhow::bail!("duplicate model id in configuration: `{}`", model.id);
            }
            if model.credential_name.is_empty() {
                anyhow::bail!("model `{}` has an empty credential_name", model.id);
            }
        }
        Ok(())
    }

    fn validate_pipeline(&self) -> anyhow::Result<()> {
        let p = &self.pipeline;
        if p.health_probe_interval_seconds == 0 {
            anyhow::bail!("pipeline.health_probe_interval_seconds must be > 0");
        }
        if p.initial_stage_deadline_seconds == 0
            || p.meta_stage_deadline_seconds == 0
            || p.ultra_stage_deadline_seconds == 0
        {
            anyhow::bail!("pipeline stage deadlines must be > 0");
        }
        if p.pipeline_total_deadline_seconds
            < p.initial_stage_deadline_seconds + p.ultra_stage_deadline_seconds
        {
            anyhow::bail!(
                "pipeline.pipeline_total_deadline_seconds must be at least initial + ultra stage deadlines"
            );
        }
        if p.max_selected_models == 0 {
            anyhow::bail!("pipeline.max_selected_models must be > 0");
        }
        if p.per_request_adapter_retries > 16 {
            anyhow::bail!("pipeline.per_request_adapter_retries must be <= 16");
        }
        Ok(())
    }
}
