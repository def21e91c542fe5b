//! Programmatic configuration builder for integration tests.

use secrecy::SecretString;
use ultra_config::{Config, ModelEntry, PipelineConfig};
use ultra_core::ProviderKind;
use url::Url;

/// Builder for constructing test configurations.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with minimal defaults: health enabled, no
    /// models registered yet.
    pub fn new() -> Self {
        Self { config: Config::default() }
    }

    /// Register a model served by a mock backend at `base_url`.
    ///
    /// Each model gets its own credential entry named after its id, so
    /// tests can register several models on the same `provider` kind
    /// without them sharing a vendor base URL — the one exception is that
    /// `ultra_providers::build_providers` still only builds one adapter
    /// per distinct `ProviderKind`, so tests that need independently
    /// failing/succeeding models use the three distinct built-in kinds
    /// (openai/anthropic/google), one mock backend each.
    pub fn with_model(mut self, id: &str, provider: ProviderKind, base_url: &str) -> Self {
        let credential_name = format!("{id}-cred");
        self.config.credentials.0.insert(credential_name.clone(), SecretString::from("test-key"));
        self.config.models.push(ModelEntry {
            id: id.to_owned(),
            provider,
            vendor_model_name: format!("{id}-vendor"),
            credential_name,
            base_url: Some(Url::parse(base_url).expect("valid mock base url")),
        });
        self
    }

    /// Override pipeline timing/fan-out limits.
    pub fn with_pipeline(mut self, f: impl FnOnce(&mut PipelineConfig)) -> Self {
        f(&mut self.config.pipeline);
        self
    }

    /// Build the final config.
    pub fn build(self) -> Config {
        self.config
    }
}
