use async_trait::async_trait;
use std::time::Instant;
use ultra_core::{ModelOutput, ProviderHealth};

/// Uniform capability wrapping one external LLM vendor's HTTP API.
///
/// Implementations never raise across this boundary for vendor-side
/// failures: `generate` always returns a `ModelOutput`, folding transport
/// errors, vendor errors, and timeouts into its `status`/`error_detail`
/// fields instead.
#[async_trait]
pub trait Provider: Send + Sync {
    /// The provider name this adapter was configured under.
    fn name(&self) -> &str;

    /// Produce one completion from `vendor_model_name` for `prompt`,
    /// never completing after `deadline`.
    async fn generate(&self, vendor_model_name: &str, prompt: &str, deadline: Instant) -> ModelOutput;

    /// Confirm the adapter's credential is present and the vendor is
    /// reachable with one minimal call, bounded to 5 seconds with no
    /// retries.
    async fn probe(&self) -> ProviderHealth;
}
