use std::collections::HashMap;
use std::sync::Arc;

use ultra_config::{CredentialsConfig, ModelEntry};
use ultra_core::ProviderKind;

use crate::anthropic::AnthropicAdapter;
use crate::google::GoogleAdapter;
use crate::openai::OpenAiAdapter;
use crate::provider::Provider;

/// Build one adapter per distinct provider referenced by `models`.
///
/// Every model entry naming the same provider is expected to share a
/// credential; the first entry seen for a provider determines which
/// `credential_name` that provider's adapter resolves.
#[must_use]
pub fn build_providers(models: &[ModelEntry], credentials: &CredentialsConfig, max_retries: u32) -> HashMap<ProviderKind, Arc<dyn Provider>> {
    let mut providers: HashMap<ProviderKind, Arc<dyn Provider>> = HashMap::new();

    for entry in models {
        if providers.contains_key(&entry.provider) {
            continue;
        }

        let api_key = credentials.get(&entry.credential_name).cloned();
        let name = entry.provider.to_string();
        let base_url = entry.base_url.clone();

        let adapter: Arc<dyn Provider> = match &entry.provider {
            ProviderKind::Openai => Arc::new(OpenAiAdapter::with_base_url(name, api_key, max_retries, base_url)),
            ProviderKind::Anthropic => Arc::new(AnthropicAdapter::with_base_url(name, api_key, max_retries, base_url)),
            ProviderKind::Google => Arc::new(GoogleAdapter::with_base_url(name, api_key, max_retries, base_url)),
            ProviderKind::Other(other) => {
                tracing::warn!(provider = %other, "no adapter registered for provider, skipping");
                continue;
            }
        };

        providers.insert(entry.provider.clone(), adapter);
    }

    providers
}
