use serde::Deserialize;
use ultra_core::ProviderKind;
use url::Url;

/// One row of the static model list read from configuration.
///
/// Populates the Model Registry at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ModelEntry {
    pub id: String,
    pub provider: ProviderKind,
    pub vendor_model_name: String,
    pub credential_name: String,
    /// Override the provider's default vendor base URL.
    ///
    /// Every entry naming the same provider is expected to agree; the
    /// adapter builder uses the first one it sees per provider, mirroring
    /// how it already picks one `credential_name` per provider. Exists so
    /// a deployment (or a test harness) can point an adapter at something
    /// other than the real vendor endpoint.
    pub base_url: Option<Url>,
}

impl Default for ModelEntry {
    fn default() -> Self {
        Self {
            id: String::new(),
            provider: ProviderKind::Other(String::new()),
            vendor_model_name: String::new(),
            credential_name: String::new(),
            base_url: None,
        }
    }
}
