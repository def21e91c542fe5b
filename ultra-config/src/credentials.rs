use std::collections::HashMap;

use secrecy::SecretString;
use serde::Deserialize;

/// Map of `credential_name` to an opaque secret value, read once at
/// startup and handed to provider adapters.
///
/// Never logged or serialized back out — `SecretString` enforces this.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(transparent)]
pub struct CredentialsConfig(pub HashMap<String, SecretString>);

impl CredentialsConfig {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SecretString> {
        self.0.get(name)
    }
}
