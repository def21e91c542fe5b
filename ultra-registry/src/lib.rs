//! Single source of truth for which public model ids exist and how to
//! route them.
//!
//! Built once at startup from `ultra_config::ModelEntry` rows and
//! immutable for the process lifetime: lookups are plain `HashMap` reads,
//! never locked.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use ultra_config::ModelEntry;
use ultra_core::ProviderKind;

/// Authoritative mapping from a public model id to the provider and
/// vendor-specific model name that serve it.
#[derive(Debug, Clone)]
pub struct ModelDescriptor {
    pub id: String,
    pub provider: ProviderKind,
    pub vendor_model_name: String,
    pub requires_credential: String,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate model id in configuration: `{0}`")]
    DuplicateId(String),
}

/// Immutable, lock-free model lookup table.
#[derive(Debug)]
pub struct Registry {
    by_id: HashMap<String, ModelDescriptor>,
}

impl Registry {
    /// Build a registry from the static configuration list.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateId` if two entries share an id.
    /// Duplicate-id detection is already performed by
    /// `ultra_config::Config::validate`; this is a second, independent
    /// check so the registry itself can never be constructed in an
    /// inconsistent state even if callers build one from a hand-rolled
    /// `Vec<ModelEntry>` that skipped config validation.
    pub fn from_entries(entries: &[ModelEntry]) -> Result<Self, RegistryError> {
        let mut by_id = HashMap::with_capacity(entries.len());
        for entry in entries {
            let descriptor = ModelDescriptor {
                id: entry.id.clone(),
                provider: entry.provider.clone(),
                vendor_model_name: entry.vendor_model_name.clone(),
                requires_credential: entry.credential_name.clone(),
            };
            if by_id.insert(entry.id.clone(), descriptor).is_some() {
                return Err(RegistryError::DuplicateId(entry.id.clone()));
            }
        }
        Ok(Self { by_id })
    }

    /// Resolve a public model id to its descriptor.
    #[must_use]
    pub fn resolve(&self, model_id: &str) -> Option<&ModelDescriptor> {
        self.by_id.get(model_id)
    }

    /// All registered descriptors, in no particular order.
    #[must_use]
    pub fn all(&self) -> Vec<&ModelDescriptor> {
        self.by_id.values().collect()
    }

    /// Distinct providers that serve the given set of model ids. Unknown
    /// ids are silently skipped — callers resolve existence separately.
    #[must_use]
    pub fn providers_for(&self, model_ids: &HashSet<String>) -> HashSet<ProviderKind> {
        model_ids
            .iter()
            .filter_map(|id| self.by_id.get(id))
            .map(|d| d.provider.clone())
            .collect()
    }
}
