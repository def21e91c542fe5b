use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::provider_kind::ProviderKind;

/// Tri-state reachability of a provider, as last determined by a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unavailable,
}

impl HealthStatus {
    #[must_use]
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Healthy | Self::Degraded)
    }
}

/// Current reachability of one provider, as produced by the Health Probe
/// and consumed read-only by the Readiness Gate and the `/models` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderHealth {
    pub provider: ProviderKind,
    pub status: HealthStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub last_checked_at: OffsetDateTime,
    pub detail: Option<String>,
}

impl ProviderHealth {
    #[must_use]
    pub fn not_yet_probed(provider: ProviderKind, at: OffsetDateTime) -> Self {
        Self {
            provider,
            status: HealthStatus::Unavailable,
            last_checked_at: at,
            detail: Some("not_yet_probed".to_owned()),
        }
    }
}
