//! Health Probe: maintains a current `ProviderHealth` value per provider.
//!
//! Runs a background refresh loop at a fixed cadence: an initial
//! synchronous sweep, then a `tokio::time::interval` loop. Reads are wait-free via an
//! immutable-snapshot swap (`arc_swap::ArcSwap`), never locked against the
//! writer.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use futures::future::{FutureExt, Shared};
use time::OffsetDateTime;
use ultra_core::{ProviderHealth, ProviderKind};
use ultra_providers::Provider;

/// Bounded deadline for the initial synchronous sweep performed before the
/// process starts serving readiness checks.
const INITIAL_SWEEP_DEADLINE: Duration = Duration::from_secs(10);

/// A probe-and-publish future shared across every caller that arrives
/// while it is in flight; `Shared` polls the inner future exactly once
/// and hands every clone the same output.
type ProbeFuture = Shared<Pin<Box<dyn Future<Output = ()> + Send>>>;

/// Background health-probing subsystem.
pub struct HealthProbe {
    providers: HashMap<ProviderKind, Arc<dyn Provider>>,
    snapshot: Arc<ArcSwap<HashMap<ProviderKind, ProviderHealth>>>,
    /// The in-flight probe for each provider currently being refreshed.
    /// `force_refresh` callers that land while an entry is present clone
    /// and await the same future instead of starting a second probe; the
    /// entry is removed once it completes so the next call starts a fresh
    /// one.
    in_flight: DashMap<ProviderKind, ProbeFuture>,
}

impl HealthProbe {
    /// Construct a probe over `providers`, seeding the snapshot with
    /// `not_yet_probed` entries so `/models` and the Readiness Gate have a
    /// well-defined answer before the first sweep completes.
    #[must_use]
    pub fn new(providers: HashMap<ProviderKind, Arc<dyn Provider>>) -> Self {
        let now = OffsetDateTime::now_utc();
        let initial: HashMap<ProviderKind, ProviderHealth> = providers
            .keys()
            .map(|provider| (provider.clone(), ProviderHealth::not_yet_probed(provider.clone(), now)))
            .collect();

        Self {
            providers,
            snapshot: Arc::new(ArcSwap::from_pointee(initial)),
            in_flight: DashMap::new(),
        }
    }

    /// Perform the initial synchronous sweep, bounded by
    /// `INITIAL_SWEEP_DEADLINE`. Providers that don't finish probing
    /// within the deadline keep their `not_yet_probed` snapshot entry.
    pub async fn initial_sweep(&self) {
        let _ = tokio::time::timeout(INITIAL_SWEEP_DEADLINE, self.refresh_all()).await;
    }

    /// Spawn the periodic background refresh loop at `interval`.
    ///
    /// Call `initial_sweep` before spawning this if an initial
    /// synchronous pass is required (e.g. at process start).
    pub fn spawn_refresh_loop(self: &Arc<Self>, interval: Duration) {
        let probe = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // the first tick fires immediately; skip it, the caller already swept
            loop {
                ticker.tick().await;
                probe.refresh_all().await;
            }
        });
    }

    async fn refresh_all(&self) {
        let mut handles = Vec::with_capacity(self.providers.len());
        for provider in self.providers.keys() {
            handles.push(self.force_refresh(provider.clone()));
        }
        futures::future::join_all(handles).await;
    }

    /// Wait-free read of the most recently published health snapshot.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<ProviderKind, ProviderHealth> {
        self.snapshot.load().as_ref().clone()
    }

    /// Explicitly re-probe one provider, coalescing concurrent requests
    /// for the same provider into a single in-flight probe: a caller that
    /// lands while another's probe is running awaits that same probe
    /// instead of issuing its own.
    pub async fn force_refresh(&self, provider: ProviderKind) {
        let shared = if let Some(existing) = self.in_flight.get(&provider) {
            existing.clone()
        } else {
            let Some(adapter) = self.providers.get(&provider).cloned() else {
                return;
            };
            let snapshot = Arc::clone(&self.snapshot);
            let target = provider.clone();
            let probe: Pin<Box<dyn Future<Output = ()> + Send>> = Box::pin(async move {
                let health = adapter.probe().await;
                tracing::debug!(provider = %target, status = ?health.status, "provider health refreshed");

                let current = snapshot.load();
                let mut updated = current.as_ref().clone();
                updated.insert(target, health);
                snapshot.store(Arc::new(updated));
            });
            self.in_flight.entry(provider.clone()).or_insert_with(|| probe.shared()).clone()
        };

        shared.await;
        self.in_flight.remove(&provider);
    }
}
