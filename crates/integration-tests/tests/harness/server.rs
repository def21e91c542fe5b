//! Test server wrapper that starts `ultra-server` on a random port.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use ultra_config::Config;
use ultra_health::HealthProbe;
use ultra_progress::ProgressBus;
use ultra_registry::Registry;
use ultra_server::{AppState, Server};

/// A running test server instance.
pub struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    client: reqwest::Client,
    progress: Arc<ProgressBus>,
}

impl TestServer {
    /// Start a test server with the given configuration.
    ///
    /// Binds to port 0 for automatic port assignment and runs the same
    /// initial health sweep `ultra::main` performs, so the returned
    /// server's readiness state reflects the configured mock backends.
    pub async fn start(config: Config) -> anyhow::Result<Self> {
        let registry = Arc::new(Registry::from_entries(&config.models)?);
        let providers = ultra_providers::build_providers(&config.models, &config.credentials, config.pipeline.per_request_adapter_retries);

        let health = Arc::new(HealthProbe::new(providers.clone()));
        health.initial_sweep().await;

        let progress = Arc::new(ProgressBus::new());

        let state = AppState {
            registry,
            providers: Arc::new(providers),
            health,
            progress: Arc::clone(&progress),
            pipeline_config: config.pipeline.clone(),
        };

        let server = Server::new(state, &config.server)?;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, server.into_router())
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, client: reqwest::Client::new(), progress })
    }

    /// Base URL of the running test server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Get a reference to the HTTP client.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// The progress bus this server publishes to, for tests that want to
    /// subscribe directly instead of going through the SSE endpoint.
    pub fn progress(&self) -> &Arc<ProgressBus> {
        &self.progress
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
