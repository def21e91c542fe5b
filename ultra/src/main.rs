#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use std::sync::Arc;
use std::time::Duration;

use args::Args;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use ultra_config::Config;
use ultra_health::HealthProbe;
use ultra_progress::ProgressBus;
use ultra_registry::Registry;
use ultra_server::{AppState, Server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    if let Some(listen) = args.listen {
        config.server.listen = listen.to_string();
    }

    ultra_config::logging::init_tracing(&config.logging)?;

    tracing::info!(config_path = %args.config.display(), "starting ultra orchestrator");

    let registry = Arc::new(Registry::from_entries(&config.models)?);
    let providers = ultra_providers::build_providers(&config.models, &config.credentials, config.pipeline.per_request_adapter_retries);

    let health = Arc::new(HealthProbe::new(providers.clone()));
    health.initial_sweep().await;
    health.spawn_refresh_loop(Duration::from_secs(config.pipeline.health_probe_interval_seconds));

    let state = AppState {
        registry,
        providers: Arc::new(providers),
        health,
        progress: Arc::new(ProgressBus::new()),
        pipeline_config: config.pipeline.clone(),
    };

    let server = Server::new(state, &config.server)?;

    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_clone.cancel();
    });

    server.serve(shutdown).await?;

    tracing::info!("ultra orchestrator stopped");
    Ok(())
}

/// Wait for a shutdown signal (`SIGINT` or `SIGTERM`)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
