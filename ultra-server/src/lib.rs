//! HTTP boundary: the orchestration endpoint, the SSE progress stream,
//! and the two read-only introspection endpoints, assembled into a
//! `Server` struct holding a built `axum::Router` plus the resolved
//! listen address, constructed once at startup.

mod error;
mod handlers;
mod request;
mod response;
mod state;

use std::net::SocketAddr;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use ultra_config::ServerConfig;

pub use state::AppState;

/// Assembled server: routes, middleware, and the address it will bind.
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from its resolved state and listener
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `config.listen` cannot be parsed as a socket
    /// address.
    pub fn new(state: AppState, config: &ServerConfig) -> anyhow::Result<Self> {
        let listen_address: SocketAddr =
            config.listen.parse().map_err(|e| anyhow::anyhow!("invalid server.listen address `{}`: {e}", config.listen))?;

        let mut app = handlers::router();

        if config.health.enabled {
            app = app.route("/health", axum::routing::get(handlers::health::health));
        }

        app = app.layer(TraceLayer::new_for_http());

        if config.cors.enabled {
            app = app.layer(CorsLayer::permissive());
        }

        Ok(Self { router: app.with_state(state), listen_address })
    }

    /// The address this server is configured to bind.
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router, unbound.
    ///
    /// Used by tests that want to control listener binding themselves.
    #[must_use]
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Bind and serve until `shutdown` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound or the server
    /// fails while serving.
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "orchestrator listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}
