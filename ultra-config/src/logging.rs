use serde::Deserialize;

/// Logging configuration. The only recognized ambient knob is the
/// `tracing-subscriber` env filter directive, overridable via
/// `RUST_LOG`/`ULTRA_LOG` at process start.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: "info".to_owned() }
    }
}

/// Initialize the global `tracing` subscriber.
///
/// Sets up structured log lines only; there is no OTLP export machinery
/// here.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed.
pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
