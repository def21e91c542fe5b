//! Configuration loading for the orchestrator.
//!
//! Loads a TOML file, expands `{{ env.VAR }}` placeholders, deserializes,
//! then validates.
//! Environment variables override file values where applicable;
//! precedence is env > file > built-in default (the `env.rs` expansion
//! happens before deserialization, so an expanded env value always wins
//! over whatever default `serde(default)` would otherwise supply).

pub mod credentials;
pub mod env;
pub mod loader;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod server;

pub use credentials::CredentialsConfig;
pub use loader::Config;
pub use logging::LoggingConfig;
pub use models::ModelEntry;
pub use pipeline::PipelineConfig;
pub use server::ServerConfig;
