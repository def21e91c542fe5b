//! Test harness: a mock multi-vendor LLM backend, a programmatic config
//! builder, and a `TestServer` wrapper that starts `ultra-server` on an
//! ephemeral port.

pub mod config;
pub mod mock_provider;
pub mod server;
