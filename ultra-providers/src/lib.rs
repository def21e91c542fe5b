//! Provider Adapter: per-vendor clients exposing a uniform
//! `generate`/`probe` capability, hiding vendor HTTP idiosyncrasies and
//! never raising across their boundary for vendor-side failures.

mod anthropic;
mod builder;
mod error;
mod google;
mod openai;
mod provider;
mod retry;

pub use anthropic::AnthropicAdapter;
pub use builder::build_providers;
pub use google::GoogleAdapter;
pub use openai::OpenAiAdapter;
pub use provider::Provider;
