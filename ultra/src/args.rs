use std::path::PathBuf;

use clap::Parser;

/// UltrAI orchestrator
#[derive(Debug, Parser)]
#[command(name = "ultra", about = "Multi-model LLM orchestration pipeline")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "ultra.toml", env = "ULTRA_CONFIG")]
    pub config: PathBuf,

    /// Override the configured listen address
    #[arg(long, env = "ULTRA_LISTEN")]
    pub listen: Option<std::net::SocketAddr>,
}
