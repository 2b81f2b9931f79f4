//! Whaler - Main entry point.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use whaler::{
    cli::{Cli, run_command},
    config::Config,
    engine::{DockerEngine, EngineClient},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env first so clap's env fallbacks see it
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("whaler=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    tracing::debug!(
        "Engine timeout {}s, socket fallback {}",
        config.engine.timeout.as_secs(),
        config.engine.socket_fallback
    );

    let engine: Arc<dyn EngineClient> = Arc::new(DockerEngine::connect(&config.engine).await?);

    run_command(cli.command, engine).await
}
