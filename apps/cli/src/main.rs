//! `ahavault`: command-line client for the AhaVault file-sharing service.

mod cli;
mod commands;
mod config;
mod context;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::CliConfig;
use context::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = CliConfig::load()?;
    config.apply_api_url(cli.api_url);
    tracing::debug!(api_url = %config.api_url, "configuration loaded");

    let mut ctx = Context::open(config, cli.json)?;
    commands::run(cli.command, &mut ctx).await
}
