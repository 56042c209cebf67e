//! Storage API - HTTP gateway for an S3-compatible bucket

use clap::Parser;
use storage_api::{Cli, logging::init_logging, run_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Parse arguments
    let cli = Cli::parse();

    // Setup logging
    init_logging(&cli.log_file, cli.debug)?;

    let log_file = cli.log_file.clone();
    let config = cli.into_config().inspect_err(|e| {
        tracing::error!("Invalid configuration: {:#}", e);
    })?;

    tracing::info!("Starting Storage API on {}", config.bind_addr());
    tracing::info!("Public API URL: {}", config.api_url);
    tracing::info!("Writing logs to {}", log_file.display());

    // Run the server
    run_server(config).await
}
