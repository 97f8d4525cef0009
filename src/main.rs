//! submission-intake server
//!
//! Loads configuration from the environment (and `.env` if present), then
//! serves the HTTP trigger surface until SIGTERM/SIGINT.

use std::sync::Arc;
use submission_intake::{Config, Pipeline, api, shutdown_signal};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        region = %config.region,
        bucket = %config.storage.bucket,
        backend = ?config.storage.backend,
        audit_table = %config.audit.table_name,
        "configuration loaded"
    );

    let pipeline = Arc::new(Pipeline::from_config(&config).await?);

    api::start_api_server(pipeline, config.api.bind_address, shutdown_signal()).await?;
    Ok(())
}
