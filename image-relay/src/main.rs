use anyhow::Result;
use clap::Parser;
use image_relay::cli::{run, Cli};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment before clap reads it
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!("image-relay startup: tracing initialised, environment loaded");

    let cli = Cli::parse();
    let result = run(cli).await;
    match &result {
        Ok(_) => tracing::info!("image-relay exited cleanly"),
        Err(e) => tracing::error!(error = %format!("{e:#}"), "image-relay exited with error"),
    }
    result
}
