///
/// This module implements the CLI surface of image-relay: flag/environment parsing
/// and the async entrypoint that wires configuration, the Cloudinary client and the
/// HTTP server together.
///
/// All upload orchestration lives in the [`image-relay-core`] crate.
/// This module is strictly glue.
///
/// ## How To Use
/// - From the shell: run the `image-relay` binary; every flag can also come from the environment or a `.env` file.
/// - Programmatically or in tests: call [`run`] with a constructed [`Cli`].
///
/// [`image-relay-core`]: ../../image-relay-core/
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use image_relay_core::orchestrator::UploadOrchestrator;

use crate::cloudinary::CloudinaryClient;
use crate::load_config::{load_config, SignatureAlgorithm};
use crate::server;

/// Default cap on the whole multipart body.
pub const DEFAULT_MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// image-relay: accept multi-file image uploads and relay them to Cloudinary.
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "image-relay",
    version,
    about = "Relay multi-file image uploads to Cloudinary and return the aggregated results"
)]
pub struct Cli {
    /// Address to bind the HTTP listener to
    #[clap(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on
    #[clap(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Cloudinary cloud name
    #[clap(long, env = "CLOUD_NAME")]
    pub cloud_name: Option<String>,

    /// Cloudinary API key
    #[clap(long, env = "API_KEY")]
    pub api_key: Option<String>,

    /// Cloudinary API secret
    #[clap(long, env = "API_SECRET", hide_env_values = true)]
    pub api_secret: Option<String>,

    /// Base URL of the Cloudinary upload API
    #[clap(long, env = "CLOUDINARY_API_BASE", default_value = "https://api.cloudinary.com")]
    pub api_base: String,

    /// Digest used to sign upload requests
    #[clap(long, env = "SIGNATURE_ALGORITHM", value_enum, default_value_t = SignatureAlgorithm::Sha1)]
    pub signature_algorithm: SignatureAlgorithm,

    /// Largest accepted request body, in bytes
    #[clap(long, env = "MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,

    /// Timeout for each outbound upload, in seconds
    #[clap(long, env = "UPLOAD_TIMEOUT_SECS", default_value_t = 60)]
    pub upload_timeout_secs: u64,
}

/// Wait for Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down gracefully..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down gracefully..."),
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    run_until(cli, shutdown_signal()).await
}

/// Like [`run`], but stops serving once `shutdown` resolves.
pub async fn run_until<F>(cli: Cli, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let config = load_config(&cli).context("invalid configuration")?;

    let client = CloudinaryClient::new(config.cloudinary.clone(), config.upload_timeout)
        .context("failed to build Cloudinary HTTP client")?;
    let orchestrator = UploadOrchestrator::new(Arc::new(client));

    server::serve(&config, orchestrator, shutdown).await
}
