/// `load_config` module: turns parsed CLI/environment input into the immutable service [`Config`].
///
/// This is the only place where credentials are checked. A missing or blank
/// credential is reported here, at startup, before the listener is bound, so the
/// service never starts in a state where every upload would fail.
///
/// # Errors
/// All failures are [`ConfigError`] values; the CLI surfaces them through `anyhow`.
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::ValueEnum;
use thiserror::Error;
use tracing::{error, info};

use crate::cli::Cli;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set to a non-empty value")]
    MissingCredential(&'static str),

    #[error("CLOUDINARY_API_BASE must be an http(s) URL, got {0:?}")]
    InvalidApiBase(String),

    #[error("MAX_BODY_BYTES must be greater than zero")]
    ZeroBodyLimit,

    #[error("UPLOAD_TIMEOUT_SECS must be greater than zero")]
    ZeroUploadTimeout,
}

/// Digest used for request signatures. Cloudinary accounts verify SHA-1 unless switched to SHA-256.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SignatureAlgorithm::Sha1 => "sha1",
            SignatureAlgorithm::Sha256 => "sha256",
        })
    }
}

/// Credentials and endpoint for the Cloudinary upload API.
#[derive(Clone, PartialEq, Eq)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_base: String,
    pub signature_algorithm: SignatureAlgorithm,
}

impl fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("signature_algorithm", &self.signature_algorithm)
            .finish()
    }
}

/// Fully validated service configuration, fixed for the process lifetime.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub max_body_bytes: usize,
    pub upload_timeout: Duration,
    pub cloudinary: CloudinaryConfig,
}

impl Config {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn trace_loaded(&self) {
        info!(
            addr = %self.listen_addr(),
            cloud_name = %self.cloudinary.cloud_name,
            api_base = %self.cloudinary.api_base,
            signature_algorithm = %self.cloudinary.signature_algorithm,
            max_body_bytes = self.max_body_bytes,
            upload_timeout_secs = self.upload_timeout.as_secs(),
            "Loaded Config"
        );
    }
}

fn required(value: &Option<String>, var: &'static str) -> Result<String, ConfigError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => {
            error!(var, "Required credential missing from environment and flags");
            Err(ConfigError::MissingCredential(var))
        }
    }
}

/// Validates the parsed CLI input and builds the service [`Config`].
pub fn load_config(cli: &Cli) -> Result<Config, ConfigError> {
    let cloud_name = required(&cli.cloud_name, "CLOUD_NAME")?;
    let api_key = required(&cli.api_key, "API_KEY")?;
    let api_secret = required(&cli.api_secret, "API_SECRET")?;

    let api_base = cli.api_base.trim_end_matches('/').to_string();
    if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
        error!(api_base = %cli.api_base, "Unsupported Cloudinary API base");
        return Err(ConfigError::InvalidApiBase(cli.api_base.clone()));
    }

    if cli.max_body_bytes == 0 {
        return Err(ConfigError::ZeroBodyLimit);
    }

    if cli.upload_timeout_secs == 0 {
        error!("Upload timeout of zero would fail every transfer");
        return Err(ConfigError::ZeroUploadTimeout);
    }

    let config = Config {
        host: cli.host,
        port: cli.port,
        max_body_bytes: cli.max_body_bytes,
        upload_timeout: Duration::from_secs(cli.upload_timeout_secs),
        cloudinary: CloudinaryConfig {
            cloud_name,
            api_key,
            api_secret,
            api_base,
            signature_algorithm: cli.signature_algorithm,
        },
    };
    config.trace_loaded();
    Ok(config)
}
