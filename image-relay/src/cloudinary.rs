#![doc = "Cloudinary implementation of the core MediaHost contract: signs and sends one upload call per file."]
//
//! # Cloudinary client
//!
//! Bridges [`image_relay_core::contract::MediaHost`] to the Cloudinary upload API.
//!
//! - Construct [`CloudinaryClient`] once at startup from a [`CloudinaryConfig`].
//! - Each [`MediaHost::upload`] call sends a signed `multipart/form-data` request to
//!   `{api_base}/v1_1/{cloud_name}/{resource_type}/upload`.
//! - The response body is passed through untouched as an [`UploadResult`].
//!
//! Signatures default to SHA-1, which every Cloudinary account accepts. Select
//! [`SignatureAlgorithm::Sha256`] only for accounts switched to SHA-256 verification.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use image_relay_core::contract::{MediaHost, ResourceType, TransferError, UploadOptions};
use image_relay_core::model::{FileEntry, UploadResult};

use crate::load_config::{CloudinaryConfig, SignatureAlgorithm};

/// Parameters that are sent but never part of the signed string.
const UNSIGNED_PARAMS: [&str; 4] = ["file", "cloud_name", "resource_type", "api_key"];

/// Builds the string Cloudinary expects to be hashed: signable params sorted by
/// name, joined as `k=v&k=v`, with the secret appended.
pub fn string_to_sign(params: &[(&str, String)], api_secret: &str) -> String {
    let mut signable: Vec<&(&str, String)> = params
        .iter()
        .filter(|(key, value)| !UNSIGNED_PARAMS.contains(key) && !value.is_empty())
        .collect();
    signable.sort_by(|a, b| a.0.cmp(b.0));

    let joined = signable
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{joined}{api_secret}")
}

fn hex_digest<D: Digest>(input: &str) -> String
where
    sha2::digest::Output<D>: std::fmt::LowerHex,
{
    let mut hasher = D::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Hex-encoded request signature using `algorithm`.
pub fn sign_params(params: &[(&str, String)], api_secret: &str, algorithm: SignatureAlgorithm) -> String {
    let payload = string_to_sign(params, api_secret);
    match algorithm {
        SignatureAlgorithm::Sha1 => hex_digest::<Sha1>(&payload),
        SignatureAlgorithm::Sha256 => hex_digest::<Sha256>(&payload),
    }
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Extracts `error.message` from a Cloudinary error body, falling back to the raw text.
fn rejection_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error")?.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

pub struct CloudinaryClient {
    http: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryClient {
    pub fn new(config: CloudinaryConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        tracing::info!(
            cloud_name = %config.cloud_name,
            api_base = %config.api_base,
            signature_algorithm = %config.signature_algorithm,
            timeout_secs = timeout.as_secs(),
            "Initialized CloudinaryClient"
        );
        Ok(Self { http, config })
    }

    pub fn upload_url(&self, resource_type: ResourceType) -> String {
        format!(
            "{}/v1_1/{}/{}/upload",
            self.config.api_base, self.config.cloud_name, resource_type
        )
    }

    fn file_part(file: &FileEntry) -> Part {
        let file_name = file.file_name.clone().unwrap_or_else(|| "upload".to_string());
        let part = || Part::bytes(file.data.to_vec()).file_name(file_name.clone());
        match file.content_type.as_deref() {
            Some(mime) => part().mime_str(mime).unwrap_or_else(|e| {
                tracing::warn!(file = %file.display_name(), mime, error = %e, "Ignoring unparseable content type");
                part()
            }),
            None => part(),
        }
    }
}

#[async_trait]
impl MediaHost for CloudinaryClient {
    async fn upload(&self, file: &FileEntry, options: &UploadOptions) -> Result<UploadResult, TransferError> {
        let timestamp = unix_timestamp().to_string();
        let signature = sign_params(
            &[("timestamp", timestamp.clone())],
            &self.config.api_secret,
            self.config.signature_algorithm,
        );
        let url = self.upload_url(options.resource_type);

        tracing::info!(
            file = %file.display_name(),
            size = file.data.len(),
            resource_type = %options.resource_type,
            "Uploading file to Cloudinary"
        );

        let form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .part("file", Self::file_part(file));

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, file = %file.display_name(), "Network error uploading to Cloudinary");
                TransferError::Network { message: e.to_string() }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| TransferError::Network {
            message: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            let message = rejection_message(&body);
            tracing::error!(status = status.as_u16(), message = %message, file = %file.display_name(), "Cloudinary rejected upload");
            return Err(TransferError::Rejected {
                http_code: status.as_u16(),
                message,
            });
        }

        let descriptor: Value = serde_json::from_str(&body).map_err(|e| TransferError::InvalidResponse {
            message: format!("response is not JSON: {e}"),
        })?;
        if !descriptor.is_object() {
            return Err(TransferError::InvalidResponse {
                message: "response is not a JSON object".to_string(),
            });
        }

        let result = UploadResult::from(descriptor);
        tracing::info!(
            public_id = ?result.public_id(),
            secure_url = ?result.secure_url(),
            "Successfully uploaded file to Cloudinary"
        );
        Ok(result)
    }
}
