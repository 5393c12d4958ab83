//! # contract: interface to the external media host
//!
//! This module defines a single trait ([`MediaHost`]) and the supporting types
//! for transferring one in-memory file to an external hosting service
//! (Cloudinary in production, a mock or a fake in tests).
//!
//! ## Interface & Extensibility
//! - Implement [`MediaHost`] to add a new hosting destination.
//! - The single method is async and returns a typed [`TransferError`].
//! - Implementors are constructed once at startup and shared read-only; they must be `Send + Sync`.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`, so consumers get `MockMediaHost`
//!   with the default `test-export-mocks` feature.
//!
//! ## Adding New Hosts
//! - Convert every upstream failure into one of the [`TransferError`] variants.
//! - Return the host's response descriptor unmodified inside [`UploadResult`].

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[allow(unused_imports)]
use mockall::{automock, predicate::*};

use crate::model::{FileEntry, UploadResult};

/// Kind of resource the host should store the file as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResourceType {
    /// Let the host detect the type from the contents.
    #[default]
    Auto,
    Image,
    Video,
    Raw,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Auto => "auto",
            ResourceType::Image => "image",
            ResourceType::Video => "video",
            ResourceType::Raw => "raw",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-transfer options sent alongside the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    pub resource_type: ResourceType,
}

/// Why a single transfer did not produce a result.
#[derive(Debug, Clone, Error, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransferError {
    /// The host could not be reached or the connection broke mid-transfer.
    #[error("network error: {message}")]
    Network { message: String },

    /// The host answered with a non-success status.
    #[error("media host rejected upload ({http_code}): {message}")]
    Rejected { http_code: u16, message: String },

    /// The host answered with success but the body was not a descriptor.
    #[error("invalid response from media host: {message}")]
    InvalidResponse { message: String },
}

/// Trait for transferring a file to an external media host.
///
/// One call stores one file and yields the host's descriptor for it. No retries
/// are expected from implementors; a failed call is reported as-is.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Upload the contents of `file` with the given options.
    async fn upload(&self, file: &FileEntry, options: &UploadOptions) -> Result<UploadResult, TransferError>;
}
