//! Request-scoped data carried through one upload cycle.
//!
//! Nothing here outlives the HTTP request that created it: an [`UploadRequest`]
//! is built by the inbound layer, consumed by the orchestrator, and the
//! resulting [`UploadResult`]s or [`UploadFailure`] are serialised into the response.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::contract::TransferError;

/// Form field that carries the uploaded files.
pub const FILES_FIELD: &str = "images";

/// Maximum number of files accepted in one request.
pub const MAX_FILES: usize = 5;

/// One file taken from the inbound multipart body, held entirely in memory.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Name of the form field the part arrived under.
    pub field_name: String,
    /// File name supplied by the client, if any.
    pub file_name: Option<String>,
    /// Content-type hint supplied by the client, if any.
    pub content_type: Option<String>,
    /// The raw file contents.
    pub data: Bytes,
}

impl FileEntry {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            field_name: FILES_FIELD.to_string(),
            file_name: Some(file_name.into()),
            content_type: Some(content_type.into()),
            data: data.into(),
        }
    }

    /// Name used in logs and diagnostics when the client sent none.
    pub fn display_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or("<unnamed>")
    }

    pub fn file_ref(&self) -> FileRef {
        FileRef {
            field_name: self.field_name.clone(),
            original_name: self.file_name.clone(),
            mime_type: self.content_type.clone(),
            size: self.data.len(),
        }
    }
}

/// The ordered set of files submitted in one request.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    files: Vec<FileEntry>,
}

impl UploadRequest {
    pub fn new(files: Vec<FileEntry>) -> Self {
        Self { files }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn into_files(self) -> Vec<FileEntry> {
        self.files
    }
}

/// Descriptor returned by the media host for a stored file.
///
/// The shape belongs to the host and is passed through to the caller untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadResult(pub Value);

impl UploadResult {
    pub fn public_id(&self) -> Option<&str> {
        self.0.get("public_id").and_then(Value::as_str)
    }

    pub fn secure_url(&self) -> Option<&str> {
        self.0.get("secure_url").and_then(Value::as_str)
    }
}

impl From<Value> for UploadResult {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// A file described without its contents, for error reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRef {
    #[serde(rename = "fieldname")]
    pub field_name: String,
    #[serde(rename = "originalname")]
    pub original_name: Option<String>,
    #[serde(rename = "mimetype")]
    pub mime_type: Option<String>,
    pub size: usize,
}

/// A transfer that did not complete, paired with the file it was carrying.
#[derive(Debug, Clone, Serialize)]
pub struct UploadFailure {
    pub file: FileRef,
    pub error: TransferError,
}

/// Outcome of a single transfer.
#[derive(Debug, Clone)]
pub enum TransferOutcome {
    Success(UploadResult),
    Failure(UploadFailure),
}
