//! Reads the inbound multipart body into an in-memory [`UploadRequest`].
//!
//! The file bound is enforced here, before the orchestrator sees anything: a
//! sixth `images` part aborts the request and no transfer is started.

use axum::extract::Multipart;
use tracing::debug;

use image_relay_core::model::{FileEntry, UploadRequest, FILES_FIELD, MAX_FILES};

use crate::error::ApiError;

/// Buffer every `images` file part of `multipart`.
///
/// Text fields are skipped. A file part under any other field name is rejected.
pub async fn collect_files(multipart: &mut Multipart) -> Result<UploadRequest, ApiError> {
    let mut files: Vec<FileEntry> = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);

        // Parts without a file name are plain form values.
        if file_name.is_none() {
            debug!(field = %field_name, "Skipping non-file form field");
            continue;
        }

        if field_name != FILES_FIELD {
            return Err(ApiError::UnexpectedField { field: field_name });
        }

        if files.len() == MAX_FILES {
            return Err(ApiError::TooManyFiles { limit: MAX_FILES });
        }

        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?;
        debug!(file = ?file_name, size = data.len(), "Buffered file part");

        files.push(FileEntry {
            field_name,
            file_name,
            content_type,
            data,
        });
    }

    Ok(UploadRequest::new(files))
}
