//! Fan-out/fan-in of one upload request across the media host.
//!
//! The orchestrator takes every file of an [`UploadRequest`], starts one transfer
//! per file against the injected [`MediaHost`], waits for all of them, and folds
//! the outcomes into a single all-or-nothing result:
//!   - every transfer succeeded: the host descriptors, in completion order
//!   - any transfer failed: the first failure to complete, with its file reference
//!
//! # Responsibilities
//! - Reject empty requests before anything is dispatched
//! - Dispatch exactly one transfer per file and await every one of them, even after a failure
//! - Never retry, never roll back
//!
//! # Known limitation
//! When one transfer fails, the files that did reach the host stay there and are
//! not reported to the caller. Callers cannot tell which of the files succeeded.
//!
//! # Concurrency
//! Transfers are polled together on the calling task through a
//! [`FuturesUnordered`]; nothing is spawned and no state is shared between them
//! other than the read-only host handle.

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::contract::{MediaHost, UploadOptions};
use crate::model::{FileEntry, TransferOutcome, UploadFailure, UploadRequest, UploadResult};

/// Aggregate failure of an upload request.
#[derive(Debug, Error)]
pub enum OrchestrateError {
    #[error("No files uploaded")]
    NoFiles,

    #[error("One or more files failed to upload")]
    Transfer(UploadFailure),
}

/// Coordinates concurrent transfers for one request at a time.
///
/// Cheap to clone; all clones share the same host handle.
#[derive(Clone)]
pub struct UploadOrchestrator {
    host: Arc<dyn MediaHost>,
    options: UploadOptions,
}

impl UploadOrchestrator {
    /// Orchestrator that asks the host to detect the resource type itself.
    pub fn new(host: Arc<dyn MediaHost>) -> Self {
        Self::with_options(host, UploadOptions::default())
    }

    pub fn with_options(host: Arc<dyn MediaHost>, options: UploadOptions) -> Self {
        Self { host, options }
    }

    /// Upload every file in `request` and return all descriptors, or the first failure.
    pub async fn upload_all(&self, request: UploadRequest) -> Result<Vec<UploadResult>, OrchestrateError> {
        if request.is_empty() {
            warn!("[UPLOAD] Request carried no files, nothing dispatched");
            return Err(OrchestrateError::NoFiles);
        }

        let files = request.into_files();
        let dispatched = files.len();
        info!(files = dispatched, resource_type = %self.options.resource_type, "[UPLOAD] Dispatching transfers");

        let mut transfers: FuturesUnordered<_> = files.iter().map(|file| self.transfer(file)).collect();

        let mut results = Vec::with_capacity(dispatched);
        let mut first_failure: Option<UploadFailure> = None;
        let mut settled = 0usize;

        // Drain everything; dropping the stream early would abort in-flight siblings.
        while let Some(outcome) = transfers.next().await {
            settled += 1;
            match outcome {
                TransferOutcome::Success(result) => results.push(result),
                TransferOutcome::Failure(failure) => {
                    if first_failure.is_none() {
                        first_failure = Some(failure);
                    } else {
                        debug!(file = ?failure.file.original_name, "[UPLOAD] Additional failure not reported to caller");
                    }
                }
            }
        }
        debug_assert_eq!(settled, dispatched);

        match first_failure {
            Some(failure) => {
                error!(
                    file = ?failure.file.original_name,
                    error = %failure.error,
                    succeeded = results.len(),
                    dispatched,
                    "[UPLOAD][ERROR] Request failed, successful siblings are not reported"
                );
                Err(OrchestrateError::Transfer(failure))
            }
            None => {
                info!(uploaded = results.len(), "[UPLOAD] All transfers succeeded");
                Ok(results)
            }
        }
    }

    async fn transfer(&self, file: &FileEntry) -> TransferOutcome {
        debug!(file = %file.display_name(), size = file.data.len(), "[UPLOAD] Starting transfer");
        match self.host.upload(file, &self.options).await {
            Ok(result) => {
                info!(file = %file.display_name(), public_id = ?result.public_id(), "[UPLOAD] Transfer succeeded");
                TransferOutcome::Success(result)
            }
            Err(e) => {
                error!(file = %file.display_name(), error = %e, "[UPLOAD][ERROR] Transfer failed");
                TransferOutcome::Failure(UploadFailure {
                    file: file.file_ref(),
                    error: e,
                })
            }
        }
    }
}
