use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use image_relay_core::model::UploadFailure;
use image_relay_core::orchestrator::OrchestrateError;

/// Everything the `/upload` endpoint can answer with besides success.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Empty form, missing `images` field, or a body that is not multipart at all
    #[error("No files uploaded")]
    NoFiles,

    #[error("Too many files")]
    TooManyFiles { limit: usize },

    /// A file part arrived under a field other than `images`
    #[error("Unexpected field")]
    UnexpectedField { field: String },

    #[error("Malformed multipart body")]
    Malformed { message: String },

    #[error("Request body too large")]
    PayloadTooLarge { message: String },

    #[error("One or more files failed to upload")]
    Transfer(UploadFailure),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NoFiles
            | ApiError::TooManyFiles { .. }
            | ApiError::UnexpectedField { .. }
            | ApiError::Malformed { .. } => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Transfer(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<OrchestrateError> for ApiError {
    fn from(err: OrchestrateError) -> Self {
        match err {
            OrchestrateError::NoFiles => ApiError::NoFiles,
            OrchestrateError::Transfer(failure) => ApiError::Transfer(failure),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge {
                message: err.body_text(),
            }
        } else {
            ApiError::Malformed {
                message: err.body_text(),
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Transfer(failure) => {
                tracing::error!(file = ?failure.file.original_name, error = %failure.error, "Upload request failed");
            }
            _ => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let error = self.to_string();
        let body = match self {
            ApiError::NoFiles => json!({ "error": error }),
            ApiError::TooManyFiles { limit } => json!({ "error": error, "limit": limit }),
            ApiError::UnexpectedField { field } => json!({ "error": error, "field": field }),
            ApiError::Malformed { message } | ApiError::PayloadTooLarge { message } => {
                json!({ "error": error, "details": message })
            }
            ApiError::Transfer(failure) => json!({ "error": error, "details": failure }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image_relay_core::contract::TransferError;
    use image_relay_core::model::FileEntry;

    #[test]
    fn orchestration_errors_map_to_statuses() {
        assert_eq!(ApiError::from(OrchestrateError::NoFiles).status_code(), StatusCode::BAD_REQUEST);

        let failure = UploadFailure {
            file: FileEntry::new("b.jpg", "image/jpeg", vec![0u8; 4]).file_ref(),
            error: TransferError::Network {
                message: "timed out".into(),
            },
        };
        assert_eq!(
            ApiError::from(OrchestrateError::Transfer(failure)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn too_many_files_is_a_client_error() {
        let err = ApiError::TooManyFiles { limit: 5 };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Too many files");
    }
}
