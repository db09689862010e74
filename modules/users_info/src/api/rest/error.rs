use api_ingress::AppError;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::domain::error::StorageError;

/// Failures a users request can end in, mapped onto the host error envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Provided id is not a valid id (uuid)")]
    InvalidId,

    #[error("User data has incorrect format")]
    InvalidPayload,

    #[error("User with id {id} not found")]
    NotFound { id: String },

    #[error("User with id {id} does not exist")]
    DeleteTargetMissing { id: String },

    #[error("failed to read request body")]
    Stream(#[source] axum::Error),

    #[error("request body is not valid JSON")]
    Parse(#[source] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ApiError> for AppError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::InvalidId | ApiError::InvalidPayload => AppError::BadRequest(e.to_string()),
            ApiError::NotFound { .. } | ApiError::DeleteTargetMissing { .. } => {
                AppError::NotFound(e.to_string())
            }
            // Details go to the log only; the client sees the generic 500 body
            ApiError::Stream(_) | ApiError::Parse(_) | ApiError::Storage(_) => {
                AppError::Internal(anyhow::Error::new(e))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}
