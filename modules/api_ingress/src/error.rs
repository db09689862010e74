use std::any::Any;

use axum::{
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message returned for every 5xx; internal details stay in the logs.
pub const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Internal Server Error";

/// Standard API error body: `{ "error": <message> }`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Host-level HTTP error taxonomy shared by every module router.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("HTTP method is not supported")]
    MethodNotAllowed,
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "request failed with internal error");
                INTERNAL_SERVER_ERROR_MESSAGE.to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

/// Router fallback for any path no module claims.
pub async fn path_not_found(uri: Uri) -> AppError {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    AppError::NotFound(format!("{target} path does not exist"))
}

/// Method fallback for module routes.
pub async fn method_not_supported() -> AppError {
    AppError::MethodNotAllowed
}

/// Response rendered when a handler panics.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = %detail, "handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(INTERNAL_SERVER_ERROR_MESSAGE)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_taxonomy() {
        assert_eq!(AppError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("disk full")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn path_not_found_keeps_query() {
        let uri: Uri = "/nope?x=1".parse().unwrap();
        let err = path_not_found(uri).await;
        assert_eq!(err.to_string(), "/nope?x=1 path does not exist");
    }

    #[test]
    fn panic_response_hides_payload() {
        let resp = panic_response(Box::new("secret detail".to_string()));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
