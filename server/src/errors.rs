use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use jobrank_core::MatchError;
use serde_json::json;
use thiserror::Error;

/// Handler error. Maps core failures onto HTTP statuses.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Match(#[from] MatchError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Match(MatchError::InvalidArgument(msg)) => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", msg.clone()),
            AppError::Match(MatchError::EmptyCorpus) => (StatusCode::CONFLICT, "EMPTY_CORPUS", "No job postings are loaded".to_string()),
            AppError::Match(e @ MatchError::Connection { .. }) => {
                tracing::error!("posting store unreachable: {e}");
                (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNREACHABLE", "The posting store is unreachable".to_string())
            }
            AppError::Match(e @ MatchError::Store(_)) => {
                tracing::error!("posting store error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR", "A posting store error occurred".to_string())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "UNPROCESSABLE_ENTITY", msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "An internal server error occurred".to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
