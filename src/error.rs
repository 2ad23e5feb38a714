// error.rs
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;
use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
    Validation(Vec<ValidationError>),

    #[error("Option ID is required.")]
    MissingFields,

    #[error("Unauthorized")]
    Unauthenticated,

    #[error("Forbidden")]
    Forbidden,

    #[error("Poll not found")]
    NotFound,

    #[error("You have already voted in this poll.")]
    DuplicateVote,

    // Backend detail goes to the log, never to the caller.
    #[error("A database error occurred.")]
    Persistence(#[source] StoreError),

    #[error("An unexpected error occurred.")]
    Unexpected(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            // The only unique constraint the application can trip is the
            // per-identity vote key; every generated id is a fresh v4.
            StoreError::UniqueViolation => AppError::DuplicateVote,
            other => AppError::Persistence(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Validation(_) | AppError::MissingFields => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::DuplicateVote => StatusCode::CONFLICT,
            AppError::Persistence(_) | AppError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            error!(error = ?self, "request failed");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_vote_is_a_conflict_not_a_fault() {
        let response = AppError::from(StoreError::UniqueViolation).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn backend_failures_surface_a_generic_message() {
        let err = AppError::from(StoreError::Unavailable("connection reset".to_string()));
        assert_eq!(err.to_string(), "A database error occurred.");
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_messages_are_joined_for_the_caller() {
        let err = AppError::Validation(vec![
            ValidationError::TitleLength { len: 5 },
            ValidationError::OptionCount { count: 1 },
        ]);
        let msg = err.to_string();
        assert!(msg.contains("title"));
        assert!(msg.contains("options"));
        assert!(msg.contains(", "));
    }
}
