use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::storage::StorageError,
    state::{countdown::InvalidTimerAction, molkky::GameError},
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend failed.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// The caller did not identify itself.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Payload rejected by its validation rules.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<GameError> for ServiceError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::PlayerNotFound(_) => ServiceError::NotFound(err.to_string()),
            GameError::GameOver | GameError::NoScores(_) => {
                ServiceError::InvalidState(err.to_string())
            }
        }
    }
}

impl From<InvalidTimerAction> for ServiceError {
    fn from(err: InvalidTimerAction) -> Self {
        ServiceError::InvalidState(err.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Missing or blank user identity.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Storage unavailable.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::Validation(errors) => errors.into(),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::state::countdown::TimerPhase;

    #[test]
    fn engine_errors_map_to_http_statuses() {
        let missing: AppError = ServiceError::from(GameError::PlayerNotFound(Uuid::nil())).into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let over: AppError = ServiceError::from(GameError::GameOver).into();
        assert_eq!(over.status(), StatusCode::CONFLICT);

        let paused: AppError = ServiceError::from(InvalidTimerAction {
            action: "pause",
            phase: TimerPhase::Idle,
        })
        .into();
        assert_eq!(paused.status(), StatusCode::CONFLICT);
        assert_eq!(paused.to_string(), "conflict: cannot pause a timer that is Idle");
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        let errors = ValidationErrors::new();
        let err: AppError = ServiceError::Validation(errors).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
