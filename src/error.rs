use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::dao::storage::StorageError;

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Caller is not a member of the targeted room.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Operation attempted outside its valid room or round state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Lost the race for the last open slot; the caller re-invokes `join`.
    #[error("room capacity exceeded: {0}")]
    CapacityExceeded(String),
    /// An invariant guaranteed elsewhere in the system does not hold.
    #[error("data integrity error: {0}")]
    Integrity(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Contended { message } => ServiceError::CapacityExceeded(message),
            unavailable => ServiceError::Unavailable(unavailable),
        }
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
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::CapacityExceeded(message) => AppError::Conflict(message),
            ServiceError::Integrity(message) => AppError::Internal(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn contended_storage_surfaces_as_retryable_conflict() {
        let err = StorageError::Contended {
            message: "matchmaking for quest `trio` exhausted 5 attempts".into(),
        };

        let service = ServiceError::from(err);
        assert!(matches!(service, ServiceError::CapacityExceeded(_)));
        let app = AppError::from(service);
        assert!(matches!(app, AppError::Conflict(_)));
        assert_eq!(
            app.into_response().status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn unavailable_storage_surfaces_as_service_unavailable() {
        let err = StorageError::unavailable(
            "ping failed".into(),
            io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        );

        let app = AppError::from(ServiceError::from(err));
        assert_eq!(
            app.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
