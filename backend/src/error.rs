//! Error handling for the workshop stock ledger server
//!
//! Every failure reaches the caller as a typed JSON error with a stable code

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::LedgerError;
use thiserror::Error;

/// Postgres SQLSTATEs for lock timeouts, serialization failures and deadlocks
const TRANSIENT_SQLSTATES: [&str; 3] = ["55P03", "40001", "40P01"];

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {message}")]
    Conflict { resource: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Ledger rule violations
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Inconsistent transfer: {0}")]
    InconsistentTransfer(String),

    // Database errors
    #[error("Persistence failure: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation { field, message } => AppError::Validation {
                field: field.to_string(),
                message,
            },
            LedgerError::NotFound { resource, .. } => AppError::NotFound(resource.to_string()),
            err @ LedgerError::InsufficientStock { .. } => AppError::InsufficientStock(err.to_string()),
            LedgerError::InconsistentTransfer(msg) => AppError::InconsistentTransfer(msg),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields: Vec<&str> = errors.field_errors().keys().copied().collect();
        AppError::ValidationError(format!("invalid fields: {}", fields.join(", ")))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl AppError {
    /// Field-level validation failure
    pub fn validation(field: &str, message: &str) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    fn is_transient_database_error(&self) -> bool {
        match self {
            AppError::DatabaseError(sqlx::Error::Database(db_err)) => db_err
                .code()
                .map(|code| TRANSIENT_SQLSTATES.iter().any(|s| *s == code))
                .unwrap_or(false),
            AppError::DatabaseError(sqlx::Error::PoolTimedOut) => true,
            _ => false,
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorDetail {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    field: Some(field.clone()),
                    ..ErrorDetail::new("VALIDATION_ERROR", message.clone())
                },
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("VALIDATION_ERROR", msg.clone()),
            ),
            AppError::Conflict { resource, message } => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    field: Some(resource.clone()),
                    ..ErrorDetail::new("CONFLICT", message.clone())
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource)),
            ),
            AppError::InsufficientStock(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new("INSUFFICIENT_STOCK", msg.clone()),
            ),
            AppError::InconsistentTransfer(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new("INCONSISTENT_TRANSFER", msg.clone()),
            ),
            AppError::DatabaseError(_) if self.is_transient_database_error() => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail::new(
                    "PERSISTENCE_FAILURE",
                    "The stock record is busy, please retry",
                ),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("PERSISTENCE_FAILURE", "A database error occurred"),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", msg.clone()),
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", "An internal server error occurred"),
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_ledger_errors_map_to_status_codes() {
        let cases = [
            (LedgerError::validation("quantity", "bad"), StatusCode::BAD_REQUEST),
            (LedgerError::not_found("Warehouse", Uuid::new_v4()), StatusCode::NOT_FOUND),
            (
                LedgerError::InsufficientStock {
                    spare_part_id: Uuid::new_v4(),
                    warehouse_id: Uuid::new_v4(),
                    available: 0,
                    requested: 1,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                LedgerError::InconsistentTransfer("same warehouse".to_string()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_pool_timeout_is_retryable() {
        let err = AppError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_row_not_found_is_persistence_failure() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
