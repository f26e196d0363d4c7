//! Error types for Libris server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::models::loan::LoanStatus;

/// Main application error type.
///
/// Loan-engine failures each get their own variant so callers can match on
/// the kind instead of parsing message strings.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Cannot transition from '{from}' to '{to}'")]
    InvalidTransition { from: LoanStatus, to: LoanStatus },

    #[error("Maximum of {0} active loans reached")]
    CapacityExceeded(u32),

    #[error("No available copies of this book")]
    Unavailable,

    #[error("Book does not belong to the specified branch")]
    BranchMismatch,

    #[error("Concurrent modification detected: {0}")]
    ConcurrencyConflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable kind, used in the JSON error envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Authentication(_) => "authentication",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation",
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::CapacityExceeded(_) => "capacity_exceeded",
            AppError::Unavailable => "unavailable",
            AppError::BranchMismatch => "branch_mismatch",
            AppError::ConcurrencyConflict(_) => "concurrency_conflict",
            AppError::Database(_) => "database",
            AppError::Internal(_) => "internal",
        }
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Authentication(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::InvalidTransition { .. }
            | AppError::CapacityExceeded(_)
            | AppError::Unavailable
            | AppError::BranchMismatch => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::ConcurrencyConflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: self.kind().to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_names_both_statuses() {
        let err = AppError::InvalidTransition {
            from: LoanStatus::Returned,
            to: LoanStatus::Borrowed,
        };
        let msg = err.to_string();
        assert!(msg.contains("returned"));
        assert!(msg.contains("borrowed"));
    }

    #[test]
    fn kinds_are_distinct_for_loan_engine_errors() {
        let errs = [
            AppError::NotFound("Loan".into()),
            AppError::Forbidden("nope".into()),
            AppError::InvalidTransition {
                from: LoanStatus::Requested,
                to: LoanStatus::Returned,
            },
            AppError::CapacityExceeded(5),
            AppError::Unavailable,
            AppError::BranchMismatch,
            AppError::ConcurrencyConflict("retry".into()),
        ];
        let mut kinds: Vec<_> = errs.iter().map(|e| e.kind()).collect();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), errs.len());
    }
}
