use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sqlx::error::ErrorKind;
use thiserror::Error;
use tracing::{error, warn};

use crate::models::AllocationError;
use crate::utils::response::error as error_response;
use crate::validation::Violations;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(Violations),

    #[error("Duplicate natural key (constraint {constraint})")]
    UniqueViolation { constraint: String },

    #[error("Referential integrity violation: {0}")]
    ReferentialIntegrity(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Seat allocation failed: {0}")]
    SeatAllocation(#[from] AllocationError),

    #[error("Database error")]
    Database(#[source] sqlx::Error),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::UniqueViolation { .. } => StatusCode::CONFLICT,
            AppError::ReferentialIntegrity(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::SeatAllocation(_) => StatusCode::CONFLICT,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::UniqueViolation { .. } => "UNIQUE_VIOLATION",
            AppError::ReferentialIntegrity(_) => "REFERENTIAL_INTEGRITY",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::SeatAllocation(_) => "SEAT_ALLOCATION",
            AppError::Database(_) => "DATABASE_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::Database(e) => error!(error = ?e, "Database error"),
            AppError::NotFound(what) => warn!(%what, "Not found"),
            other => warn!(code = other.code(), error = %other, "Request rejected"),
        }
    }
}

impl From<Violations> for AppError {
    fn from(violations: Violations) -> Self {
        AppError::Validation(violations)
    }
}

// Ошибки ограничений БД переводим в доменные, остальное отдаём как есть.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::RowNotFound = err {
            return AppError::NotFound("row".to_string());
        }
        if let sqlx::Error::Database(db) = &err {
            let constraint = db.constraint().unwrap_or("unknown").to_string();
            match db.kind() {
                ErrorKind::UniqueViolation => return AppError::UniqueViolation { constraint },
                ErrorKind::ForeignKeyViolation => {
                    return AppError::ReferentialIntegrity(format!(
                        "{} (constraint {constraint})",
                        db.message()
                    ))
                }
                ErrorKind::NotNullViolation | ErrorKind::CheckViolation => {
                    let mut violations = Violations::new();
                    violations.push(constraint, "constraint", db.message());
                    return AppError::Validation(violations);
                }
                _ => {}
            }
        }
        AppError::Database(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        self.log();

        let details = match &self {
            AppError::Validation(violations) => serde_json::to_value(violations).ok(),
            _ => None,
        };

        // Детали ошибок БД наружу не отдаём
        let public_message = match &self {
            AppError::Database(_) => "A database error occurred".to_string(),
            other => other.to_string(),
        };

        error_response(code, public_message, details, status)
    }
}
