use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::credentials::CredentialError;
use crate::store::StoreError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// Failure taxonomy shared by every service and surfaced over HTTP.
#[derive(Error, Debug)]
pub enum ClinicError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClinicError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClinicError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ClinicError::NotFound(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            ClinicError::Validation(_) => "VALIDATION_ERROR",
            ClinicError::NotFound(_) => "NOT_FOUND",
            ClinicError::Conflict(_) => "CONFLICT",
            ClinicError::Auth(_) => "AUTH_REQUIRED",
            ClinicError::Forbidden(_) => "FORBIDDEN",
            ClinicError::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ClinicError::Validation(_) => StatusCode::BAD_REQUEST,
            ClinicError::NotFound(_) => StatusCode::NOT_FOUND,
            ClinicError::Conflict(_) => StatusCode::CONFLICT,
            ClinicError::Auth(_) => StatusCode::UNAUTHORIZED,
            ClinicError::Forbidden(_) => StatusCode::FORBIDDEN,
            ClinicError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ClinicError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = match self {
            ClinicError::Internal(detail) => {
                log::error!("Internal error: {}", detail);
                "An internal error occurred".to_string()
            }
            ClinicError::Validation(message)
            | ClinicError::NotFound(message)
            | ClinicError::Conflict(message)
            | ClinicError::Auth(message)
            | ClinicError::Forbidden(message) => message,
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ClinicError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SlotTaken => {
                ClinicError::Conflict("doctor already has an appointment at this time".into())
            }
            StoreError::DuplicateEmail => {
                ClinicError::Conflict("patient with this email already exists".into())
            }
            StoreError::Database(e) => ClinicError::Internal(e.to_string()),
        }
    }
}

impl From<CredentialError> for ClinicError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::InvalidToken(reason) => ClinicError::Auth(reason.to_string()),
            CredentialError::Expired => ClinicError::Auth("token expired".into()),
            other => ClinicError::Internal(other.to_string()),
        }
    }
}
