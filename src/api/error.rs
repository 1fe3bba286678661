//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::appointments::AppointmentError;
use crate::auth::AuthError;
use crate::db::DatabaseError;
use crate::fiche::FicheError;
use crate::storage::StorageError;
use crate::users::UserError;
use crate::verification::VerificationError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                "Authentication required".to_string(),
            ),
            ApiError::Forbidden(detail) => (StatusCode::FORBIDDEN, "FORBIDDEN", detail.clone()),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone()),
            ApiError::Conflict(detail) => (StatusCode::CONFLICT, "CONFLICT", detail.clone()),
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone())
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match &err {
            DatabaseError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DatabaseError::InvalidEnum { .. } => ApiError::BadRequest(err.to_string()),
            _ if err.is_unique_violation() => ApiError::Conflict(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match &err {
            StorageError::InvalidFilename(_) => ApiError::BadRequest(err.to_string()),
            StorageError::NotFound(_) => ApiError::NotFound(err.to_string()),
            StorageError::Io { .. } => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::UnknownRole(_)
            | AuthError::PasswordTooShort
            | AuthError::InvalidActivationCode
            | AuthError::ActivationCodeExpired => ApiError::BadRequest(err.to_string()),
            AuthError::EmailTaken => ApiError::Conflict(err.to_string()),
            AuthError::UserNotFound => ApiError::NotFound(err.to_string()),
            AuthError::AccountDisabled | AuthError::AccountLocked | AuthError::BadCredentials => {
                ApiError::Forbidden(err.to_string())
            }
            AuthError::InvalidBearerToken => ApiError::Unauthorized,
            AuthError::Hash(_) => ApiError::Internal(err.to_string()),
            AuthError::Database(db) => db.into(),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound
            | UserError::DoctorNotFound
            | UserError::SecretaryNotFound
            | UserError::NoAssignedDoctor => ApiError::NotFound(err.to_string()),
            UserError::EmailTaken => ApiError::Conflict(err.to_string()),
            UserError::IncorrectCurrentPassword
            | UserError::AlreadyAssigned
            | UserError::TargetNotADoctor
            | UserError::InvalidAction => ApiError::BadRequest(err.to_string()),
            UserError::NotASecretary | UserError::NotADoctor | UserError::NotYourSecretary => {
                ApiError::Forbidden(err.to_string())
            }
            UserError::Storage(storage) => storage.into(),
            UserError::Auth(auth) => auth.into(),
            UserError::Database(db) => db.into(),
        }
    }
}

impl From<AppointmentError> for ApiError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::PatientNotFound
            | AppointmentError::DoctorNotFound
            | AppointmentError::NotFound
            | AppointmentError::SecretaryNotFound => ApiError::NotFound(err.to_string()),
            AppointmentError::SecretaryUnassigned
            | AppointmentError::SecretaryNotAuthorized
            | AppointmentError::NotAuthorized
            | AppointmentError::NotTheDoctor => ApiError::Forbidden(err.to_string()),
            AppointmentError::InvalidTransition { .. }
            | AppointmentError::InvalidRecordPayload(_) => ApiError::BadRequest(err.to_string()),
            AppointmentError::Storage(storage) => storage.into(),
            AppointmentError::Database(db) => db.into(),
        }
    }
}

impl From<FicheError> for ApiError {
    fn from(err: FicheError) -> Self {
        match err {
            FicheError::NotFound | FicheError::NoDocument => ApiError::NotFound(err.to_string()),
            FicheError::EmptyFile | FicheError::UnsupportedDocumentType => {
                ApiError::BadRequest(err.to_string())
            }
            FicheError::Storage(storage) => storage.into(),
            FicheError::Database(db) => db.into(),
        }
    }
}

impl From<VerificationError> for ApiError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::NotFound => ApiError::NotFound(err.to_string()),
            VerificationError::NotADoctor => ApiError::Forbidden(err.to_string()),
            VerificationError::AlreadyApproved | VerificationError::UnknownSpecialty(_) => {
                ApiError::BadRequest(err.to_string())
            }
            VerificationError::Storage(storage) => storage.into(),
            VerificationError::Database(db) => db.into(),
        }
    }
}
