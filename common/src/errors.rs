//! Service error type.
//!
//! Every handler returns `AppResult<T>`; `AppError` renders itself as an
//! [`ApiResponse`] error envelope with the matching HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::auth::{AuthError, AuthorizationError, HashingError};
use crate::response::ApiResponse;

/// Result alias used across services.
pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Request body or parameters failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Malformed path or query parameter.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Resource does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// No valid credential on the request.
    #[error(transparent)]
    Unauthenticated(#[from] AuthError),

    /// Login with an unknown email or a wrong password.
    #[error("incorrect email or password")]
    InvalidLogin,

    /// Authenticated, but not allowed to touch this resource.
    #[error(transparent)]
    Forbidden(#[from] AuthorizationError),

    /// Unique constraint or similar conflict.
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Hashing(#[from] HashingError),

    #[error("database query failed: {0}")]
    DatabaseQuery(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthenticated(_) | AppError::InvalidLogin => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Hashing(_) | AppError::DatabaseQuery(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Error code for client handling.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Unauthenticated(_) | AppError::InvalidLogin => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Hashing(_) | AppError::DatabaseQuery(_) | AppError::Internal(_) => {
                "INTERNAL_ERROR"
            }
        }
    }

    /// Message shown to the client.
    ///
    /// Authentication, authorization and server failures never say which
    /// check failed.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Unauthenticated(_) => "unauthorized".to_string(),
            AppError::Forbidden(_) => "forbidden".to_string(),
            AppError::Hashing(_) | AppError::DatabaseQuery(_) | AppError::Internal(_) => {
                "internal server error".to_string()
            }
            AppError::Validation(msg) | AppError::BadRequest(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        let body = ApiResponse::err(self.code(), self.public_message());
        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_values()
            .flat_map(|errs| errs.iter())
            .map(|e| match &e.message {
                Some(msg) => msg.to_string(),
                None => e.code.to_string(),
            })
            .collect();
        messages.sort();
        messages.dedup();
        AppError::Validation(messages.join("; "))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        crate::utils::format_error::from_sqlx(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{SubjectId, TokenError};

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Unauthenticated(AuthError::MissingCredential).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::InvalidLogin.status(), StatusCode::UNAUTHORIZED);
        let denied = AuthorizationError::OwnerMismatch {
            subject: SubjectId::new(1),
            owner: SubjectId::new(2),
        };
        assert_eq!(AppError::Forbidden(denied).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("post".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Validation("title required".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_auth_failures_share_public_message() {
        let expired = AppError::Unauthenticated(AuthError::InvalidCredential(TokenError::Expired));
        let forged =
            AppError::Unauthenticated(AuthError::InvalidCredential(TokenError::SignatureInvalid));
        let missing = AppError::Unauthenticated(AuthError::MissingCredential);
        assert_eq!(expired.public_message(), "unauthorized");
        assert_eq!(forged.public_message(), expired.public_message());
        assert_eq!(missing.public_message(), expired.public_message());
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = AppError::DatabaseQuery("no such table: posts".into());
        assert_eq!(err.public_message(), "internal server error");
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }
}
