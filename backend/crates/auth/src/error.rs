//! Auth Error Types
//!
//! Infrastructure-level failures live here. Flow-level outcomes (wrong
//! password, duplicate email, ...) are the per-operation error enums in
//! `application::account_service`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Session not found or expired
    #[error("Session not found or expired")]
    SessionInvalid,

    /// Privilege elevation required for this action
    #[error("Privilege elevation required")]
    ElevationRequired,

    /// Password hashing failed
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::SessionInvalid => StatusCode::UNAUTHORIZED,
            AuthError::ElevationRequired => StatusCode::FORBIDDEN,
            AuthError::PasswordHash(_) | AuthError::Database(_) | AuthError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show a caller; server-side detail stays in the log
    fn public_message(&self) -> &'static str {
        match self {
            AuthError::SessionInvalid => "Session not found or expired",
            AuthError::ElevationRequired => "Privilege elevation required",
            AuthError::PasswordHash(_) | AuthError::Database(_) | AuthError::Internal(_) => {
                "Something went wrong. Please try again or contact support."
            }
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::PasswordHash(msg) => {
                tracing::error!(message = %msg, "Password hashing error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::ElevationRequired => {
                tracing::warn!("Action attempted without privilege elevation");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        (
            self.status_code(),
            Json(json!({ "error": self.public_message() })),
        )
            .into_response()
    }
}

impl From<platform::password::PasswordHashError> for AuthError {
    fn from(err: platform::password::PasswordHashError) -> Self {
        AuthError::PasswordHash(err.to_string())
    }
}
