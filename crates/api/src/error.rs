//! Unified error handling for the API.
//!
//! Every handler returns `Result<T, ApiError>`; the `IntoResponse`
//! implementation turns each failure into the uniform JSON envelope
//! `{"success": false, "message": ...}` so no lower-layer error ever
//! escapes to the transport unwrapped.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{AuthError, CartError, CatalogError};

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),

    /// Not logged in, or bad credentials.
    #[error("{0}")]
    Auth(String),

    /// Logged in but lacking the required role.
    #[error("{0}")]
    Forbidden(String),

    /// Referenced entity absent.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate unique field. Reported as 400 by convention, not 409.
    #[error("{0}")]
    Conflict(String),

    /// Underlying store failure; the diagnostic is surfaced verbatim.
    #[error("Database error: {0}")]
    Storage(#[from] RepositoryError),

    /// Session store failure.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl ApiError {
    /// Generic rejection for an unrecognized (method, action) pair.
    #[must_use]
    pub fn invalid_action() -> Self {
        Self::Validation("Invalid action".to_owned())
    }

    /// Rejection for operations requiring a logged-in caller.
    #[must_use]
    pub fn login_required() -> Self {
        Self::Auth("Authentication required".to_owned())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Storage(_) | Self::Session(_)) {
            tracing::error!(error = %self, "Request error");
        }

        let status = match &self {
            Self::Validation(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(_) | Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidEmail(e) => Self::Validation(format!("Invalid email: {e}")),
            AuthError::WeakPassword(msg) => Self::Validation(msg),
            AuthError::InvalidCredentials => Self::Auth("Invalid credentials".to_owned()),
            AuthError::UserNotFound => Self::NotFound("User not found".to_owned()),
            AuthError::UserAlreadyExists => {
                Self::Conflict("Email or username already exists".to_owned())
            }
            AuthError::Repository(e) => Self::Storage(e),
            AuthError::PasswordHash => {
                Self::Storage(RepositoryError::DataCorruption("password hashing failed".to_owned()))
            }
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::EmptyQuery => Self::Validation("Search query is required".to_owned()),
            CatalogError::Repository(e) => Self::Storage(e),
        }
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::ProductNotFound => Self::NotFound("Product not found".to_owned()),
            CartError::InsufficientStock => Self::Validation("Insufficient stock".to_owned()),
            CartError::Repository(e) => Self::Storage(e),
        }
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;
