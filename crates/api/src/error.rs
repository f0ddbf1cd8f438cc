//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error response has the body `{"success": false, "message": "..."}`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::{ResourceError, UserError};

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource operation failed.
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// User operation failed.
    #[error("User error: {0}")]
    User(#[from] UserError),

    /// Malformed or incomplete request.
    #[error("{0}")]
    InvalidArgument(String),

    /// Resource or route not found.
    #[error("{0}")]
    NotFound(String),

    /// Operation unavailable in the current mode.
    #[error("{0}")]
    NotImplemented(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Resource(err) => match err {
                ResourceError::InvalidId(_) => StatusCode::BAD_REQUEST,
                ResourceError::NotFound(_) => StatusCode::NOT_FOUND,
                ResourceError::Conflict(_) => StatusCode::CONFLICT,
                ResourceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::User(err) => match err {
                UserError::MissingFields(_) => StatusCode::BAD_REQUEST,
                UserError::UserAlreadyExists => StatusCode::CONFLICT,
                UserError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                UserError::Repository(_) | UserError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
        }
    }

    /// Whether this is a failure of the server itself rather than of the request.
    ///
    /// Only these are reported to Sentry and have their details hidden.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Resource(ResourceError::Repository(_))
                | Self::User(UserError::Repository(_) | UserError::PasswordHash)
        )
    }

    /// Message safe to show to clients.
    #[must_use]
    pub fn client_message(&self) -> String {
        if self.is_internal() {
            // Don't expose internal error details to clients
            return "Internal server error".to_string();
        }
        match self {
            Self::Resource(err) => err.to_string(),
            Self::User(err) => err.to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture internal errors to Sentry
        if self.is_internal() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = Json(json!({
            "success": false,
            "message": self.client_message(),
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidArgument(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
