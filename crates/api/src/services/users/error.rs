//! User service error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during user registration and login.
#[derive(Debug, Error)]
pub enum UserError {
    /// A required field is absent or empty. Carries the client-facing message.
    #[error("{0}")]
    MissingFields(&'static str),

    /// User already exists.
    #[error("User already exists")]
    UserAlreadyExists,

    /// Invalid credentials (wrong password or user not found).
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
