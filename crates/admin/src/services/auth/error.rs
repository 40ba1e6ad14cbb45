//! Staff authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during staff authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username, wrong password or inactive account.
    #[error("Please enter a correct username and password.")]
    InvalidCredentials,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
