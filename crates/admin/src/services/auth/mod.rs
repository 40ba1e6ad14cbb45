//! Staff authentication service.
//!
//! Username and password sign-in, hashed with Argon2id. Inactive accounts
//! are refused with the same message as a wrong password.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use crate::db::StaffRepository;
use crate::db::staff::NewStaff;
use crate::models::StaffUser;
use crate::services::staff::ValidStaff;

/// Staff authentication service.
pub struct AuthService<'a> {
    staff: StaffRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            staff: StaffRepository::new(pool),
        }
    }

    /// Sign in with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username is unknown,
    /// the password is wrong or the account is inactive.
    pub async fn login(&self, username: &str, password: &str) -> Result<StaffUser, AuthError> {
        let (user, password_hash) = self
            .staff
            .get_with_password_hash(username.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if !user.is_active {
            tracing::warn!(username = %user.username, "Inactive staff account refused");
            return Err(AuthError::InvalidCredentials);
        }

        self.staff.touch_last_login(user.id).await?;

        Ok(user)
    }

    /// Hash the password and store a new account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` wrapping `RepositoryError::Conflict`
    /// if the username is taken.
    pub async fn create_account(&self, staff: &ValidStaff) -> Result<StaffUser, AuthError> {
        let password_hash = hash_password(&staff.password)?;
        let user = self
            .staff
            .create(&NewStaff {
                username: &staff.username,
                email: staff.email.as_str(),
                first_name: &staff.first_name,
                last_name: &staff.last_name,
                role: staff.role,
                password_hash: &password_hash,
            })
            .await?;
        tracing::info!(username = %user.username, role = %user.role.as_str(), "Staff account created");
        Ok(user)
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` on mismatch or an unreadable hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("stockroom-key").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("stockroom-key", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_unreadable_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", ""),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
