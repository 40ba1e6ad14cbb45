//! Default superuser bootstrap.
//!
//! Creates an Admin account from `SHOPFRONT_SUPERUSER_*` when no Admin exists
//! yet. Without a password the bootstrap is skipped.

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;

use shopfront_core::{Email, StaffRole};

use super::auth::{AuthError, AuthService};
use super::staff::ValidStaff;
use crate::db::StaffRepository;

const DEFAULT_USERNAME: &str = "admin";
const DEFAULT_EMAIL: &str = "admin@example.com";

/// Superuser details read from the environment.
#[derive(Debug, Clone)]
pub struct SuperuserSettings {
    pub username: String,
    pub email: String,
    pub password: Option<SecretString>,
}

impl SuperuserSettings {
    /// Read `SHOPFRONT_SUPERUSER_USERNAME`, `SHOPFRONT_SUPERUSER_EMAIL` and
    /// `SHOPFRONT_SUPERUSER_PASSWORD`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            username: get("SHOPFRONT_SUPERUSER_USERNAME")
                .unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
            email: get("SHOPFRONT_SUPERUSER_EMAIL").unwrap_or_else(|| DEFAULT_EMAIL.to_string()),
            password: get("SHOPFRONT_SUPERUSER_PASSWORD").map(SecretString::from),
        }
    }
}

/// What the bootstrap did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Created { username: String },
    AdminExists,
    NoPassword,
    InvalidEmail,
}

/// Create the default Admin account if none exists.
///
/// # Errors
///
/// Returns `AuthError::Repository` if the database fails, or
/// `AuthError::PasswordHash` if hashing fails.
pub async fn bootstrap_superuser(
    pool: &PgPool,
    settings: &SuperuserSettings,
) -> Result<BootstrapOutcome, AuthError> {
    let Some(password) = settings.password.as_ref() else {
        tracing::warn!("SHOPFRONT_SUPERUSER_PASSWORD is not set; skipping superuser bootstrap");
        return Ok(BootstrapOutcome::NoPassword);
    };

    if StaffRepository::new(pool).admin_exists().await? {
        tracing::info!("Admin account already exists; skipping superuser bootstrap");
        return Ok(BootstrapOutcome::AdminExists);
    }

    let email = match Email::parse(&settings.email) {
        Ok(email) => email,
        Err(e) => {
            tracing::warn!(email = %settings.email, error = %e, "Invalid superuser email; skipping superuser bootstrap");
            return Ok(BootstrapOutcome::InvalidEmail);
        }
    };

    let user = AuthService::new(pool)
        .create_account(&ValidStaff {
            username: settings.username.trim().to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email,
            role: StaffRole::Admin,
            password: password.expose_secret().to_string(),
        })
        .await?;

    Ok(BootstrapOutcome::Created {
        username: user.username,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_password() {
        let settings = SuperuserSettings::from_lookup(lookup(&[]));
        assert_eq!(settings.username, "admin");
        assert_eq!(settings.email, "admin@example.com");
        assert!(settings.password.is_none());
    }

    #[test]
    fn test_blank_values_are_unset() {
        let settings = SuperuserSettings::from_lookup(lookup(&[
            ("SHOPFRONT_SUPERUSER_USERNAME", "root"),
            ("SHOPFRONT_SUPERUSER_EMAIL", " "),
            ("SHOPFRONT_SUPERUSER_PASSWORD", "open-sesame"),
        ]));
        assert_eq!(settings.username, "root");
        assert_eq!(settings.email, "admin@example.com");
        assert_eq!(
            settings.password.unwrap().expose_secret(),
            "open-sesame"
        );
    }

    #[tokio::test]
    async fn test_skips_without_password() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let settings = SuperuserSettings::from_lookup(lookup(&[]));
        let outcome = bootstrap_superuser(&pool, &settings).await.unwrap();
        assert_eq!(outcome, BootstrapOutcome::NoPassword);
    }
}
