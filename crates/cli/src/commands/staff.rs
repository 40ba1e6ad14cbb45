//! Staff account commands.
//!
//! # Usage
//!
//! ```bash
//! # Create an account (password from --password or SHOPFRONT_STAFF_PASSWORD)
//! shopfront-cli staff create --username lee --email lee@example.com --role inventory
//!
//! # Create the default Admin from SHOPFRONT_SUPERUSER_* if none exists
//! shopfront-cli staff bootstrap
//! ```

use std::convert::Infallible;

use clap::Args;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;

use shopfront_admin::db::RepositoryError;
use shopfront_admin::services::bootstrap::{
    BootstrapOutcome, SuperuserSettings, bootstrap_superuser,
};
use shopfront_admin::services::staff::StaffCreateForm;
use shopfront_admin::services::{AuthError, AuthService, FieldErrors};
use shopfront_core::StaffRole;

use crate::commands::connect;
use crate::error::CliError;

/// Arguments for `staff create`.
#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(short, long)]
    pub username: String,

    #[arg(short, long)]
    pub email: String,

    /// One of admin, manager, inventory, merchandiser, support
    #[arg(short, long)]
    pub role: String,

    #[arg(long, env = "SHOPFRONT_STAFF_PASSWORD", hide_env_values = true, value_parser = secret)]
    pub password: Option<SecretString>,

    #[arg(long, default_value = "")]
    pub first_name: String,

    #[arg(long, default_value = "")]
    pub last_name: String,
}

#[allow(clippy::unnecessary_wraps)]
fn secret(value: &str) -> Result<SecretString, Infallible> {
    Ok(SecretString::from(value))
}

impl CreateArgs {
    /// The same form the admin panel validates, with the password entered twice.
    fn to_form(&self) -> StaffCreateForm {
        let password = self
            .password
            .as_ref()
            .map(|p| p.expose_secret().to_string())
            .unwrap_or_default();
        StaffCreateForm {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            password1: password.clone(),
            password2: password,
        }
    }
}

/// Render form errors with CLI names for the fields.
fn describe_errors(errors: &FieldErrors) -> Vec<String> {
    errors
        .iter()
        .filter(|(field, _)| **field != "password2")
        .map(|(field, message)| match *field {
            "password1" => format!("password: {message}"),
            "role" => {
                let roles: Vec<&str> = StaffRole::ALL.iter().map(|r| r.as_str()).collect();
                format!("role: {message} Valid roles: {}", roles.join(", "))
            }
            _ => format!("{field}: {message}"),
        })
        .collect()
}

/// Create a staff account.
pub async fn create(args: &CreateArgs) -> Result<(), CliError> {
    let valid = args
        .to_form()
        .validate()
        .map_err(|errors| CliError::InvalidStaff(describe_errors(&errors)))?;

    let pool = connect().await?;
    tracing::info!("Creating staff account: {} ({})", valid.username, valid.role.as_str());

    match AuthService::new(&pool).create_account(&valid).await {
        Ok(user) => {
            tracing::info!(
                "Staff account created! ID: {}, Username: {}, Role: {}",
                user.id,
                user.username,
                user.role.label()
            );
            Ok(())
        }
        Err(AuthError::Repository(RepositoryError::Conflict(message))) => {
            Err(CliError::InvalidStaff(vec![format!("username: {message}")]))
        }
        Err(e) => Err(e.into()),
    }
}

/// Run the superuser bootstrap on its own.
pub async fn bootstrap() -> Result<(), CliError> {
    let pool = connect().await?;
    bootstrap_with(&pool).await
}

/// Run the superuser bootstrap against an open pool.
pub async fn bootstrap_with(pool: &PgPool) -> Result<(), CliError> {
    match bootstrap_superuser(pool, &SuperuserSettings::from_env()).await? {
        BootstrapOutcome::Created { username } => {
            tracing::info!("Superuser '{username}' created");
        }
        BootstrapOutcome::AdminExists | BootstrapOutcome::NoPassword => {}
        BootstrapOutcome::InvalidEmail => {
            tracing::warn!("Superuser not created: SHOPFRONT_SUPERUSER_EMAIL is invalid");
        }
    }
    Ok(())
}
