//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! shopfront-cli migrate
//! ```
//!
//! Applies `migrations/` and then creates the default Admin account from
//! `SHOPFRONT_SUPERUSER_*` if no Admin exists yet.

use crate::commands::{connect, staff};
use crate::error::CliError;

/// Apply pending migrations, then run the superuser bootstrap.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Migrations complete");

    staff::bootstrap_with(&pool).await
}
