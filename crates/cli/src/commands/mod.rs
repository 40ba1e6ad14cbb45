//! Command implementations.
//!
//! Every command reads `DATABASE_URL` (after loading `.env`) and opens its
//! own small pool.

pub mod import;
pub mod migrate;
pub mod staff;
pub mod train;

use std::path::Path;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::error::CliError;

/// Connect to the database named by `DATABASE_URL`.
pub async fn connect() -> Result<PgPool, CliError> {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| CliError::MissingEnvVar("DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await?;
    Ok(pool)
}

/// Read a whole input file.
pub async fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| CliError::io(path, e))
}

/// Write `bytes` to `path`, creating parent directories.
pub async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| CliError::io(parent, e))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| CliError::io(path, e))
}
