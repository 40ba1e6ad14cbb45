//! CLI error type.

use std::path::PathBuf;

use shopfront_admin::services::AuthError;
use shopfront_admin::services::import::ImportError;
use shopfront_storefront::recommender::RecommenderError;
use thiserror::Error;

/// Errors that abort a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Database error: {0}")]
    AdminRepository(#[from] shopfront_admin::db::RepositoryError),

    #[error("Database error: {0}")]
    StorefrontRepository(#[from] shopfront_storefront::db::RepositoryError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Staff details were rejected; one `field: message` entry per problem.
    #[error("Invalid staff account: {}", .0.join("; "))]
    InvalidStaff(Vec<String>),

    #[error("Import failed: {0}")]
    Import(#[from] ImportError),

    #[error("Training failed: {0}")]
    Recommender(#[from] RecommenderError),

    #[error("Cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot serialize model: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
