//! Database operations for the admin panel.
//!
//! # Schemas
//!
//! - `shop` - catalogue, customers and orders, shared with the storefront.
//!   The admin panel writes the catalogue and stock; customers and orders
//!   are read only here apart from CLI imports.
//! - `admin` - `staff_user` accounts and the `session` store.
//!
//! # Migrations
//!
//! Migrations are stored in the workspace `migrations/` directory and run via:
//! ```bash
//! cargo run -p shopfront-cli -- migrate
//! ```

pub mod categories;
pub mod customers;
pub mod dashboard;
pub mod products;
pub mod staff;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use categories::CategoryRepository;
pub use customers::CustomerRepository;
pub use dashboard::DashboardRepository;
pub use products::ProductRepository;
pub use staff::StaffRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate SKU, product with orders).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique violation to `Conflict(message)`, anything else to `Database`.
    pub(crate) fn unique_or_database(e: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(e)
    }

    /// Map a foreign-key violation to `Conflict(message)`, anything else to `Database`.
    pub(crate) fn foreign_key_or_database(e: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_foreign_key_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Build an `ILIKE` pattern matching `term` anywhere, with wildcards escaped.
#[must_use]
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Trimmed search term, `None` when blank.
pub(crate) fn search_term(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("cable"), "%cable%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
    }

    #[test]
    fn test_search_term_ignores_blank() {
        assert_eq!(search_term(None), None);
        assert_eq!(search_term(Some("   ")), None);
        assert_eq!(search_term(Some(" tan ")), Some("tan"));
    }

    #[test]
    fn test_conflict_mapping_passes_other_errors_through() {
        let err = RepositoryError::unique_or_database(sqlx::Error::RowNotFound, "dup");
        assert!(matches!(err, RepositoryError::Database(_)));
        let err = RepositoryError::foreign_key_or_database(sqlx::Error::RowNotFound, "fk");
        assert!(matches!(err, RepositoryError::Database(_)));
    }
}
