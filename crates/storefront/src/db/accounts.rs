//! Storefront account repository.
//!
//! An account is a login (email + password hash) bound one-to-one to a
//! customer record.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use shopfront_core::{AccountId, CustomerId, Email};

use super::RepositoryError;
use crate::models::Account;

#[derive(Debug, FromRow)]
struct AccountRow {
    id: AccountId,
    email: Email,
    customer_id: CustomerId,
    first_name: Option<String>,
    last_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            customer_id: row.customer_id,
            first_name: row.first_name,
            last_name: row.last_name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct AccountWithHashRow {
    #[sqlx(flatten)]
    account: AccountRow,
    password_hash: String,
}

/// New account details.
#[derive(Debug)]
pub struct NewAccount<'a> {
    pub email: &'a Email,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

/// Repository for account database operations.
pub struct AccountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AccountRepository<'a> {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a customer record and its login in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_customer(
        &self,
        new: &NewAccount<'_>,
    ) -> Result<Account, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let customer_id: CustomerId = sqlx::query_scalar(
            r"
            INSERT INTO shop.customer (first_name, last_name, email)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(new.first_name)
        .bind(new.last_name)
        .bind(new.email)
        .fetch_one(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, AccountRow>(
            r"
            WITH inserted AS (
                INSERT INTO shop.customer_account (email, password_hash, customer_id)
                VALUES ($1, $2, $3)
                RETURNING id, email, customer_id, created_at
            )
            SELECT i.id, i.email, i.customer_id, c.first_name, c.last_name, i.created_at
            FROM inserted i
            JOIN shop.customer c ON c.id = i.customer_id
            ",
        )
        .bind(new.email)
        .bind(new.password_hash)
        .bind(customer_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::unique_or_database(e, "email already exists"))?;

        tx.commit().await?;

        Ok(Account::from(row))
    }

    /// Get an account and its password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(Account, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountWithHashRow>(
            r"
            SELECT a.id, a.email, a.customer_id, c.first_name, c.last_name,
                   a.created_at, a.password_hash
            FROM shop.customer_account a
            JOIN shop.customer c ON c.id = a.customer_id
            WHERE a.email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| (Account::from(r.account), r.password_hash)))
    }

    /// Record a successful login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn touch_last_login(&self, id: AccountId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE shop.customer_account SET last_login_at = now() WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
