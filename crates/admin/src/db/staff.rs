//! Staff user repository.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use shopfront_core::{StaffRole, StaffUserId};

use super::{RepositoryError, contains_pattern, search_term};
use crate::models::StaffUser;

const STAFF_COLUMNS: &str = r"
    SELECT id, username, email, first_name, last_name, role, is_active,
           created_at, last_login_at
    FROM admin.staff_user
";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, FromRow)]
struct StaffRow {
    id: StaffUserId,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    role: StaffRole,
    is_active: bool,
    created_at: DateTime<Utc>,
    last_login_at: Option<DateTime<Utc>>,
}

impl From<StaffRow> for StaffUser {
    fn from(row: StaffRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            role: row.role,
            is_active: row.is_active,
            created_at: row.created_at,
            last_login_at: row.last_login_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct StaffWithHashRow {
    #[sqlx(flatten)]
    staff: StaffRow,
    password_hash: String,
}

/// Fields for a new staff account.
#[derive(Debug)]
pub struct NewStaff<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub role: StaffRole,
    pub password_hash: &'a str,
}

/// Editable fields of an existing account.
#[derive(Debug)]
pub struct StaffUpdate<'a> {
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub role: StaffRole,
    pub is_active: bool,
    /// Replaces the stored hash when present.
    pub password_hash: Option<&'a str>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for staff account database operations.
pub struct StaffRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StaffRepository<'a> {
    /// Create a new staff repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Count accounts matching `search` (username, email or name).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, search: Option<&str>) -> Result<i64, RepositoryError> {
        let mut qb =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM admin.staff_user WHERE TRUE");
        push_search(&mut qb, search);
        let count = qb.build_query_scalar::<i64>().fetch_one(self.pool).await?;
        Ok(count)
    }

    /// One page of accounts ordered by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StaffUser>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(STAFF_COLUMNS);
        qb.push(" WHERE TRUE");
        push_search(&mut qb, search);
        qb.push(" ORDER BY username LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows = qb.build_query_as::<StaffRow>().fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(StaffUser::from).collect())
    }

    /// Get an account by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: StaffUserId) -> Result<Option<StaffUser>, RepositoryError> {
        let sql = format!("{STAFF_COLUMNS} WHERE id = $1");
        let row = sqlx::query_as::<_, StaffRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(StaffUser::from))
    }

    /// Get an account and its password hash by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password_hash(
        &self,
        username: &str,
    ) -> Result<Option<(StaffUser, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, StaffWithHashRow>(
            r"
            SELECT id, username, email, first_name, last_name, role, is_active,
                   created_at, last_login_at, password_hash
            FROM admin.staff_user
            WHERE username = $1
            ",
        )
            .bind(username)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(|r| (StaffUser::from(r.staff), r.password_hash)))
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken.
    pub async fn create(&self, staff: &NewStaff<'_>) -> Result<StaffUser, RepositoryError> {
        let row = sqlx::query_as::<_, StaffRow>(
            r"
            INSERT INTO admin.staff_user
                (username, email, first_name, last_name, role, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, username, email, first_name, last_name, role, is_active,
                      created_at, last_login_at
            ",
        )
        .bind(staff.username)
        .bind(staff.email)
        .bind(staff.first_name)
        .bind(staff.last_name)
        .bind(staff.role)
        .bind(staff.password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            RepositoryError::unique_or_database(e, "A user with that username already exists.")
        })?;
        Ok(row.into())
    }

    /// Update an account's profile, role, status and optionally password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account does not exist.
    pub async fn update(
        &self,
        id: StaffUserId,
        update: &StaffUpdate<'_>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE admin.staff_user
            SET email = $2, first_name = $3, last_name = $4, role = $5,
                is_active = $6, password_hash = COALESCE($7, password_hash)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(update.email)
        .bind(update.first_name)
        .bind(update.last_name)
        .bind(update.role)
        .bind(update.is_active)
        .bind(update.password_hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Record a successful sign-in.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn touch_last_login(&self, id: StaffUserId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE admin.staff_user SET last_login_at = now() WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Whether any Admin-role account exists, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn admin_exists(&self) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM admin.staff_user WHERE role = $1)",
        )
        .bind(StaffRole::Admin)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }
}

fn push_search(qb: &mut QueryBuilder<'_, Postgres>, search: Option<&str>) {
    if let Some(term) = search_term(search) {
        let pattern = contains_pattern(term);
        qb.push(" AND (username ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_covers_names() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 WHERE TRUE");
        push_search(&mut qb, Some("tan"));
        let sql = qb.sql();
        assert!(sql.contains("username ILIKE $1"));
        assert!(sql.contains("last_name ILIKE $4"));
    }

    #[test]
    fn test_blank_search_adds_nothing() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 WHERE TRUE");
        push_search(&mut qb, Some("  "));
        assert_eq!(qb.sql(), "SELECT 1 WHERE TRUE");
    }
}
