//! Customer profile repository.

use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use shopfront_core::CustomerId;

use super::RepositoryError;
use crate::models::{CustomerProfile, ProfileUpdate};

#[derive(Debug, FromRow)]
struct CustomerRow {
    id: CustomerId,
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    address: Option<String>,
    postal_code: Option<String>,
    age: i32,
    gender: String,
    employment_status: String,
    occupation: String,
    education: String,
    household_size: i32,
    has_children: i32,
    monthly_income: Decimal,
    preferred_category: String,
}

impl From<CustomerRow> for CustomerProfile {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            email: row.email,
            address: row.address,
            postal_code: row.postal_code,
            age: row.age,
            gender: row.gender,
            employment_status: row.employment_status,
            occupation: row.occupation,
            education: row.education,
            household_size: row.household_size,
            has_children: row.has_children != 0,
            monthly_income: row.monthly_income,
            preferred_category: row.preferred_category,
        }
    }
}

/// Repository for customer profile reads and edits.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a customer profile by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CustomerId) -> Result<Option<CustomerProfile>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT id, first_name, last_name, phone, email, address, postal_code,
                   age, gender, employment_status, occupation, education,
                   household_size, has_children, monthly_income, preferred_category
            FROM shop.customer
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(CustomerProfile::from))
    }

    /// Save a profile edit.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_profile(
        &self,
        id: CustomerId,
        update: &ProfileUpdate,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.customer
            SET first_name = $2, last_name = $3, phone = $4, address = $5,
                postal_code = $6, age = $7, gender = $8, employment_status = $9,
                occupation = $10, education = $11, household_size = $12,
                has_children = $13, monthly_income = $14
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.phone)
        .bind(&update.address)
        .bind(&update.postal_code)
        .bind(update.age)
        .bind(&update.gender)
        .bind(&update.employment_status)
        .bind(&update.occupation)
        .bind(&update.education)
        .bind(update.household_size)
        .bind(i32::from(update.has_children))
        .bind(update.monthly_income)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Customers with a recorded preferred category, oldest first.
    ///
    /// These are the labelled samples the category model is trained on.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_labelled(&self) -> Result<Vec<CustomerProfile>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT id, first_name, last_name, phone, email, address, postal_code,
                   age, gender, employment_status, occupation, education,
                   household_size, has_children, monthly_income, preferred_category
            FROM shop.customer
            WHERE btrim(preferred_category) <> ''
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CustomerProfile::from).collect())
    }

    /// Store a preferred category only if none is recorded yet.
    ///
    /// Returns whether the row changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn fill_preferred_category(
        &self,
        id: CustomerId,
        category: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.customer SET preferred_category = $2 \
             WHERE id = $1 AND preferred_category = ''",
        )
        .bind(id)
        .bind(category)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
