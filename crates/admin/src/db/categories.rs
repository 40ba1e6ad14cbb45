//! Category and subcategory repository.
//!
//! Names are unique case-insensitively: categories globally, subcategories
//! within their category. Both are enforced by unique indexes on `lower(name)`.

use sqlx::{FromRow, PgConnection, PgPool};

use shopfront_core::{CategoryId, SubCategoryId};

use super::RepositoryError;
use crate::models::{CategorySummary, SubcategorySummary};

/// Subcategory used when an import row names none.
pub const DEFAULT_SUBCATEGORY: &str = "General";

#[derive(Debug, FromRow)]
struct CategorySummaryRow {
    id: CategoryId,
    name: String,
    subcategory_count: i64,
    product_count: i64,
}

impl From<CategorySummaryRow> for CategorySummary {
    fn from(row: CategorySummaryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            subcategory_count: row.subcategory_count,
            product_count: row.product_count,
        }
    }
}

#[derive(Debug, FromRow)]
struct SubcategoryRow {
    id: SubCategoryId,
    name: String,
    category_id: CategoryId,
    category_name: String,
    product_count: i64,
}

impl From<SubcategoryRow> for SubcategorySummary {
    fn from(row: SubcategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            category_id: row.category_id,
            category_name: row.category_name,
            product_count: row.product_count,
        }
    }
}

const CATEGORY_SUMMARY_SQL: &str = r"
    SELECT c.id, c.name,
           (SELECT COUNT(*) FROM shop.subcategory s WHERE s.category_id = c.id) AS subcategory_count,
           (SELECT COUNT(*) FROM shop.product p
              JOIN shop.subcategory s ON s.id = p.subcategory_id
             WHERE s.category_id = c.id) AS product_count
    FROM shop.category c
";

const SUBCATEGORY_SQL: &str = r"
    SELECT s.id, s.name, s.category_id, c.name AS category_name,
           (SELECT COUNT(*) FROM shop.product p WHERE p.subcategory_id = s.id) AS product_count
    FROM shop.subcategory s
    JOIN shop.category c ON c.id = s.category_id
";

/// What a category merge did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeOutcome {
    /// Subcategories re-parented onto the target.
    pub moved: usize,
    /// Subcategories folded into a same-named target subcategory.
    pub merged: usize,
}

/// Repository for catalogue taxonomy.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories with their counts, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_with_counts(&self) -> Result<Vec<CategorySummary>, RepositoryError> {
        let sql = format!("{CATEGORY_SUMMARY_SQL} ORDER BY lower(c.name)");
        let rows = sqlx::query_as::<_, CategorySummaryRow>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(CategorySummary::from).collect())
    }

    /// Get one category with its counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CategoryId) -> Result<Option<CategorySummary>, RepositoryError> {
        let sql = format!("{CATEGORY_SUMMARY_SQL} WHERE c.id = $1");
        let row = sqlx::query_as::<_, CategorySummaryRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(CategorySummary::from))
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken (any case).
    pub async fn create(&self, name: &str) -> Result<CategoryId, RepositoryError> {
        sqlx::query_scalar::<_, CategoryId>(
            "INSERT INTO shop.category (name) VALUES ($1) RETURNING id",
        )
        .bind(name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_or_database(e, &duplicate_category(name)))
    }

    /// Rename a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    /// Returns `RepositoryError::Conflict` if the name is taken.
    pub async fn rename(&self, id: CategoryId, name: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE shop.category SET name = $2 WHERE id = $1")
            .bind(id)
            .bind(name)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::unique_or_database(e, &duplicate_category(name)))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Fold `source` into `target` and delete `source`.
    ///
    /// Each subcategory of the source moves to the target. When the target
    /// already has a subcategory of the same name (any case), the source's
    /// products are re-pointed to it and the duplicate is deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if `source == target`.
    /// Returns `RepositoryError::NotFound` if either category is missing.
    /// Nothing is written on error.
    pub async fn merge(
        &self,
        source: CategoryId,
        target: CategoryId,
    ) -> Result<MergeOutcome, RepositoryError> {
        if source == target {
            return Err(RepositoryError::Conflict(
                "A category cannot be merged into itself.".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let locked: Vec<CategoryId> = sqlx::query_scalar(
            "SELECT id FROM shop.category WHERE id = ANY($1) FOR UPDATE",
        )
        .bind(vec![source.as_i32(), target.as_i32()])
        .fetch_all(&mut *tx)
        .await?;
        if locked.len() != 2 {
            return Err(RepositoryError::NotFound);
        }

        let subcategories = sqlx::query_as::<_, (SubCategoryId, String)>(
            "SELECT id, name FROM shop.subcategory WHERE category_id = $1 ORDER BY id",
        )
        .bind(source)
        .fetch_all(&mut *tx)
        .await?;

        let mut outcome = MergeOutcome::default();
        for (sub_id, sub_name) in subcategories {
            let twin = sqlx::query_scalar::<_, SubCategoryId>(
                "SELECT id FROM shop.subcategory WHERE category_id = $1 AND lower(name) = lower($2)",
            )
            .bind(target)
            .bind(&sub_name)
            .fetch_optional(&mut *tx)
            .await?;

            if let Some(twin_id) = twin {
                sqlx::query(
                    "UPDATE shop.product SET subcategory_id = $2, updated_at = now() \
                     WHERE subcategory_id = $1",
                )
                .bind(sub_id)
                .bind(twin_id)
                .execute(&mut *tx)
                .await?;
                sqlx::query("DELETE FROM shop.subcategory WHERE id = $1")
                    .bind(sub_id)
                    .execute(&mut *tx)
                    .await?;
                outcome.merged += 1;
            } else {
                sqlx::query("UPDATE shop.subcategory SET category_id = $2 WHERE id = $1")
                    .bind(sub_id)
                    .bind(target)
                    .execute(&mut *tx)
                    .await?;
                outcome.moved += 1;
            }
        }

        sqlx::query("DELETE FROM shop.category WHERE id = $1")
            .bind(source)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(outcome)
    }

    /// All subcategories ordered by category then name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_subcategories(&self) -> Result<Vec<SubcategorySummary>, RepositoryError> {
        let sql = format!("{SUBCATEGORY_SQL} ORDER BY lower(c.name), lower(s.name)");
        let rows = sqlx::query_as::<_, SubcategoryRow>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(SubcategorySummary::from).collect())
    }

    /// Get one subcategory.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_subcategory(
        &self,
        id: SubCategoryId,
    ) -> Result<Option<SubcategorySummary>, RepositoryError> {
        let sql = format!("{SUBCATEGORY_SQL} WHERE s.id = $1");
        let row = sqlx::query_as::<_, SubcategoryRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(SubcategorySummary::from))
    }

    /// Create a subcategory under `category_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the category already has a
    /// subcategory of that name, or the category does not exist.
    pub async fn create_subcategory(
        &self,
        category_id: CategoryId,
        name: &str,
    ) -> Result<SubCategoryId, RepositoryError> {
        sqlx::query_scalar::<_, SubCategoryId>(
            "INSERT INTO shop.subcategory (name, category_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(name)
        .bind(category_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| subcategory_conflict(e, name))
    }

    /// Rename a subcategory and/or move it to another category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the subcategory does not exist.
    /// Returns `RepositoryError::Conflict` if the name is taken in the
    /// destination category.
    pub async fn update_subcategory(
        &self,
        id: SubCategoryId,
        category_id: CategoryId,
        name: &str,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE shop.subcategory SET name = $2, category_id = $3 WHERE id = $1")
                .bind(id)
                .bind(name)
                .bind(category_id)
                .execute(self.pool)
                .await
                .map_err(|e| subcategory_conflict(e, name))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

fn duplicate_category(name: &str) -> String {
    format!("A category named \"{name}\" already exists.")
}

fn subcategory_conflict(e: sqlx::Error, name: &str) -> RepositoryError {
    match RepositoryError::unique_or_database(
        e,
        &format!("That category already has a subcategory named \"{name}\"."),
    ) {
        RepositoryError::Database(e) => {
            RepositoryError::foreign_key_or_database(e, "That category does not exist.")
        }
        other => other,
    }
}

/// Find a category by name (any case) or create it, inside a transaction.
pub(crate) async fn find_or_create_category(
    conn: &mut PgConnection,
    name: &str,
) -> Result<CategoryId, RepositoryError> {
    let existing = sqlx::query_scalar::<_, CategoryId>(
        "SELECT id FROM shop.category WHERE lower(name) = lower($1)",
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = existing {
        return Ok(id);
    }

    let id = sqlx::query_scalar::<_, CategoryId>(
        "INSERT INTO shop.category (name) VALUES ($1) RETURNING id",
    )
    .bind(name)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

/// Find a subcategory by name (any case) within a category or create it,
/// inside a transaction. A blank name resolves to [`DEFAULT_SUBCATEGORY`].
pub(crate) async fn find_or_create_subcategory(
    conn: &mut PgConnection,
    category_id: CategoryId,
    name: &str,
) -> Result<SubCategoryId, RepositoryError> {
    let name = if name.trim().is_empty() {
        DEFAULT_SUBCATEGORY
    } else {
        name.trim()
    };

    let existing = sqlx::query_scalar::<_, SubCategoryId>(
        "SELECT id FROM shop.subcategory WHERE category_id = $1 AND lower(name) = lower($2)",
    )
    .bind(category_id)
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = existing {
        return Ok(id);
    }

    let id = sqlx::query_scalar::<_, SubCategoryId>(
        "INSERT INTO shop.subcategory (name, category_id) VALUES ($1, $2) RETURNING id",
    )
    .bind(name)
    .bind(category_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}
