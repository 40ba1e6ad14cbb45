//! Product repository for catalogue and inventory management.
//!
//! Unlike the storefront, every query here sees hidden products; the hidden
//! flag is returned as a column instead of filtering rows out.

use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};

use shopfront_core::{CategoryId, Price, Sku, SubCategoryId};

use super::categories::{find_or_create_category, find_or_create_subcategory};
use super::{RepositoryError, contains_pattern, search_term};
use crate::models::AdminProduct;
use crate::models::catalogue::ProductInput;

const PRODUCT_SELECT: &str = r"
    SELECT p.sku, p.name, p.description,
           c.id AS category_id, c.name AS category_name,
           s.id AS subcategory_id, s.name AS subcategory_name,
           p.quantity_on_hand, p.reorder_quantity, p.unit_price, p.rating,
           (h.sku IS NOT NULL) AS hidden
    FROM shop.product p
    JOIN shop.subcategory s ON s.id = p.subcategory_id
    JOIN shop.category c ON c.id = s.category_id
    LEFT JOIN shop.hidden_product h ON h.sku = p.sku
    WHERE TRUE
";

const PRODUCT_COUNT: &str = r"
    SELECT COUNT(*)
    FROM shop.product p
    JOIN shop.subcategory s ON s.id = p.subcategory_id
    JOIN shop.category c ON c.id = s.category_id
    LEFT JOIN shop.hidden_product h ON h.sku = p.sku
    WHERE TRUE
";

#[derive(Debug, FromRow)]
struct ProductRow {
    sku: Sku,
    name: String,
    description: String,
    category_id: CategoryId,
    category_name: String,
    subcategory_id: SubCategoryId,
    subcategory_name: String,
    quantity_on_hand: i32,
    reorder_quantity: i32,
    unit_price: Price,
    rating: f64,
    hidden: bool,
}

impl From<ProductRow> for AdminProduct {
    fn from(row: ProductRow) -> Self {
        Self {
            sku: row.sku,
            name: row.name,
            description: row.description,
            category_id: row.category_id,
            category_name: row.category_name,
            subcategory_id: row.subcategory_id,
            subcategory_name: row.subcategory_name,
            quantity_on_hand: row.quantity_on_hand,
            reorder_quantity: row.reorder_quantity,
            unit_price: row.unit_price,
            rating: row.rating,
            hidden: row.hidden,
        }
    }
}

/// Sort order for product lists and exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    #[default]
    SkuAsc,
    SkuDesc,
    NameAsc,
    NameDesc,
}

impl ProductSort {
    pub const ALL: [Self; 4] = [Self::SkuAsc, Self::SkuDesc, Self::NameAsc, Self::NameDesc];

    /// Parse a `sort` query value; unknown or missing values sort by SKU.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(|value| Self::ALL.into_iter().find(|s| s.as_str() == value.trim()))
            .unwrap_or_default()
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SkuAsc => "sku_asc",
            Self::SkuDesc => "sku_desc",
            Self::NameAsc => "name_asc",
            Self::NameDesc => "name_desc",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SkuAsc => "SKU (A-Z)",
            Self::SkuDesc => "SKU (Z-A)",
            Self::NameAsc => "Name (A-Z)",
            Self::NameDesc => "Name (Z-A)",
        }
    }

    const fn order_by(self) -> &'static str {
        match self {
            Self::SkuAsc => " ORDER BY p.sku ASC",
            Self::SkuDesc => " ORDER BY p.sku DESC",
            Self::NameAsc => " ORDER BY p.name ASC, p.sku ASC",
            Self::NameDesc => " ORDER BY p.name DESC, p.sku ASC",
        }
    }
}

/// Filters shared by the catalogue and inventory lists and their exports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    /// Case-insensitive substring of SKU or name.
    pub search: Option<String>,
    /// Any of these categories; empty means all.
    pub category_ids: Vec<CategoryId>,
    /// Any of these subcategories; empty means all.
    pub subcategory_ids: Vec<SubCategoryId>,
    /// `Some(true)` for hidden only, `Some(false)` for visible only.
    pub hidden: Option<bool>,
    /// Only products at or below their reorder level.
    pub low_stock_only: bool,
}

impl ProductFilter {
    fn push_conditions(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(term) = search_term(self.search.as_deref()) {
            let pattern = contains_pattern(term);
            qb.push(" AND (p.sku ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.name ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if !self.category_ids.is_empty() {
            let ids: Vec<i32> = self.category_ids.iter().map(CategoryId::as_i32).collect();
            qb.push(" AND c.id = ANY(").push_bind(ids).push(")");
        }
        if !self.subcategory_ids.is_empty() {
            let ids: Vec<i32> = self
                .subcategory_ids
                .iter()
                .map(SubCategoryId::as_i32)
                .collect();
            qb.push(" AND s.id = ANY(").push_bind(ids).push(")");
        }
        match self.hidden {
            Some(true) => {
                qb.push(" AND h.sku IS NOT NULL");
            }
            Some(false) => {
                qb.push(" AND h.sku IS NULL");
            }
            None => {}
        }
        if self.low_stock_only {
            qb.push(" AND p.quantity_on_hand <= p.reorder_quantity");
        }
    }
}

/// One product row from a CSV import.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductUpsert {
    /// Source line number, for messages.
    pub line: usize,
    pub sku: Sku,
    pub name: String,
    /// Blank keeps the stored description on update.
    pub description: String,
    pub category: String,
    /// Blank resolves to "General" on create and keeps the stored value on update.
    pub subcategory: String,
    pub quantity_on_hand: i32,
    pub reorder_quantity: i32,
    pub unit_price: Price,
    pub rating: f64,
    /// `None` leaves the hidden flag alone.
    pub hidden: Option<bool>,
}

/// How an import treats rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOptions<'a> {
    /// Overwrite products whose SKU already exists; otherwise skip them.
    pub update_existing: bool,
    /// Description stored for new products that have none.
    pub blank_description: &'a str,
}

/// What an import wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertReport {
    pub created: usize,
    pub updated: usize,
    /// `(line, sku)` of existing products left untouched.
    pub skipped_existing: Vec<(usize, Sku)>,
}

/// Repository for catalogue and stock writes.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Count products matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, filter: &ProductFilter) -> Result<i64, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(PRODUCT_COUNT);
        filter.push_conditions(&mut qb);
        let count = qb.build_query_scalar::<i64>().fetch_one(self.pool).await?;
        Ok(count)
    }

    /// One page of products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AdminProduct>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(PRODUCT_SELECT);
        filter.push_conditions(&mut qb);
        qb.push(sort.order_by())
            .push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows = qb.build_query_as::<ProductRow>().fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(AdminProduct::from).collect())
    }

    /// Every product matching `filter`, for exports.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
    ) -> Result<Vec<AdminProduct>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(PRODUCT_SELECT);
        filter.push_conditions(&mut qb);
        qb.push(sort.order_by());
        let rows = qb.build_query_as::<ProductRow>().fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(AdminProduct::from).collect())
    }

    /// Get a product by SKU, hidden or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, sku: &Sku) -> Result<Option<AdminProduct>, RepositoryError> {
        let sql = format!("{PRODUCT_SELECT} AND p.sku = $1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(sku)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(AdminProduct::from))
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the SKU exists or the
    /// subcategory does not.
    pub async fn create(&self, sku: &Sku, input: &ProductInput) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop.product
                (sku, name, description, subcategory_id, quantity_on_hand,
                 reorder_quantity, unit_price, rating)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(sku)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.subcategory_id)
        .bind(input.quantity_on_hand)
        .bind(input.reorder_quantity)
        .bind(input.unit_price)
        .bind(input.rating)
        .execute(self.pool)
        .await
        .map_err(|e| product_write_conflict(e, sku))?;
        Ok(())
    }

    /// Update every editable field of a product. The SKU never changes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the SKU does not exist.
    /// Returns `RepositoryError::Conflict` if the subcategory does not exist.
    pub async fn update(&self, sku: &Sku, input: &ProductInput) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.product
            SET name = $2, description = $3, subcategory_id = $4,
                quantity_on_hand = $5, reorder_quantity = $6, unit_price = $7,
                rating = $8, updated_at = now()
            WHERE sku = $1
            ",
        )
        .bind(sku)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.subcategory_id)
        .bind(input.quantity_on_hand)
        .bind(input.reorder_quantity)
        .bind(input.unit_price)
        .bind(input.rating)
        .execute(self.pool)
        .await
        .map_err(|e| product_write_conflict(e, sku))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a product. Cart lines and the hidden flag go with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if any order references the product.
    /// Returns `RepositoryError::NotFound` if the SKU does not exist.
    pub async fn delete(&self, sku: &Sku) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product WHERE sku = $1")
            .bind(sku)
            .execute(self.pool)
            .await
            .map_err(|e| {
                RepositoryError::foreign_key_or_database(
                    e,
                    &format!("{sku} has orders and cannot be deleted."),
                )
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Flip the hidden flag, returning the new state (`true` = hidden).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the SKU does not exist.
    pub async fn toggle_hidden(&self, sku: &Sku) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let unhidden = sqlx::query("DELETE FROM shop.hidden_product WHERE sku = $1")
            .bind(sku)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let now_hidden = if unhidden > 0 {
            false
        } else {
            let hidden = sqlx::query(
                "INSERT INTO shop.hidden_product (sku) SELECT sku FROM shop.product WHERE sku = $1",
            )
            .bind(sku)
            .execute(&mut *tx)
            .await?
            .rows_affected();
            if hidden == 0 {
                return Err(RepositoryError::NotFound);
            }
            true
        };

        tx.commit().await?;
        Ok(now_hidden)
    }

    /// Set stock and reorder levels.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the SKU does not exist.
    pub async fn update_stock(
        &self,
        sku: &Sku,
        quantity_on_hand: i32,
        reorder_quantity: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.product
            SET quantity_on_hand = $2, reorder_quantity = $3, updated_at = now()
            WHERE sku = $1
            ",
        )
        .bind(sku)
        .bind(quantity_on_hand)
        .bind(reorder_quantity)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Create or update products by SKU in one transaction.
    ///
    /// Categories and subcategories named by the rows are matched
    /// case-insensitively or created.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; nothing is
    /// written in that case.
    pub async fn upsert_many(
        &self,
        rows: &[ProductUpsert],
        options: UpsertOptions<'_>,
    ) -> Result<UpsertReport, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut report = UpsertReport::default();

        for row in rows {
            let current_category: Option<CategoryId> = sqlx::query_scalar(
                r"
                SELECT s.category_id
                FROM shop.product p
                JOIN shop.subcategory s ON s.id = p.subcategory_id
                WHERE p.sku = $1
                ",
            )
            .bind(&row.sku)
            .fetch_optional(&mut *tx)
            .await?;

            if current_category.is_some() && !options.update_existing {
                report.skipped_existing.push((row.line, row.sku.clone()));
                continue;
            }

            let category_id = find_or_create_category(&mut tx, row.category.trim()).await?;

            if let Some(current) = current_category {
                let subcategory_id = if keeps_subcategory(current, category_id, &row.subcategory) {
                    None
                } else {
                    Some(find_or_create_subcategory(&mut tx, category_id, &row.subcategory).await?)
                };
                update_imported(&mut tx, row, subcategory_id).await?;
                report.updated += 1;
            } else {
                let subcategory_id =
                    find_or_create_subcategory(&mut tx, category_id, &row.subcategory).await?;
                insert_imported(&mut tx, row, subcategory_id, options.blank_description).await?;
                report.created += 1;
            }

            if let Some(hidden) = row.hidden {
                set_hidden(&mut tx, &row.sku, hidden).await?;
            }
        }

        tx.commit().await?;
        Ok(report)
    }

    /// Insert the rows whose SKU does not exist yet; existing SKUs are left
    /// untouched. Returns how many were created.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; nothing is
    /// written in that case.
    pub async fn create_missing(&self, rows: &[ProductUpsert]) -> Result<usize, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut created = 0;

        for row in rows {
            let category_id = find_or_create_category(&mut tx, row.category.trim()).await?;
            let subcategory_id =
                find_or_create_subcategory(&mut tx, category_id, &row.subcategory).await?;

            let inserted = sqlx::query(
                r"
                INSERT INTO shop.product
                    (sku, name, description, subcategory_id, quantity_on_hand,
                     reorder_quantity, unit_price, rating)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (sku) DO NOTHING
                ",
            )
            .bind(&row.sku)
            .bind(&row.name)
            .bind(&row.description)
            .bind(subcategory_id)
            .bind(row.quantity_on_hand)
            .bind(row.reorder_quantity)
            .bind(row.unit_price)
            .bind(row.rating)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if inserted > 0 {
                created += 1;
            }
        }

        tx.commit().await?;
        Ok(created)
    }
}

/// Whether an updated row leaves the stored subcategory alone: only when its
/// subcategory cell is blank and its category is the product's current one.
/// A blank cell under a different category moves the product to that
/// category's "General" subcategory.
fn keeps_subcategory(current: CategoryId, row_category: CategoryId, subcategory: &str) -> bool {
    subcategory.trim().is_empty() && current == row_category
}

fn product_write_conflict(e: sqlx::Error, sku: &Sku) -> RepositoryError {
    match RepositoryError::unique_or_database(
        e,
        &format!("A product with SKU {sku} already exists."),
    ) {
        RepositoryError::Database(e) => {
            RepositoryError::foreign_key_or_database(e, "That subcategory does not exist.")
        }
        other => other,
    }
}

async fn insert_imported(
    conn: &mut PgConnection,
    row: &ProductUpsert,
    subcategory_id: SubCategoryId,
    blank_description: &str,
) -> Result<(), RepositoryError> {
    let description = if row.description.trim().is_empty() {
        blank_description
    } else {
        row.description.as_str()
    };

    sqlx::query(
        r"
        INSERT INTO shop.product
            (sku, name, description, subcategory_id, quantity_on_hand,
             reorder_quantity, unit_price, rating)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ",
    )
    .bind(&row.sku)
    .bind(&row.name)
    .bind(description)
    .bind(subcategory_id)
    .bind(row.quantity_on_hand)
    .bind(row.reorder_quantity)
    .bind(row.unit_price)
    .bind(row.rating)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn update_imported(
    conn: &mut PgConnection,
    row: &ProductUpsert,
    subcategory_id: Option<SubCategoryId>,
) -> Result<(), RepositoryError> {
    let description = Some(row.description.trim()).filter(|d| !d.is_empty());

    sqlx::query(
        r"
        UPDATE shop.product
        SET name = $2,
            description = COALESCE($3, description),
            subcategory_id = COALESCE($4, subcategory_id),
            quantity_on_hand = $5,
            reorder_quantity = $6,
            unit_price = $7,
            rating = $8,
            updated_at = now()
        WHERE sku = $1
        ",
    )
    .bind(&row.sku)
    .bind(&row.name)
    .bind(description)
    .bind(subcategory_id)
    .bind(row.quantity_on_hand)
    .bind(row.reorder_quantity)
    .bind(row.unit_price)
    .bind(row.rating)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn set_hidden(conn: &mut PgConnection, sku: &Sku, hidden: bool) -> Result<(), RepositoryError> {
    if hidden {
        sqlx::query("INSERT INTO shop.hidden_product (sku) VALUES ($1) ON CONFLICT (sku) DO NOTHING")
            .bind(sku)
            .execute(&mut *conn)
            .await?;
    } else {
        sqlx::query("DELETE FROM shop.hidden_product WHERE sku = $1")
            .bind(sku)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_parse_falls_back_to_sku_asc() {
        assert_eq!(ProductSort::parse(None), ProductSort::SkuAsc);
        assert_eq!(ProductSort::parse(Some("price_desc")), ProductSort::SkuAsc);
        assert_eq!(ProductSort::parse(Some("name_desc")), ProductSort::NameDesc);
        assert_eq!(ProductSort::parse(Some(" sku_desc ")), ProductSort::SkuDesc);
    }

    #[test]
    fn test_sort_round_trips_through_query_value() {
        for sort in ProductSort::ALL {
            assert_eq!(ProductSort::parse(Some(sort.as_str())), sort);
        }
    }

    #[test]
    fn test_filter_sql_has_every_condition() {
        let filter = ProductFilter {
            search: Some("lamp".to_string()),
            category_ids: vec![CategoryId::new(1), CategoryId::new(2)],
            subcategory_ids: vec![SubCategoryId::new(7)],
            hidden: Some(true),
            low_stock_only: true,
        };
        let mut qb = QueryBuilder::<Postgres>::new(PRODUCT_COUNT);
        filter.push_conditions(&mut qb);
        let sql = qb.sql();
        assert!(sql.contains("p.sku ILIKE $1 OR p.name ILIKE $2"));
        assert!(sql.contains("c.id = ANY($3)"));
        assert!(sql.contains("s.id = ANY($4)"));
        assert!(sql.contains("h.sku IS NOT NULL"));
        assert!(sql.contains("p.quantity_on_hand <= p.reorder_quantity"));
    }

    #[test]
    fn test_blank_subcategory_keeps_stored_one_in_same_category() {
        let electronics = CategoryId::new(4);
        assert!(keeps_subcategory(electronics, electronics, ""));
        assert!(keeps_subcategory(electronics, electronics, "  "));
        assert!(!keeps_subcategory(electronics, electronics, "Lighting"));
    }

    #[test]
    fn test_category_change_resolves_subcategory() {
        let electronics = CategoryId::new(4);
        let home = CategoryId::new(9);
        assert!(!keeps_subcategory(electronics, home, ""));
        assert!(!keeps_subcategory(electronics, home, "Lighting"));
    }

    #[test]
    fn test_empty_filter_adds_nothing() {
        let mut qb = QueryBuilder::<Postgres>::new(PRODUCT_COUNT);
        ProductFilter::default().push_conditions(&mut qb);
        assert_eq!(qb.sql(), PRODUCT_COUNT);
    }
}
