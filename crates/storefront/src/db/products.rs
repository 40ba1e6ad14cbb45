//! Product repository for storefront queries.
//!
//! Every query here excludes hidden products.

use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use shopfront_core::{CategoryId, Price, Sku};

use super::{RepositoryError, contains_pattern};
use crate::models::Product;

const PRODUCT_COLUMNS: &str = r"
    SELECT p.sku, p.name, p.description, c.name AS category_name,
           s.name AS subcategory_name, p.quantity_on_hand, p.unit_price, p.rating
    FROM shop.product p
    JOIN shop.subcategory s ON s.id = p.subcategory_id
    JOIN shop.category c ON c.id = s.category_id
    WHERE NOT EXISTS (SELECT 1 FROM shop.hidden_product h WHERE h.sku = p.sku)
";

#[derive(Debug, FromRow)]
struct ProductRow {
    sku: Sku,
    name: String,
    description: String,
    category_name: String,
    subcategory_name: String,
    quantity_on_hand: i32,
    unit_price: Price,
    rating: f64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            sku: row.sku,
            name: row.name,
            description: row.description,
            category_name: row.category_name,
            subcategory_name: row.subcategory_name,
            quantity_on_hand: row.quantity_on_hand,
            unit_price: row.unit_price,
            rating: row.rating,
        }
    }
}

/// Filters for the product listing page.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive substring of name or SKU.
    pub search: Option<String>,
    pub category_id: Option<CategoryId>,
}

impl ProductFilter {
    fn push_conditions(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = contains_pattern(term);
            qb.push(" AND (p.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.sku ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(category_id) = self.category_id {
            qb.push(" AND c.id = ").push_bind(category_id);
        }
    }
}

/// Repository for storefront product reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Highest-rated visible products, ties broken by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_rated(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!("{PRODUCT_COLUMNS} ORDER BY p.rating DESC, p.name, p.sku LIMIT $1");
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Highest-rated visible products in the category named `category_name`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_rated_in_category(
        &self,
        category_name: &str,
        limit: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "{PRODUCT_COLUMNS} AND lower(c.name) = lower($1) \
             ORDER BY p.rating DESC, p.name, p.sku LIMIT $2"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(category_name)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Count products matching the listing filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, filter: &ProductFilter) -> Result<i64, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM shop.product p \
             JOIN shop.subcategory s ON s.id = p.subcategory_id \
             JOIN shop.category c ON c.id = s.category_id \
             WHERE NOT EXISTS (SELECT 1 FROM shop.hidden_product h WHERE h.sku = p.sku)",
        );
        filter.push_conditions(&mut qb);
        let count = qb.build_query_scalar::<i64>().fetch_one(self.pool).await?;
        Ok(count)
    }

    /// One page of the listing, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(PRODUCT_COLUMNS);
        filter.push_conditions(&mut qb);
        qb.push(" ORDER BY p.name, p.sku LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows = qb.build_query_as::<ProductRow>().fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Get a visible product by SKU.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_visible(&self, sku: &Sku) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("{PRODUCT_COLUMNS} AND p.sku = $1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(sku)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Product::from))
    }

    /// Visible products for the given SKUs, in the order the SKUs were given.
    ///
    /// Unknown and hidden SKUs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_visible_many(&self, skus: &[Sku]) -> Result<Vec<Product>, RepositoryError> {
        if skus.is_empty() {
            return Ok(Vec::new());
        }
        let keys: Vec<&str> = skus.iter().map(Sku::as_str).collect();
        let sql = format!("{PRODUCT_COLUMNS} AND p.sku = ANY($1)");
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(keys)
            .fetch_all(self.pool)
            .await?;

        let mut products: Vec<Product> = rows.into_iter().map(Product::from).collect();
        products.sort_by_key(|p| skus.iter().position(|s| s == &p.sku));
        Ok(products)
    }
}
