//! Database carts for signed-in shoppers.
//!
//! A cart row is created lazily the first time a customer adds something.
//! Lines are unique per `(cart_id, sku)`, so every write is an upsert.

use sqlx::{FromRow, PgPool};

use shopfront_core::{CartId, CustomerId, Price, Sku};

use super::RepositoryError;
use crate::models::CartLine;

// Summed line quantities saturate at i32::MAX.
const ADD_ITEM: &str = r"
    INSERT INTO shop.cart_item (cart_id, sku, quantity)
    VALUES ($1, $2, $3)
    ON CONFLICT (cart_id, sku)
    DO UPDATE SET quantity = LEAST(shop.cart_item.quantity::bigint + EXCLUDED.quantity, 2147483647)::integer
";

// Only visible products are merged.
const MERGE_ITEM: &str = r"
    INSERT INTO shop.cart_item (cart_id, sku, quantity)
    SELECT $1, p.sku, $3
    FROM shop.product p
    WHERE p.sku = $2
      AND NOT EXISTS (SELECT 1 FROM shop.hidden_product h WHERE h.sku = p.sku)
    ON CONFLICT (cart_id, sku)
    DO UPDATE SET quantity = LEAST(shop.cart_item.quantity::bigint + EXCLUDED.quantity, 2147483647)::integer
";

#[derive(Debug, FromRow)]
struct CartLineRow {
    sku: Sku,
    name: String,
    unit_price: Price,
    quantity: i32,
    quantity_on_hand: i32,
    hidden: bool,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            sku: row.sku,
            name: row.name,
            unit_price: row.unit_price,
            quantity: row.quantity,
            quantity_on_hand: row.quantity_on_hand,
            available: !row.hidden,
        }
    }
}

/// Repository for signed-in carts.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the customer's cart, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create(&self, customer_id: CustomerId) -> Result<CartId, RepositoryError> {
        let id = sqlx::query_scalar::<_, CartId>(
            r"
            INSERT INTO shop.cart (customer_id)
            VALUES ($1)
            ON CONFLICT (customer_id) DO UPDATE SET updated_at = now()
            RETURNING id
            ",
        )
        .bind(customer_id)
        .fetch_one(self.pool)
        .await?;
        Ok(id)
    }

    /// Lines in the customer's cart, ordered by product name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, customer_id: CustomerId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT i.sku, p.name, p.unit_price, i.quantity, p.quantity_on_hand,
                   EXISTS (SELECT 1 FROM shop.hidden_product h WHERE h.sku = i.sku) AS hidden
            FROM shop.cart c
            JOIN shop.cart_item i ON i.cart_id = c.id
            JOIN shop.product p ON p.sku = i.sku
            WHERE c.customer_id = $1
            ORDER BY p.name, i.sku
            ",
        )
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(CartLine::from).collect())
    }

    /// Number of distinct lines in the customer's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn line_count(&self, customer_id: CustomerId) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*)
            FROM shop.cart c
            JOIN shop.cart_item i ON i.cart_id = c.id
            WHERE c.customer_id = $1
            ",
        )
        .bind(customer_id)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Add `quantity` units of `sku`, summing with an existing line. The sum
    /// saturates at `i32::MAX`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add_item(
        &self,
        customer_id: CustomerId,
        sku: &Sku,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let cart_id = self.get_or_create(customer_id).await?;
        sqlx::query(ADD_ITEM)
            .bind(cart_id)
            .bind(sku)
            .bind(quantity)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Replace a line's quantity. Zero or below deletes the line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_quantity(
        &self,
        customer_id: CustomerId,
        sku: &Sku,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        if quantity <= 0 {
            self.remove_item(customer_id, sku).await?;
            return Ok(());
        }
        sqlx::query(
            r"
            UPDATE shop.cart_item i
            SET quantity = $3
            FROM shop.cart c
            WHERE c.id = i.cart_id AND c.customer_id = $1 AND i.sku = $2
            ",
        )
        .bind(customer_id)
        .bind(sku)
        .bind(quantity)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Remove a line. Returns whether a line existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove_item(
        &self,
        customer_id: CustomerId,
        sku: &Sku,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM shop.cart_item i
            USING shop.cart c
            WHERE c.id = i.cart_id AND c.customer_id = $1 AND i.sku = $2
            ",
        )
        .bind(customer_id)
        .bind(sku)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Fold guest lines into the customer's cart in one transaction.
    ///
    /// Lines whose product is missing or hidden are dropped, and summed
    /// quantities saturate at `i32::MAX`. Returns the
    /// number of lines merged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; nothing is
    /// written in that case.
    pub async fn merge_lines(
        &self,
        customer_id: CustomerId,
        lines: &[(Sku, i32)],
    ) -> Result<u64, RepositoryError> {
        if lines.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;

        let cart_id = sqlx::query_scalar::<_, CartId>(
            r"
            INSERT INTO shop.cart (customer_id)
            VALUES ($1)
            ON CONFLICT (customer_id) DO UPDATE SET updated_at = now()
            RETURNING id
            ",
        )
        .bind(customer_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut merged = 0;
        for (sku, quantity) in lines {
            let result = sqlx::query(MERGE_ITEM)
                .bind(cart_id)
                .bind(sku)
                .bind(quantity)
                .execute(&mut *tx)
                .await?;
            merged += result.rows_affected();
        }

        tx.commit().await?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_sums_saturate_at_integer_max() {
        for sql in [ADD_ITEM, MERGE_ITEM] {
            assert!(sql.contains(
                "LEAST(shop.cart_item.quantity::bigint + EXCLUDED.quantity, 2147483647)::integer"
            ));
        }
    }

    #[test]
    fn test_merge_skips_hidden_products() {
        assert!(MERGE_ITEM.contains("NOT EXISTS (SELECT 1 FROM shop.hidden_product"));
    }
}
