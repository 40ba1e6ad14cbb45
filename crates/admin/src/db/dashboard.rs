//! Dashboard aggregates over stock and sales.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use shopfront_core::{CategoryId, Price, Sku};

use super::RepositoryError;
use crate::models::{InventoryKpis, LowStockItem, SalesKpis, TopProduct};

const TOP_PRODUCTS_LIMIT: i64 = 5;
const LOW_STOCK_LIMIT: i64 = 10;

#[derive(Debug, FromRow)]
struct InventoryRow {
    total_skus: i64,
    low_stock_count: i64,
    total_units: i64,
    inventory_value: Decimal,
}

#[derive(Debug, FromRow)]
struct SalesRow {
    revenue: Decimal,
    units_sold: i64,
    orders_count: i64,
}

#[derive(Debug, FromRow)]
struct TopProductRow {
    sku: Sku,
    name: String,
    units_sold: i64,
    revenue: Decimal,
}

#[derive(Debug, FromRow)]
struct LowStockRow {
    sku: Sku,
    name: String,
    quantity_on_hand: i32,
    reorder_quantity: i32,
}

/// Inclusive order-date range for sales figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, swapping the bounds if they are reversed.
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start > end {
            Self { start: end, end: start }
        } else {
            Self { start, end }
        }
    }
}

/// Read-only repository for dashboard KPIs.
pub struct DashboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DashboardRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Stock totals, optionally limited to one category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn inventory_kpis(
        &self,
        category: Option<CategoryId>,
    ) -> Result<InventoryKpis, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r"
            SELECT COUNT(*) AS total_skus,
                   COUNT(*) FILTER (WHERE p.quantity_on_hand <= p.reorder_quantity) AS low_stock_count,
                   COALESCE(SUM(p.quantity_on_hand), 0)::BIGINT AS total_units,
                   COALESCE(SUM(p.quantity_on_hand * p.unit_price), 0) AS inventory_value
            FROM shop.product p
            JOIN shop.subcategory s ON s.id = p.subcategory_id
            WHERE TRUE
            ",
        );
        push_category(&mut qb, category);

        let row = qb
            .build_query_as::<InventoryRow>()
            .fetch_one(self.pool)
            .await?;
        Ok(InventoryKpis {
            total_skus: row.total_skus,
            low_stock_count: row.low_stock_count,
            total_units: row.total_units,
            inventory_value: Price::new(row.inventory_value),
        })
    }

    /// Sales totals for order items dated inside `range`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sales_kpis(
        &self,
        category: Option<CategoryId>,
        range: DateRange,
    ) -> Result<SalesKpis, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT COALESCE(SUM(oi.quantity * oi.unit_price), 0) AS revenue,
                   COALESCE(SUM(oi.quantity), 0)::BIGINT AS units_sold,
                   COUNT(DISTINCT o.id) AS orders_count
            FROM shop.order_item oi
            JOIN shop."order" o ON o.id = oi.order_id
            JOIN shop.product p ON p.sku = oi.sku
            JOIN shop.subcategory s ON s.id = p.subcategory_id
            WHERE TRUE
            "#,
        );
        push_range(&mut qb, range);
        push_category(&mut qb, category);

        let row = qb.build_query_as::<SalesRow>().fetch_one(self.pool).await?;
        Ok(SalesKpis {
            revenue: Price::new(row.revenue),
            units_sold: row.units_sold,
            orders_count: row.orders_count,
        })
    }

    /// Best sellers by units in `range`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_products(
        &self,
        category: Option<CategoryId>,
        range: DateRange,
    ) -> Result<Vec<TopProduct>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT p.sku, p.name,
                   SUM(oi.quantity)::BIGINT AS units_sold,
                   SUM(oi.quantity * oi.unit_price) AS revenue
            FROM shop.order_item oi
            JOIN shop."order" o ON o.id = oi.order_id
            JOIN shop.product p ON p.sku = oi.sku
            JOIN shop.subcategory s ON s.id = p.subcategory_id
            WHERE TRUE
            "#,
        );
        push_range(&mut qb, range);
        push_category(&mut qb, category);
        qb.push(" GROUP BY p.sku, p.name ORDER BY units_sold DESC, p.sku LIMIT ")
            .push_bind(TOP_PRODUCTS_LIMIT);

        let rows = qb
            .build_query_as::<TopProductRow>()
            .fetch_all(self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| TopProduct {
                sku: row.sku,
                name: row.name,
                units_sold: row.units_sold,
                revenue: Price::new(row.revenue),
            })
            .collect())
    }

    /// Lowest-stock products at or below their reorder level.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn low_stock(
        &self,
        category: Option<CategoryId>,
    ) -> Result<Vec<LowStockItem>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r"
            SELECT p.sku, p.name, p.quantity_on_hand, p.reorder_quantity
            FROM shop.product p
            JOIN shop.subcategory s ON s.id = p.subcategory_id
            WHERE p.quantity_on_hand <= p.reorder_quantity
            ",
        );
        push_category(&mut qb, category);
        qb.push(" ORDER BY p.quantity_on_hand ASC, p.sku LIMIT ")
            .push_bind(LOW_STOCK_LIMIT);

        let rows = qb
            .build_query_as::<LowStockRow>()
            .fetch_all(self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| LowStockItem {
                sku: row.sku,
                name: row.name,
                quantity_on_hand: row.quantity_on_hand,
                reorder_quantity: row.reorder_quantity,
            })
            .collect())
    }
}

fn push_category(qb: &mut QueryBuilder<'_, Postgres>, category: Option<CategoryId>) {
    if let Some(id) = category {
        qb.push(" AND s.category_id = ").push_bind(id.as_i32());
    }
}

fn push_range(qb: &mut QueryBuilder<'_, Postgres>, range: DateRange) {
    qb.push(" AND o.order_date BETWEEN ")
        .push_bind(range.start)
        .push(" AND ")
        .push_bind(range.end);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_date_range_swaps_reversed_bounds() {
        let range = DateRange::new(date("2026-03-10"), date("2026-03-01"));
        assert_eq!(range.start, date("2026-03-01"));
        assert_eq!(range.end, date("2026-03-10"));
    }

    #[test]
    fn test_range_then_category_placeholders() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 WHERE TRUE");
        push_range(&mut qb, DateRange::new(date("2026-01-01"), date("2026-01-31")));
        push_category(&mut qb, Some(CategoryId::new(3)));
        assert_eq!(
            qb.sql(),
            "SELECT 1 WHERE TRUE AND o.order_date BETWEEN $1 AND $2 AND s.category_id = $3"
        );
    }
}
