//! Order placement and history.
//!
//! Placing an order is the one multi-table write on the storefront. It runs
//! in a single transaction that locks the cart lines and their products,
//! so a concurrent checkout of the same stock fails cleanly instead of
//! overselling.

use chrono::{Days, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shopfront_core::{
    CustomerId, OrderId, OrderStatus, PaymentMethod, PaymentStatus, Price, Sku,
};

use super::RepositoryError;
use crate::models::{OrderDetail, OrderLine, OrderSummary, PaymentRecord, shipping_fee};

/// Days between placing an order and its required date.
const REQUIRED_WITHIN_DAYS: u64 = 7;

/// Checkout details captured from the form.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub shipping_address: String,
    pub postal_code: String,
    pub phone: String,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, FromRow)]
struct LockedLine {
    sku: Sku,
    quantity: i32,
    unit_price: Price,
    quantity_on_hand: i32,
    hidden: bool,
}

#[derive(Debug, FromRow)]
struct OrderSummaryRow {
    id: OrderId,
    status: OrderStatus,
    order_date: NaiveDate,
    order_price: Price,
    shipping_fee: Price,
    item_count: i64,
}

impl From<OrderSummaryRow> for OrderSummary {
    fn from(row: OrderSummaryRow) -> Self {
        Self {
            id: row.id,
            status: row.status,
            order_date: row.order_date,
            order_price: row.order_price,
            shipping_fee: row.shipping_fee,
            item_count: row.item_count,
        }
    }
}

#[derive(Debug, FromRow)]
struct OrderDetailRow {
    #[sqlx(flatten)]
    summary: OrderSummaryRow,
    required_date: NaiveDate,
    shipped_date: Option<NaiveDate>,
    shipping_address: String,
    postal_code: String,
    phone: String,
}

#[derive(Debug, FromRow)]
struct OrderLineRow {
    sku: Sku,
    name: String,
    quantity: i32,
    unit_price: Price,
}

#[derive(Debug, FromRow)]
struct PaymentRow {
    method: PaymentMethod,
    status: PaymentStatus,
    amount: Price,
    transaction_ref: String,
}

const SUMMARY_SELECT: &str = r"
    SELECT o.id, o.status, o.order_date, o.order_price, o.shipping_fee,
           COALESCE((SELECT SUM(oi.quantity) FROM shop.order_item oi WHERE oi.order_id = o.id), 0)::BIGINT
               AS item_count
";

/// Repository for orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Turn the customer's cart into an order.
    ///
    /// Creates the order, its items and payment, decrements stock, empties
    /// the cart and saves the shipping details onto the customer profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the cart is empty, holds a
    /// hidden product, or a line exceeds current stock. Nothing is written in
    /// that case.
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn place_order(
        &self,
        customer_id: CustomerId,
        order: &NewOrder,
    ) -> Result<OrderId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let lines = sqlx::query_as::<_, LockedLine>(
            r"
            SELECT i.sku, i.quantity, p.unit_price, p.quantity_on_hand,
                   (h.sku IS NOT NULL) AS hidden
            FROM shop.cart c
            JOIN shop.cart_item i ON i.cart_id = c.id
            JOIN shop.product p ON p.sku = i.sku
            LEFT JOIN shop.hidden_product h ON h.sku = p.sku
            WHERE c.customer_id = $1
            ORDER BY i.sku
            FOR UPDATE OF i, p
            ",
        )
        .bind(customer_id)
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            return Err(RepositoryError::Conflict("cart is empty".to_string()));
        }
        if let Some(line) = lines.iter().find(|l| l.hidden) {
            return Err(RepositoryError::Conflict(format!(
                "{} is no longer available",
                line.sku
            )));
        }
        if let Some(line) = lines.iter().find(|l| l.quantity > l.quantity_on_hand) {
            return Err(RepositoryError::Conflict(format!(
                "insufficient stock for {}",
                line.sku
            )));
        }

        let order_price: Price = lines.iter().map(|l| l.unit_price.times(l.quantity)).sum();
        let fee = shipping_fee(order_price);
        let today = Utc::now().date_naive();
        let required_date = today
            .checked_add_days(Days::new(REQUIRED_WITHIN_DAYS))
            .unwrap_or(today);

        let order_id = sqlx::query_scalar::<_, OrderId>(
            r#"
            INSERT INTO shop."order"
                (customer_id, status, order_date, required_date, order_price,
                 shipping_fee, shipping_address, postal_code, phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(customer_id)
        .bind(OrderStatus::Placed)
        .bind(today)
        .bind(required_date)
        .bind(order_price)
        .bind(fee)
        .bind(&order.shipping_address)
        .bind(&order.postal_code)
        .bind(&order.phone)
        .fetch_one(&mut *tx)
        .await?;

        for line in &lines {
            sqlx::query(
                r"
                INSERT INTO shop.order_item (order_id, sku, quantity, unit_price)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(order_id)
            .bind(&line.sku)
            .bind(line.quantity)
            .bind(line.unit_price)
            .execute(&mut *tx)
            .await?;

            let updated = sqlx::query(
                r"
                UPDATE shop.product
                SET quantity_on_hand = quantity_on_hand - $2, updated_at = now()
                WHERE sku = $1 AND quantity_on_hand >= $2
                ",
            )
            .bind(&line.sku)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                return Err(RepositoryError::Conflict(format!(
                    "insufficient stock for {}",
                    line.sku
                )));
            }
        }

        let transaction_ref = format!("TXN-{}", Uuid::new_v4().simple());
        sqlx::query(
            r"
            INSERT INTO shop.payment (order_id, method, status, amount, transaction_ref)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(order_id)
        .bind(order.payment_method)
        .bind(order.payment_method.initial_status())
        .bind(order_price + fee)
        .bind(&transaction_ref)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
            DELETE FROM shop.cart_item i
            USING shop.cart c
            WHERE c.id = i.cart_id AND c.customer_id = $1
            ",
        )
        .bind(customer_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE shop.customer SET address = $2, postal_code = $3, phone = $4 WHERE id = $1",
        )
        .bind(customer_id)
        .bind(&order.shipping_address)
        .bind(&order.postal_code)
        .bind(&order.phone)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order_id,
            customer_id = %customer_id,
            lines = lines.len(),
            "Order placed"
        );

        Ok(order_id)
    }

    /// The customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let sql = format!(
            r#"{SUMMARY_SELECT}
            FROM shop."order" o
            WHERE o.customer_id = $1
            ORDER BY o.order_date DESC, o.id DESC"#
        );
        let rows = sqlx::query_as::<_, OrderSummaryRow>(&sql)
            .bind(customer_id)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(OrderSummary::from).collect())
    }

    /// One of the customer's orders with lines and payment.
    ///
    /// Returns `None` for an order owned by another customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_customer(
        &self,
        customer_id: CustomerId,
        order_id: OrderId,
    ) -> Result<Option<OrderDetail>, RepositoryError> {
        let sql = format!(
            r#"{SUMMARY_SELECT},
                   o.required_date, o.shipped_date,
                   COALESCE(o.shipping_address, '') AS shipping_address,
                   COALESCE(o.postal_code, '') AS postal_code,
                   COALESCE(o.phone, '') AS phone
            FROM shop."order" o
            WHERE o.id = $1 AND o.customer_id = $2"#
        );
        let Some(row) = sqlx::query_as::<_, OrderDetailRow>(&sql)
            .bind(order_id)
            .bind(customer_id)
            .fetch_optional(self.pool)
            .await?
        else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, OrderLineRow>(
            r"
            SELECT oi.sku, p.name, oi.quantity, oi.unit_price
            FROM shop.order_item oi
            JOIN shop.product p ON p.sku = oi.sku
            WHERE oi.order_id = $1
            ORDER BY oi.id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        let payment = sqlx::query_as::<_, PaymentRow>(
            r"
            SELECT method, status, amount, transaction_ref
            FROM shop.payment
            WHERE order_id = $1
            ORDER BY id DESC
            LIMIT 1
            ",
        )
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(Some(OrderDetail {
            summary: OrderSummary::from(row.summary),
            required_date: row.required_date,
            shipped_date: row.shipped_date,
            shipping_address: row.shipping_address,
            postal_code: row.postal_code,
            phone: row.phone,
            lines: lines
                .into_iter()
                .map(|l| OrderLine {
                    sku: l.sku,
                    name: l.name,
                    quantity: l.quantity,
                    unit_price: l.unit_price,
                })
                .collect(),
            payment: payment.map(|p| PaymentRecord {
                method: p.method,
                status: p.status,
                amount: p.amount,
                transaction_ref: p.transaction_ref,
            }),
        }))
    }
}
