//! Customer directory types.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use shopfront_core::{CustomerId, OrderId, OrderStatus, Price};

/// A customer record with its demographic profile.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRecord {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub postal_code: String,
    pub age: i32,
    pub gender: String,
    pub employment_status: String,
    pub occupation: String,
    pub education: String,
    pub household_size: i32,
    pub has_children: bool,
    pub monthly_income: Decimal,
    pub preferred_category: String,
}

impl CustomerRecord {
    /// Full name, or `Customer #id` for anonymous imports.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            format!("Customer #{}", self.id)
        } else {
            full.to_string()
        }
    }
}

/// One order in a customer's history.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerOrder {
    pub id: OrderId,
    pub order_date: NaiveDate,
    pub status: OrderStatus,
    pub order_price: Price,
    pub shipping_fee: Price,
    pub item_count: i64,
}

/// Lifetime order totals for one customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomerTotals {
    pub total_orders: i64,
    pub total_spent: Price,
}
