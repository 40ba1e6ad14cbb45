//! Order history types.

use chrono::NaiveDate;

use rust_decimal::Decimal;

use shopfront_core::{OrderId, OrderStatus, PaymentMethod, PaymentStatus, Price, Sku};

/// One row of the order history list.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSummary {
    pub id: OrderId,
    pub status: OrderStatus,
    pub order_date: NaiveDate,
    pub order_price: Price,
    pub shipping_fee: Price,
    pub item_count: i64,
}

impl OrderSummary {
    /// Amount charged: items plus shipping.
    #[must_use]
    pub fn total(&self) -> Price {
        self.order_price + self.shipping_fee
    }
}

/// A purchased line, priced at the time of purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub sku: Sku,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Price,
}

impl OrderLine {
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Payment recorded against an order.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRecord {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub amount: Price,
    pub transaction_ref: String,
}

/// Full order with lines and payment.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDetail {
    pub summary: OrderSummary,
    pub required_date: NaiveDate,
    pub shipped_date: Option<NaiveDate>,
    pub shipping_address: String,
    pub postal_code: String,
    pub phone: String,
    pub lines: Vec<OrderLine>,
    pub payment: Option<PaymentRecord>,
}

/// Orders below this subtotal pay [`FLAT_SHIPPING_FEE`].
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(5000, 0, 0, false, 2);

/// Flat shipping charge for small orders.
pub const FLAT_SHIPPING_FEE: Decimal = Decimal::from_parts(500, 0, 0, false, 2);

/// Shipping fee for an order with the given item subtotal.
#[must_use]
pub fn shipping_fee(subtotal: Price) -> Price {
    if subtotal.amount() < FREE_SHIPPING_THRESHOLD {
        Price::new(FLAT_SHIPPING_FEE)
    } else {
        Price::ZERO
    }
}
