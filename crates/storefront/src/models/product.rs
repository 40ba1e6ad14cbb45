//! Product domain type.

use shopfront_core::{Price, Sku};

/// A visible catalogue product with its category names resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub sku: Sku,
    pub name: String,
    pub description: String,
    pub category_name: String,
    pub subcategory_name: String,
    pub quantity_on_hand: i32,
    pub unit_price: Price,
    pub rating: f64,
}

impl Product {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.quantity_on_hand > 0
    }
}
