//! Catalogue domain types: products, categories and subcategories.

use shopfront_core::{CategoryId, Price, Sku, SubCategoryId};

/// A product as staff see it, hidden or not.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminProduct {
    pub sku: Sku,
    pub name: String,
    pub description: String,
    pub category_id: CategoryId,
    pub category_name: String,
    pub subcategory_id: SubCategoryId,
    pub subcategory_name: String,
    pub quantity_on_hand: i32,
    pub reorder_quantity: i32,
    pub unit_price: Price,
    pub rating: f64,
    /// Hidden products never reach the storefront.
    pub hidden: bool,
}

impl AdminProduct {
    /// Stock is at or below the reorder level.
    #[must_use]
    pub const fn is_low(&self) -> bool {
        self.quantity_on_hand <= self.reorder_quantity
    }

    /// `LOW` or `OK`, as shown on inventory pages and exports.
    #[must_use]
    pub const fn stock_status(&self) -> &'static str {
        if self.is_low() { "LOW" } else { "OK" }
    }
}

/// Validated product fields for create and edit.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub subcategory_id: SubCategoryId,
    pub quantity_on_hand: i32,
    pub reorder_quantity: i32,
    pub unit_price: Price,
    pub rating: f64,
}

/// Category with usage counts for the category page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySummary {
    pub id: CategoryId,
    pub name: String,
    pub subcategory_count: i64,
    pub product_count: i64,
}

/// Subcategory with its parent and product count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubcategorySummary {
    pub id: SubCategoryId,
    pub name: String,
    pub category_id: CategoryId,
    pub category_name: String,
    pub product_count: i64,
}

impl SubcategorySummary {
    /// "Category / Subcategory", used in select boxes.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{} / {}", self.category_name, self.name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn product(qty: i32, reorder: i32) -> AdminProduct {
        AdminProduct {
            sku: Sku::parse("SKU-1").unwrap(),
            name: "Desk Lamp".to_string(),
            description: String::new(),
            category_id: CategoryId::new(1),
            category_name: "Home & Kitchen".to_string(),
            subcategory_id: SubCategoryId::new(2),
            subcategory_name: "Lighting".to_string(),
            quantity_on_hand: qty,
            reorder_quantity: reorder,
            unit_price: Price::new(Decimal::new(1999, 2)),
            rating: 4.0,
            hidden: false,
        }
    }

    #[test]
    fn test_low_stock_includes_equal() {
        assert!(product(5, 5).is_low());
        assert!(product(0, 10).is_low());
        assert!(!product(6, 5).is_low());
        assert_eq!(product(5, 5).stock_status(), "LOW");
        assert_eq!(product(50, 5).stock_status(), "OK");
    }

    #[test]
    fn test_qualified_name() {
        let sub = SubcategorySummary {
            id: SubCategoryId::new(3),
            name: "Novels".to_string(),
            category_id: CategoryId::new(1),
            category_name: "Books".to_string(),
            product_count: 0,
        };
        assert_eq!(sub.qualified_name(), "Books / Novels");
    }
}
