//! Dashboard KPI types.

use shopfront_core::{Price, Sku};

/// Stock KPIs over the selected category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InventoryKpis {
    pub total_skus: i64,
    /// Products with `quantity_on_hand <= reorder_quantity`.
    pub low_stock_count: i64,
    pub total_units: i64,
    /// Σ quantity × unit price.
    pub inventory_value: Price,
}

/// Sales KPIs over order items in the date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SalesKpis {
    /// Σ quantity × unit price at the time of sale.
    pub revenue: Price,
    pub units_sold: i64,
    /// Distinct orders.
    pub orders_count: i64,
}

/// A best seller in the date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopProduct {
    pub sku: Sku,
    pub name: String,
    pub units_sold: i64,
    pub revenue: Price,
}

/// A product at or below its reorder level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowStockItem {
    pub sku: Sku,
    pub name: String,
    pub quantity_on_hand: i32,
    pub reorder_quantity: i32,
}
