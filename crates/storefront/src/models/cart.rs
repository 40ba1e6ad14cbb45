//! Cart domain types.
//!
//! Guests keep a [`GuestCart`] in their session. Signed-in shoppers have a
//! database cart; both render through [`CartSummary`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use shopfront_core::{Price, Sku};

/// Session cart for anonymous shoppers: SKU to quantity.
///
/// Quantities are always positive; setting a line to zero or below removes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestCart {
    items: BTreeMap<Sku, i32>,
}

impl GuestCart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` units, summing with any existing line.
    pub fn add(&mut self, sku: Sku, quantity: i32) {
        if quantity <= 0 {
            return;
        }
        let entry = self.items.entry(sku).or_insert(0);
        *entry = entry.saturating_add(quantity);
    }

    /// Replace a line's quantity. Zero or below removes the line.
    pub fn set(&mut self, sku: Sku, quantity: i32) {
        if quantity <= 0 {
            self.items.remove(&sku);
        } else {
            self.items.insert(sku, quantity);
        }
    }

    pub fn remove(&mut self, sku: &Sku) -> bool {
        self.items.remove(sku).is_some()
    }

    #[must_use]
    pub fn quantity(&self, sku: &Sku) -> Option<i32> {
        self.items.get(sku).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all quantities, shown in the header badge.
    #[must_use]
    pub fn total_quantity(&self) -> i64 {
        self.items.values().map(|&q| i64::from(q)).sum()
    }

    pub fn skus(&self) -> impl Iterator<Item = &Sku> {
        self.items.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Sku, i32)> {
        self.items.iter().map(|(sku, &qty)| (sku, qty))
    }
}

/// One rendered cart line.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub sku: Sku,
    pub name: String,
    pub unit_price: Price,
    pub quantity: i32,
    /// Current stock, for the "only N left" hint and checkout validation.
    pub quantity_on_hand: i32,
    /// False once the product has been hidden from the storefront.
    pub available: bool,
}

impl CartLine {
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Cart lines plus their total.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartSummary {
    pub lines: Vec<CartLine>,
    pub total: Price,
}

impl CartSummary {
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let total = lines.iter().map(CartLine::subtotal).sum();
        Self { lines, total }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn skus(&self) -> Vec<Sku> {
        self.lines.iter().map(|line| line.sku.clone()).collect()
    }
}
