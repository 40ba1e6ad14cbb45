//! Guest carts, merge on login, checkout stock checks, shipping and pagination.

use rust_decimal::Decimal;
use shopfront_core::{Paginator, Price};
use shopfront_integration_tests::sku;
use shopfront_storefront::models::{GuestCart, Product, shipping_fee};
use shopfront_storefront::services::cart::{guest_lines, merge_plan, parse_quantity_updates};
use shopfront_storefront::services::checkout::line_problems;

fn product(code: &str, price_cents: i64, on_hand: i32) -> Product {
    Product {
        sku: sku(code),
        name: format!("Product {code}"),
        description: String::new(),
        category_name: "Books".to_string(),
        subcategory_name: "General".to_string(),
        quantity_on_hand: on_hand,
        unit_price: Price::new(Decimal::new(price_cents, 2)),
        rating: 4.0,
    }
}

// ============================================================================
// Guest cart
// ============================================================================

#[test]
fn test_guest_cart_add_sums_and_set_zero_removes() {
    let mut cart = GuestCart::new();
    cart.add(sku("BK-1"), 2);
    cart.add(sku("BK-1"), 3);
    cart.add(sku("BK-2"), 1);
    cart.add(sku("BK-3"), 0);
    assert_eq!(cart.quantity(&sku("BK-1")), Some(5));
    assert_eq!(cart.quantity(&sku("BK-3")), None);
    assert_eq!(cart.total_quantity(), 6);

    cart.set(sku("BK-2"), 0);
    assert_eq!(cart.quantity(&sku("BK-2")), None);
    assert!(cart.remove(&sku("BK-1")));
    assert!(cart.is_empty());
}

#[test]
fn test_guest_cart_session_json_is_a_sku_map() {
    let mut cart = GuestCart::new();
    cart.add(sku("BK-2"), 1);
    cart.add(sku("BK-1"), 4);
    let json = serde_json::to_value(&cart).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(json, serde_json::json!({"BK-1": 4, "BK-2": 1}));
}

#[test]
fn test_merge_on_login_carries_only_visible_products() {
    let mut cart = GuestCart::new();
    cart.add(sku("BK-1"), 2);
    cart.add(sku("BK-1"), 1);
    cart.add(sku("HIDDEN-7"), 4);
    cart.add(sku("BK-2"), 1);

    // Only products the catalogue still shows come back from the lookup.
    let visible = [product("BK-2", 500, 3), product("BK-1", 1000, 9)];
    assert_eq!(
        merge_plan(&cart, &visible),
        vec![(sku("BK-1"), 3), (sku("BK-2"), 1)]
    );
    assert!(merge_plan(&cart, &[]).is_empty());
}

#[test]
fn test_cart_form_updates_feed_guest_cart() {
    let mut cart = GuestCart::new();
    cart.add(sku("BK-1"), 1);
    cart.add(sku("BK-2"), 1);

    for (code, quantity) in parse_quantity_updates([("qty_BK-1", "3"), ("qty_BK-2", "0")]) {
        cart.set(code, quantity);
    }

    let lines = guest_lines(&cart, &[product("BK-1", 1250, 10), product("BK-2", 500, 10)]);
    let quantities: Vec<(&str, i32)> = lines.iter().map(|l| (l.sku.as_str(), l.quantity)).collect();
    assert_eq!(quantities, vec![("BK-1", 3)]);
    let total: Decimal = lines.iter().map(|l| l.subtotal().amount()).sum();
    assert_eq!(total, Decimal::new(3750, 2));
}

// ============================================================================
// Checkout
// ============================================================================

#[test]
fn test_checkout_flags_short_stock() {
    let mut cart = GuestCart::new();
    cart.add(sku("BK-1"), 2);
    cart.add(sku("BK-2"), 5);
    let lines = guest_lines(&cart, &[product("BK-1", 1000, 2), product("BK-2", 1000, 3)]);

    assert_eq!(
        line_problems(&lines),
        vec!["Only 3 of Product BK-2 left in stock.".to_string()]
    );
}

#[test]
fn test_shipping_is_free_from_threshold() {
    assert_eq!(
        shipping_fee(Price::new(Decimal::new(4999, 2))),
        Price::new(Decimal::new(500, 2))
    );
    assert_eq!(shipping_fee(Price::new(Decimal::new(5000, 2))), Price::ZERO);
}

// ============================================================================
// Pagination
// ============================================================================

#[test]
fn test_paginator_clamps_requested_page() {
    let last = Paginator::new(Some("99"), 25, 60);
    assert_eq!(last.page(), 3);
    assert_eq!(last.offset(), 50);
    assert!(!last.has_next());

    let junk = Paginator::new(Some("abc"), 25, 60);
    assert_eq!(junk.page(), 1);
    assert!(junk.has_next());
    assert!(!junk.has_previous());

    let empty = Paginator::new(None, 25, 0);
    assert_eq!(empty.num_pages(), 1);
}
