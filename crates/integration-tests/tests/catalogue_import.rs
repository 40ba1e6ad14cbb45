//! CSV parsing for the catalogue bulk upload and the CLI imports.
//!
//! These tests need no database: they cover everything up to the rows handed
//! to the repositories.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rust_decimal::Decimal;
use shopfront_admin::db::products::UpsertReport;
use shopfront_admin::models::FlashLevel;
use shopfront_admin::services::import::ImportError;
use shopfront_admin::services::import::customers::parse_customer_file;
use shopfront_admin::services::import::products::{DEFAULT_CATEGORY, parse_product_file};
use shopfront_admin::services::import::transactions::{
    REORDER_QUANTITY, header_skus, seed_products,
};
use shopfront_admin::services::import::upload::{parse_upload, summary_messages};
use shopfront_core::Price;
use shopfront_integration_tests::sku;

const UPLOAD: &str = "\
sku,name,category,qty,price,reorder_qty,rating,hidden
BK-1,Atlas,Books,5,12.50,,4.5,no
BK-2,,Books,1,1.00,,,
BK-3,Globe,Books,-1,3.00,,,
BK-4,Map,Books,2,abc,,,
PN-5,Pen,Stationery,3,1.999,x,,yes
";

// ============================================================================
// Bulk upload
// ============================================================================

#[test]
fn test_upload_keeps_good_rows_and_reports_bad_ones() {
    let parsed = parse_upload(UPLOAD.as_bytes()).unwrap_or_else(|e| panic!("{e}"));

    let skus: Vec<&str> = parsed.rows.iter().map(|r| r.sku.as_str()).collect();
    assert_eq!(skus, vec!["BK-1", "PN-5"]);

    let lines: Vec<usize> = parsed.issues.iter().map(|(line, _)| *line).collect();
    assert_eq!(lines, vec![3, 4, 5, 6]);

    let pen = parsed
        .rows
        .iter()
        .find(|r| r.sku.as_str() == "PN-5")
        .unwrap_or_else(|| panic!("PN-5 missing"));
    assert_eq!(pen.unit_price, Price::new(Decimal::new(200, 2)));
    assert_eq!(pen.reorder_quantity, 0);
    assert_eq!(pen.hidden, Some(true));
}

#[test]
fn test_upload_summary_merges_skips_into_issue_list() {
    let parsed = parse_upload(UPLOAD.as_bytes()).unwrap_or_else(|e| panic!("{e}"));
    let report = UpsertReport {
        created: 1,
        updated: 0,
        skipped_existing: vec![(2, sku("BK-1"))],
    };

    let messages = summary_messages(&report, &parsed.issues);
    let texts: Vec<&str> = messages.iter().map(|(_, text)| text.as_str()).collect();
    assert_eq!(texts.len(), 2);
    assert!(texts.contains(&"Created 1 products."));
    assert!(texts.iter().any(|t| {
        t.starts_with("5 issues: Line 2: SKU 'BK-1' exists (skipped) | Line 3: missing sku or name")
    }));
    assert!(
        messages
            .iter()
            .any(|(level, text)| *level == FlashLevel::Error && text.contains("bad price 'abc'"))
    );
}

#[test]
fn test_upload_rejects_file_without_required_columns() {
    let err = parse_upload(b"sku,name\nA,B\n").err();
    assert_eq!(
        err.map(|e| e.to_string()),
        Some("Missing required columns: category, price, qty".to_string())
    );
}

#[test]
fn test_upload_must_be_utf8() {
    assert!(matches!(
        parse_upload(b"sku,name,category,qty,price\n\xff,x,y,1,1\n"),
        Err(ImportError::NotUtf8)
    ));
}

// ============================================================================
// CLI imports
// ============================================================================

#[test]
fn test_product_file_vendor_headers_and_defaults() {
    let file = parse_product_file(
        b"SKU code,Product name,Product Category,Product Subcategory,Quantity on hand,\
Reorder Quantity,Unit price,Product rating\n\
SKU-1,Lamp,Home,Lighting,12,3,19.90,4.2\n\
,No sku,Home,,1,1,1,1\n\
SKU-2,,,,lots,,-5,\n",
    )
    .unwrap_or_else(|e| panic!("{e}"));

    assert_eq!(file.skipped_lines, vec![3]);
    assert!(!file.lossy);

    let skus: Vec<&str> = file.rows.iter().map(|r| r.sku.as_str()).collect();
    assert_eq!(skus, vec!["SKU-1", "SKU-2"]);

    let bare = file
        .rows
        .iter()
        .find(|r| r.sku.as_str() == "SKU-2")
        .unwrap_or_else(|| panic!("SKU-2 missing"));
    assert_eq!(bare.name, "SKU-2");
    assert_eq!(bare.category, DEFAULT_CATEGORY);
    assert_eq!(bare.quantity_on_hand, 0);
    assert_eq!(bare.unit_price, Price::ZERO);
}

#[test]
fn test_customer_file_is_decoded_lossily() {
    let file = parse_customer_file(b"age,gender,occupation\n41.9,,Caf\xe9 owner\n")
        .unwrap_or_else(|e| panic!("{e}"));
    assert!(file.lossy);

    let ages: Vec<i32> = file.customers.iter().map(|c| c.age).collect();
    assert_eq!(ages, vec![41]);
    assert!(file.customers.iter().all(|c| c.gender == "Male"
        && c.education == "Secondary"
        && c.occupation.starts_with("Caf")));
}

#[test]
fn test_transactions_header_seeds_placeholder_products() {
    let skus = header_skus(b"A-1,B-2,,A-1\n1,0,0,1\n").unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(skus, vec![sku("A-1"), sku("B-2")]);

    let rows = seed_products(&skus, &mut StdRng::seed_from_u64(7));
    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert_eq!(row.reorder_quantity, REORDER_QUANTITY);
        assert!((0..=200).contains(&row.quantity_on_hand));
        assert!((2.5..=5.0).contains(&row.rating));
        let price = row.unit_price.amount();
        assert!(price >= Decimal::new(500, 2) && price <= Decimal::new(20_000, 2));
    }
}
