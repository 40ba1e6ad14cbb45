//! CSV exports of the catalogue and stock levels.

use chrono::NaiveDateTime;
use csv::Writer;

use crate::models::AdminProduct;

const PRODUCT_HEADER: [&str; 9] = [
    "SKU",
    "Name",
    "Category",
    "Subcategory",
    "Qty",
    "Reorder Qty",
    "Unit Price",
    "Rating",
    "Hidden",
];

const INVENTORY_HEADER: [&str; 5] = ["SKU", "Name", "Qty On Hand", "Reorder Qty", "Status"];

/// Errors writing an export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV buffer error: {0}")]
    Buffer(String),
}

fn finish(writer: Writer<Vec<u8>>) -> Result<Vec<u8>, ExportError> {
    writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.error().to_string()))
}

/// Catalogue export, one row per product.
///
/// # Errors
///
/// Returns `ExportError` if a record cannot be written.
pub fn products_csv(products: &[AdminProduct]) -> Result<Vec<u8>, ExportError> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(PRODUCT_HEADER)?;
    for p in products {
        writer.write_record([
            p.sku.as_str(),
            &p.name,
            &p.category_name,
            &p.subcategory_name,
            &p.quantity_on_hand.to_string(),
            &p.reorder_quantity.to_string(),
            &p.unit_price.amount().to_string(),
            &p.rating.to_string(),
            if p.hidden { "Yes" } else { "No" },
        ])?;
    }
    finish(writer)
}

/// Stock export with a LOW/OK status column.
///
/// # Errors
///
/// Returns `ExportError` if a record cannot be written.
pub fn inventory_csv(products: &[AdminProduct]) -> Result<Vec<u8>, ExportError> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(INVENTORY_HEADER)?;
    for p in products {
        writer.write_record([
            p.sku.as_str(),
            &p.name,
            &p.quantity_on_hand.to_string(),
            &p.reorder_quantity.to_string(),
            p.stock_status(),
        ])?;
    }
    finish(writer)
}

/// `{prefix}_YYYYMMDD_HHMMSS.csv`
#[must_use]
pub fn export_filename(prefix: &str, at: NaiveDateTime) -> String {
    format!("{prefix}_{}.csv", at.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use shopfront_core::{CategoryId, Price, Sku, SubCategoryId};

    use super::*;

    fn product(sku: &str, qty: i32, hidden: bool) -> AdminProduct {
        AdminProduct {
            sku: Sku::parse(sku).unwrap(),
            name: "Tea, Green".to_string(),
            description: String::new(),
            category_id: CategoryId::new(1),
            category_name: "Grocery".to_string(),
            subcategory_id: SubCategoryId::new(2),
            subcategory_name: "Drinks".to_string(),
            quantity_on_hand: qty,
            reorder_quantity: 5,
            unit_price: Price::new(Decimal::new(450, 2)),
            rating: 4.5,
            hidden,
        }
    }

    #[test]
    fn test_products_csv() {
        let bytes = products_csv(&[product("T-1", 9, true)]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "SKU,Name,Category,Subcategory,Qty,Reorder Qty,Unit Price,Rating,Hidden\n\
             T-1,\"Tea, Green\",Grocery,Drinks,9,5,4.50,4.5,Yes\n"
        );
    }

    #[test]
    fn test_inventory_csv_status() {
        let bytes = inventory_csv(&[product("T-1", 5, false), product("T-2", 6, false)]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "SKU,Name,Qty On Hand,Reorder Qty,Status");
        assert!(lines[1].ends_with(",5,5,LOW"));
        assert!(lines[2].ends_with(",6,5,OK"));
    }

    #[test]
    fn test_export_filename() {
        let at = NaiveDate::from_ymd_opt(2026, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 1)
            .unwrap();
        assert_eq!(export_filename("products", at), "products_20260307_090501.csv");
    }
}
