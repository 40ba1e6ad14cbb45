//! Product file import for the CLI.
//!
//! Accepts the vendor export headers ("SKU code", "Product name", ...) as
//! well as snake_case ones. Numbers that do not parse become 0.

use std::str::FromStr;

use rust_decimal::Decimal;

use shopfront_core::{Price, Sku};

use super::{HeaderIndex, ImportError, decode_lossy, lenient_int, oversized_field};
use crate::db::products::ProductUpsert;

const SKU: &[&str] = &["SKU code", "sku", "sku_code"];
const NAME: &[&str] = &["Product name", "product_name", "name"];
const DESCRIPTION: &[&str] = &["Product description", "description"];
const CATEGORY: &[&str] = &["Product Category", "category"];
const SUBCATEGORY: &[&str] = &["Product Subcategory", "sub_category", "subcategory"];
const QUANTITY: &[&str] = &["Quantity on hand", "quantity_on_hand"];
const REORDER: &[&str] = &["Reorder Quantity", "reorder_quantity"];
const PRICE: &[&str] = &["Unit price", "unit_price"];
const RATING: &[&str] = &["Product rating", "product_rating"];

/// Category used when a row names none.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// A parsed product file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFile {
    pub rows: Vec<ProductUpsert>,
    /// Lines skipped for having no SKU or a value the catalogue cannot hold.
    pub skipped_lines: Vec<usize>,
    /// Whether invalid UTF-8 had to be replaced.
    pub lossy: bool,
}

/// Parse a product file.
///
/// # Errors
///
/// Returns `ImportError::MissingHeader` for an empty file, or
/// `ImportError::Csv` if the header row cannot be read.
pub fn parse_product_file(bytes: &[u8]) -> Result<ProductFile, ImportError> {
    let (text, lossy) = decode_lossy(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let index = HeaderIndex::exact(reader.headers()?);
    if index.is_empty() {
        return Err(ImportError::MissingHeader);
    }

    let mut file = ProductFile {
        lossy,
        ..ProductFile::default()
    };
    for (i, record) in reader.records().enumerate() {
        let line = i + 2;
        let Ok(record) = record else {
            file.skipped_lines.push(line);
            continue;
        };
        let Ok(sku) = Sku::parse(index.first_of(&record, SKU)) else {
            file.skipped_lines.push(line);
            continue;
        };

        let name = match index.first_of(&record, NAME) {
            "" => sku.to_string(),
            name => name.to_string(),
        };
        let category = match index.first_of(&record, CATEGORY) {
            "" => DEFAULT_CATEGORY.to_string(),
            category => category.to_string(),
        };
        let unit_price = Decimal::from_str(index.first_of(&record, PRICE))
            .ok()
            .filter(|d| !d.is_sign_negative())
            .map_or(Decimal::ZERO, |d| d.round_dp(2));
        let rating = index
            .first_of(&record, RATING)
            .parse::<f64>()
            .ok()
            .filter(|r| r.is_finite())
            .unwrap_or(0.0);

        let row = ProductUpsert {
            line,
            sku,
            name,
            description: index.first_of(&record, DESCRIPTION).to_string(),
            category,
            subcategory: index.first_of(&record, SUBCATEGORY).to_string(),
            quantity_on_hand: lenient_int(index.first_of(&record, QUANTITY)).max(0),
            reorder_quantity: lenient_int(index.first_of(&record, REORDER)).max(0),
            unit_price: Price::new(unit_price),
            rating,
            hidden: None,
        };
        if oversized_field(&row).is_some() {
            file.skipped_lines.push(line);
            continue;
        }
        file.rows.push(row);
    }

    Ok(file)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_headers() {
        let file = parse_product_file(
            b"SKU code,Product name,Product description,Product Category,Product Subcategory,\
Quantity on hand,Reorder Quantity,Unit price,Product rating\n\
SKU1001,Wireless Mouse,2.4GHz,Electronics,Accessories,25,10,19.90,4.2\n",
        )
        .unwrap();
        assert!(!file.lossy);
        let row = &file.rows[0];
        assert_eq!(row.sku.as_str(), "SKU1001");
        assert_eq!(row.name, "Wireless Mouse");
        assert_eq!(row.category, "Electronics");
        assert_eq!(row.subcategory, "Accessories");
        assert_eq!(row.quantity_on_hand, 25);
        assert_eq!(row.reorder_quantity, 10);
        assert_eq!(row.unit_price.amount(), Decimal::new(1990, 2));
        assert!((row.rating - 4.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snake_case_headers_and_defaults() {
        let file = parse_product_file(
            b"sku_code,product_name,quantity_on_hand,unit_price,product_rating\n\
A-1,,7.8,abc,n/a\n",
        )
        .unwrap();
        let row = &file.rows[0];
        assert_eq!(row.name, "A-1");
        assert_eq!(row.category, DEFAULT_CATEGORY);
        assert_eq!(row.subcategory, "");
        assert_eq!(row.quantity_on_hand, 7);
        assert_eq!(row.unit_price.amount(), Decimal::ZERO);
        assert!(row.rating.abs() < f64::EPSILON);
    }

    #[test]
    fn test_rows_without_sku_are_skipped() {
        let file = parse_product_file(b"sku,name\n,Ghost\nB-2,Real\n").unwrap();
        assert_eq!(file.skipped_lines, vec![2]);
        assert_eq!(file.rows.len(), 1);
        assert_eq!(file.rows[0].line, 3);
    }

    #[test]
    fn test_rows_that_do_not_fit_are_skipped() {
        let text = format!(
            "sku,name,category,unit_price\nA-1,{},Books,1\nB-2,Bee,Books,12345678901\nC-3,Cee,Books,3\n",
            "n".repeat(201)
        );
        let file = parse_product_file(text.as_bytes()).unwrap();
        assert_eq!(file.skipped_lines, vec![2, 3]);
        assert_eq!(file.rows.len(), 1);
        assert_eq!(file.rows[0].sku.as_str(), "C-3");
    }

    #[test]
    fn test_latin1_file_is_read_lossily() {
        let file = parse_product_file(b"sku,name\nC-3,Caf\xe9 Mug\n").unwrap();
        assert!(file.lossy);
        assert!(file.rows[0].name.starts_with("Caf"));
    }
}
