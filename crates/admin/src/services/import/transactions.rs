//! Seed products from a basket file's header row.
//!
//! Each header column of a transactions file is a SKU. Products that do not
//! exist yet are created with a placeholder description and random price,
//! rating and stock so the storefront has something to show.

use rand::Rng;
use rust_decimal::Decimal;

use shopfront_core::{Price, Sku};

use super::{ImportError, decode_lossy};
use crate::db::products::ProductUpsert;

/// Category given to seeded products.
pub const CATEGORY: &str = "Uncategorized";

/// Subcategory given to seeded products.
pub const SUBCATEGORY: &str = "General";

/// Reorder level given to seeded products.
pub const REORDER_QUANTITY: i32 = 10;

/// SKUs named by the header row, in order, without blanks or repeats.
///
/// # Errors
///
/// Returns `ImportError::MissingHeader` when the file has no header row.
pub fn header_skus(bytes: &[u8]) -> Result<Vec<Sku>, ImportError> {
    let (text, _) = decode_lossy(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut header = csv::StringRecord::new();
    if !reader.read_record(&mut header)? {
        return Err(ImportError::MissingHeader);
    }

    let mut skus: Vec<Sku> = Vec::new();
    for cell in &header {
        if let Ok(sku) = Sku::parse(cell)
            && !skus.contains(&sku)
        {
            skus.push(sku);
        }
    }
    Ok(skus)
}

/// Build a seeded product for each SKU.
#[must_use]
pub fn seed_products<R: Rng>(skus: &[Sku], rng: &mut R) -> Vec<ProductUpsert> {
    skus.iter()
        .enumerate()
        .map(|(i, sku)| ProductUpsert {
            line: i + 1,
            sku: sku.clone(),
            name: sku.to_string(),
            description: format!("Imported from transactions header ({sku})"),
            category: CATEGORY.to_string(),
            subcategory: SUBCATEGORY.to_string(),
            quantity_on_hand: rng.random_range(0..=200),
            reorder_quantity: REORDER_QUANTITY,
            unit_price: Price::new(Decimal::new(rng.random_range(500..=20_000), 2)),
            rating: f64::from(rng.random_range(250..=500)) / 100.0,
            hidden: None,
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_header_skus() {
        let skus = header_skus(b"SKU1, SKU2,,SKU1\n0,1,0,1\n").unwrap();
        let skus: Vec<&str> = skus.iter().map(Sku::as_str).collect();
        assert_eq!(skus, vec!["SKU1", "SKU2"]);
    }

    #[test]
    fn test_empty_file() {
        assert!(matches!(header_skus(b""), Err(ImportError::MissingHeader)));
    }

    #[test]
    fn test_seeded_values_in_range() {
        let skus = vec![Sku::parse("A").unwrap(), Sku::parse("B").unwrap()];
        let mut rng = StdRng::seed_from_u64(7);
        let products = seed_products(&skus, &mut rng);
        assert_eq!(products.len(), 2);
        for p in &products {
            assert_eq!(p.name, p.sku.as_str());
            assert_eq!(p.category, CATEGORY);
            assert_eq!(p.subcategory, SUBCATEGORY);
            assert_eq!(p.reorder_quantity, 10);
            assert!((0..=200).contains(&p.quantity_on_hand));
            assert!(p.unit_price.amount() >= Decimal::new(500, 2));
            assert!(p.unit_price.amount() <= Decimal::new(20_000, 2));
            assert!((2.5..=5.0).contains(&p.rating));
        }
        assert_eq!(products[0].description, "Imported from transactions header (A)");
    }
}
