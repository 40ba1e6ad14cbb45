//! CSV imports for the catalogue and customer tables.
//!
//! - [`upload`] - the catalogue bulk upload form, strict UTF-8, line-numbered issues
//! - [`products`] - the CLI product file, with vendor header aliases
//! - [`customers`] - the CLI customer demographics file
//! - [`transactions`] - products named by a basket file's header row
//!
//! Parsers are pure; callers hand the parsed rows to the repositories.

pub mod customers;
pub mod products;
pub mod transactions;
pub mod upload;

use std::collections::HashMap;

use csv::StringRecord;
use thiserror::Error;

use crate::db::products::ProductUpsert;
use crate::services::catalogue::{MAX_CATEGORY_NAME_LENGTH, MAX_PRODUCT_NAME_LENGTH, PRICE_CEILING};

/// Errors that stop an import before any row is written.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("File must be UTF-8 encoded.")]
    NotUtf8,

    #[error("Missing header row.")]
    MissingHeader,

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<&'static str>),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Decode file bytes, replacing invalid UTF-8. Returns the text and whether
/// any replacement happened.
#[must_use]
pub fn decode_lossy(bytes: &[u8]) -> (String, bool) {
    let bytes = strip_bom(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), false),
        Err(_) => (String::from_utf8_lossy(bytes).into_owned(), true),
    }
}

/// Why a parsed product row cannot be stored, if a value is too long or
/// too large for its catalogue column.
#[must_use]
pub fn oversized_field(row: &ProductUpsert) -> Option<String> {
    let too_long = |value: &str, limit: usize| value.chars().count() > limit;
    if too_long(&row.name, MAX_PRODUCT_NAME_LENGTH) {
        Some(format!("name longer than {MAX_PRODUCT_NAME_LENGTH} characters"))
    } else if too_long(row.category.trim(), MAX_CATEGORY_NAME_LENGTH) {
        Some(format!("category longer than {MAX_CATEGORY_NAME_LENGTH} characters"))
    } else if too_long(row.subcategory.trim(), MAX_CATEGORY_NAME_LENGTH) {
        Some(format!("subcategory longer than {MAX_CATEGORY_NAME_LENGTH} characters"))
    } else if row.unit_price.amount() >= PRICE_CEILING {
        Some(format!("price '{}' too large", row.unit_price.amount()))
    } else {
        None
    }
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
}

/// Column positions keyed by header name.
///
/// Names are matched exactly unless built with [`HeaderIndex::lowercase`].
#[derive(Debug, Clone, Default)]
pub struct HeaderIndex {
    columns: HashMap<String, usize>,
    lowercase: bool,
}

impl HeaderIndex {
    /// Index headers as written, trimmed.
    #[must_use]
    pub fn exact(headers: &StringRecord) -> Self {
        Self::build(headers, false)
    }

    /// Index headers trimmed and lowercased; lookups are lowercased too.
    #[must_use]
    pub fn lowercase(headers: &StringRecord) -> Self {
        Self::build(headers, true)
    }

    fn build(headers: &StringRecord, lowercase: bool) -> Self {
        let columns = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let h = h.trim();
                (if lowercase { h.to_lowercase() } else { h.to_string() }, i)
            })
            .filter(|(h, _)| !h.is_empty())
            .collect();
        Self { columns, lowercase }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        if self.lowercase {
            self.columns.get(&name.to_lowercase()).copied()
        } else {
            self.columns.get(name).copied()
        }
    }

    /// Trimmed cell for `name`, empty when the column or cell is absent.
    #[must_use]
    pub fn get<'r>(&self, record: &'r StringRecord, name: &str) -> &'r str {
        self.position(name)
            .and_then(|i| record.get(i))
            .map_or("", str::trim)
    }

    /// First non-empty cell among `names`.
    #[must_use]
    pub fn first_of<'r>(&self, record: &'r StringRecord, names: &[&str]) -> &'r str {
        names
            .iter()
            .map(|name| self.get(record, name))
            .find(|v| !v.is_empty())
            .unwrap_or("")
    }
}

/// Parse a whole number that may be written as a float, truncating toward
/// zero. Anything unparsable is 0.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn lenient_int(raw: &str) -> i32 {
    let raw = raw.trim();
    raw.parse::<i32>().unwrap_or_else(|_| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map_or(0, |v| {
                v.trunc().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
            })
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_lossy_strips_bom() {
        let (text, lossy) = decode_lossy(b"\xEF\xBB\xBFsku,name\n");
        assert_eq!(text, "sku,name\n");
        assert!(!lossy);
    }

    #[test]
    fn test_decode_lossy_replaces_bad_bytes() {
        let (text, lossy) = decode_lossy(b"caf\xE9\n");
        assert!(lossy);
        assert!(text.starts_with("caf"));
        assert!(text.contains('\u{FFFD}'));
    }

    #[test]
    fn test_header_index_lowercase_lookup() {
        let headers = StringRecord::from(vec![" SKU ", "Name", ""]);
        let index = HeaderIndex::lowercase(&headers);
        let row = StringRecord::from(vec!["A-1", "  Lamp  ", "x"]);
        assert!(index.contains("sku"));
        assert!(index.contains("NAME"));
        assert_eq!(index.get(&row, "name"), "Lamp");
        assert_eq!(index.get(&row, "missing"), "");
    }

    #[test]
    fn test_first_of_skips_blank_cells() {
        let headers = StringRecord::from(vec!["SKU code", "sku"]);
        let index = HeaderIndex::exact(&headers);
        let row = StringRecord::from(vec!["", "B-2"]);
        assert_eq!(index.first_of(&row, &["SKU code", "sku"]), "B-2");
    }

    #[test]
    fn test_lenient_int() {
        assert_eq!(lenient_int("42"), 42);
        assert_eq!(lenient_int("3.9"), 3);
        assert_eq!(lenient_int("-2.5"), -2);
        assert_eq!(lenient_int("n/a"), 0);
        assert_eq!(lenient_int(""), 0);
    }
}
