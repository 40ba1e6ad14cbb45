//! Catalogue bulk upload.
//!
//! Columns are matched case-insensitively. Rows with a missing SKU, name,
//! category, quantity or price are skipped with a line-numbered issue, as are
//! rows whose values do not fit the catalogue columns. A bad reorder quantity
//! or rating is reported and replaced with zero.

use std::str::FromStr;

use rust_decimal::Decimal;

use shopfront_core::{Price, Sku};

use super::{HeaderIndex, ImportError, oversized_field};
use crate::db::products::{ProductUpsert, UpsertReport};
use crate::models::FlashLevel;

/// Columns every upload must have.
pub const REQUIRED_COLUMNS: [&str; 5] = ["sku", "name", "category", "qty", "price"];

/// Description given to new products uploaded without one.
pub const BLANK_DESCRIPTION: &str = "—";

const MAX_LISTED_ISSUES: usize = 8;

/// Rows ready to write, plus the issues found while reading them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedUpload {
    pub rows: Vec<ProductUpsert>,
    /// `(line, message)` in file order.
    pub issues: Vec<(usize, String)>,
}

fn is_truthy(raw: &str) -> bool {
    matches!(raw.to_lowercase().as_str(), "1" | "true" | "yes" | "y")
}

fn parse_price(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
        .filter(|d| !d.is_sign_negative())
        .map(|d| d.round_dp(2))
}

/// Parse an uploaded file.
///
/// # Errors
///
/// Returns `ImportError::NotUtf8`, `ImportError::MissingHeader` or
/// `ImportError::MissingColumns` when the file as a whole is unusable.
pub fn parse_upload(bytes: &[u8]) -> Result<ParsedUpload, ImportError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let text = std::str::from_utf8(bytes).map_err(|_| ImportError::NotUtf8)?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let index = HeaderIndex::lowercase(reader.headers()?);
    if index.is_empty() {
        return Err(ImportError::MissingHeader);
    }

    let mut missing: Vec<&'static str> = REQUIRED_COLUMNS
        .into_iter()
        .filter(|c| !index.contains(c))
        .collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        return Err(ImportError::MissingColumns(missing));
    }
    let has_hidden = index.contains("hidden");

    let mut parsed = ParsedUpload::default();
    for (i, record) in reader.records().enumerate() {
        let line = i + 2;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                parsed.issues.push((line, format!("Line {line}: unreadable row ({e})")));
                continue;
            }
        };

        let sku = index.get(&record, "sku");
        let name = index.get(&record, "name");
        if sku.is_empty() || name.is_empty() {
            parsed.issues.push((line, format!("Line {line}: missing sku or name")));
            continue;
        }
        let category = index.get(&record, "category");
        if category.is_empty() {
            parsed.issues.push((line, format!("Line {line}: category required")));
            continue;
        }
        let sku = match Sku::parse(sku) {
            Ok(sku) => sku,
            Err(e) => {
                parsed.issues.push((line, format!("Line {line}: bad sku '{sku}' ({e})")));
                continue;
            }
        };

        let qty_raw = index.get(&record, "qty");
        let Some(quantity_on_hand) = qty_raw.parse::<i32>().ok().filter(|q| *q >= 0) else {
            parsed.issues.push((line, format!("Line {line}: bad qty '{qty_raw}'")));
            continue;
        };

        let price_raw = index.get(&record, "price");
        let Some(unit_price) = parse_price(price_raw) else {
            parsed.issues.push((line, format!("Line {line}: bad price '{price_raw}'")));
            continue;
        };

        let reorder_raw = index.first_of(&record, &["reorder_qty", "reorder_quantity"]);
        let reorder_quantity = if reorder_raw.is_empty() {
            0
        } else if let Some(v) = reorder_raw.parse::<i32>().ok().filter(|v| *v >= 0) {
            v
        } else {
            parsed.issues.push((
                line,
                format!("Line {line}: bad reorder_qty '{reorder_raw}' (using 0)"),
            ));
            0
        };

        let rating_raw = index.get(&record, "rating");
        let rating = if rating_raw.is_empty() {
            0.0
        } else if let Some(v) = rating_raw.parse::<f64>().ok().filter(|v| v.is_finite()) {
            v
        } else {
            parsed.issues.push((
                line,
                format!("Line {line}: bad rating '{rating_raw}' (using 0.0)"),
            ));
            0.0
        };

        let row = ProductUpsert {
            line,
            sku,
            name: name.to_string(),
            description: index.get(&record, "description").to_string(),
            category: category.to_string(),
            subcategory: index.get(&record, "subcategory").to_string(),
            quantity_on_hand,
            reorder_quantity,
            unit_price: Price::new(unit_price),
            rating,
            hidden: has_hidden.then(|| is_truthy(index.get(&record, "hidden"))),
        };
        if let Some(reason) = oversized_field(&row) {
            parsed.issues.push((line, format!("Line {line}: {reason}")));
            continue;
        }
        parsed.rows.push(row);
    }

    Ok(parsed)
}

/// Flash messages summarising an upload.
///
/// Parse issues and skipped SKUs are merged in line order.
#[must_use]
pub fn summary_messages(
    report: &UpsertReport,
    parse_issues: &[(usize, String)],
) -> Vec<(FlashLevel, String)> {
    let mut issues: Vec<(usize, String)> = parse_issues.to_vec();
    issues.extend(
        report
            .skipped_existing
            .iter()
            .map(|(line, sku)| (*line, format!("Line {line}: SKU '{sku}' exists (skipped)"))),
    );
    issues.sort_by_key(|(line, _)| *line);

    let mut messages = Vec::new();
    if report.created > 0 {
        messages.push((
            FlashLevel::Success,
            format!("Created {} products.", report.created),
        ));
    }
    if report.updated > 0 {
        messages.push((
            FlashLevel::Success,
            format!("Updated {} products.", report.updated),
        ));
    }
    if !issues.is_empty() {
        let preview: Vec<&str> = issues
            .iter()
            .take(MAX_LISTED_ISSUES)
            .map(|(_, text)| text.as_str())
            .collect();
        let more = if issues.len() > MAX_LISTED_ISSUES { " ..." } else { "" };
        messages.push((
            FlashLevel::Error,
            format!("{} issues: {}{more}", issues.len(), preview.join(" | ")),
        ));
    }
    if messages.is_empty() {
        messages.push((FlashLevel::Warning, "No products imported.".to_string()));
    }
    messages
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ParsedUpload {
        parse_upload(text.as_bytes()).unwrap()
    }

    #[test]
    fn test_rejects_non_utf8() {
        let err = parse_upload(b"sku,name\n\xff\xfe").unwrap_err();
        assert_eq!(err.to_string(), "File must be UTF-8 encoded.");
    }

    #[test]
    fn test_rejects_empty_file() {
        let err = parse_upload(b"").unwrap_err();
        assert_eq!(err.to_string(), "Missing header row.");
    }

    #[test]
    fn test_lists_missing_columns_sorted() {
        let err = parse_upload(b"SKU,Name\nA,B\n").unwrap_err();
        assert_eq!(err.to_string(), "Missing required columns: category, price, qty");
    }

    #[test]
    fn test_bom_and_header_case() {
        let parsed = parse("\u{feff}SKU , Name,CATEGORY,Qty,Price\nA-1,Lamp,Home,3,9.5\n");
        assert!(parsed.issues.is_empty());
        let row = &parsed.rows[0];
        assert_eq!(row.sku.as_str(), "A-1");
        assert_eq!(row.line, 2);
        assert_eq!(row.quantity_on_hand, 3);
        assert_eq!(row.unit_price.amount(), Decimal::new(950, 2));
        assert_eq!(row.reorder_quantity, 0);
        assert_eq!(row.hidden, None);
    }

    #[test]
    fn test_row_issues_with_line_numbers() {
        let parsed = parse(
            "sku,name,category,qty,price,reorder_qty,rating\n\
             ,Nameless,Home,1,1,,\n\
             B,Bee,,1,1,,\n\
             C,Cee,Home,many,1,,\n\
             D,Dee,Home,1,cheap,,\n\
             E,Eee,Home,1,1,lots,good\n",
        );
        let messages: Vec<&str> = parsed.issues.iter().map(|(_, m)| m.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Line 2: missing sku or name",
                "Line 3: category required",
                "Line 4: bad qty 'many'",
                "Line 5: bad price 'cheap'",
                "Line 6: bad reorder_qty 'lots' (using 0)",
                "Line 6: bad rating 'good' (using 0.0)",
            ]
        );
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].sku.as_str(), "E");
        assert!(parsed.rows[0].rating.abs() < f64::EPSILON);
    }

    #[test]
    fn test_reorder_quantity_alias_and_hidden_column() {
        let parsed = parse(
            "sku,name,category,qty,price,reorder_quantity,hidden,subcategory\n\
             A,Ay,Books,1,2,7,Yes,Novels\n\
             B,Bee,Books,1,2,0,no,\n",
        );
        assert_eq!(parsed.rows[0].reorder_quantity, 7);
        assert_eq!(parsed.rows[0].hidden, Some(true));
        assert_eq!(parsed.rows[0].subcategory, "Novels");
        assert_eq!(parsed.rows[1].hidden, Some(false));
    }

    #[test]
    fn test_values_that_do_not_fit_skip_the_row() {
        let long_name = "n".repeat(201);
        let long_category = "c".repeat(51);
        let text = format!(
            "sku,name,category,subcategory,qty,price\n\
             A,{long_name},Books,,1,2\n\
             B,Bee,{long_category},,1,2\n\
             C,Cee,Books,{long_category},1,2\n\
             D,Dee,Books,,1,10000000000\n\
             E,Eee,Books,,1,9999999999.99\n"
        );
        let parsed = parse(&text);
        let messages: Vec<&str> = parsed.issues.iter().map(|(_, m)| m.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Line 2: name longer than 200 characters",
                "Line 3: category longer than 50 characters",
                "Line 4: subcategory longer than 50 characters",
                "Line 5: price '10000000000' too large",
            ]
        );
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].sku.as_str(), "E");
    }

    #[test]
    fn test_name_at_limit_is_kept() {
        let text = format!("sku,name,category,qty,price\nA,{},Books,1,2\n", "n".repeat(200));
        let parsed = parse(&text);
        assert!(parsed.issues.is_empty());
        assert_eq!(parsed.rows.len(), 1);
    }

    #[test]
    fn test_negative_quantity_is_bad_qty() {
        let parsed = parse("sku,name,category,qty,price\nA,Ay,Books,-4,2\n");
        assert_eq!(parsed.issues[0].1, "Line 2: bad qty '-4'");
        assert!(parsed.rows.is_empty());
    }

    #[test]
    fn test_summary_messages() {
        let report = UpsertReport {
            created: 2,
            updated: 0,
            skipped_existing: vec![(3, Sku::parse("OLD-1").unwrap())],
        };
        let issues = vec![(5, "Line 5: bad qty 'x'".to_string())];
        let messages = summary_messages(&report, &issues);
        assert_eq!(messages[0], (FlashLevel::Success, "Created 2 products.".to_string()));
        assert_eq!(
            messages[1],
            (
                FlashLevel::Error,
                "2 issues: Line 3: SKU 'OLD-1' exists (skipped) | Line 5: bad qty 'x'".to_string()
            )
        );
    }

    #[test]
    fn test_summary_caps_listed_issues() {
        let issues: Vec<(usize, String)> =
            (2..12).map(|l| (l, format!("Line {l}: category required"))).collect();
        let messages = summary_messages(&UpsertReport::default(), &issues);
        let (_, text) = &messages[0];
        assert!(text.starts_with("10 issues: Line 2: category required | "));
        assert!(text.ends_with("Line 9: category required ..."));
    }

    #[test]
    fn test_summary_when_nothing_happened() {
        let messages = summary_messages(&UpsertReport::default(), &[]);
        assert_eq!(
            messages,
            vec![(FlashLevel::Warning, "No products imported.".to_string())]
        );
    }
}
