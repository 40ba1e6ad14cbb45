//! Catalogue and stock forms.

use rust_decimal::Decimal;
use serde::Deserialize;

use shopfront_core::{CategoryId, Price, Sku, SubCategoryId};

use super::FieldErrors;
use crate::models::AdminProduct;
use crate::models::catalogue::ProductInput;

pub const MAX_PRODUCT_NAME_LENGTH: usize = 200;
/// Also the limit for subcategory names.
pub const MAX_CATEGORY_NAME_LENGTH: usize = 50;
/// Exclusive ceiling of a `NUMERIC(12, 2)` price.
// 10_000_000_000 (scale 0); `Decimal::new` is not const.
pub const PRICE_CEILING: Decimal = Decimal::from_parts(0x540B_E400, 2, 0, false, 0);
const MAX_RATING: f64 = 5.0;
const REQUIRED: &str = "This field is required.";
const NOT_NEGATIVE: &str = "Ensure this value is greater than or equal to 0.";

/// Raw product form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductForm {
    pub sku: String,
    pub name: String,
    pub description: String,
    pub subcategory: String,
    pub quantity_on_hand: String,
    pub reorder_quantity: String,
    pub unit_price: String,
    pub rating: String,
}

impl From<&AdminProduct> for ProductForm {
    fn from(product: &AdminProduct) -> Self {
        Self {
            sku: product.sku.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            subcategory: product.subcategory_id.to_string(),
            quantity_on_hand: product.quantity_on_hand.to_string(),
            reorder_quantity: product.reorder_quantity.to_string(),
            unit_price: product.unit_price.amount().to_string(),
            rating: product.rating.to_string(),
        }
    }
}

/// Parse a non-negative whole number, recording a message under `field`.
fn non_negative_int(raw: &str, field: &'static str, errors: &mut FieldErrors) -> Option<i32> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.insert(field, REQUIRED.to_string());
        return None;
    }
    match raw.parse::<i32>() {
        Ok(v) if v >= 0 => Some(v),
        Ok(_) => {
            errors.insert(field, NOT_NEGATIVE.to_string());
            None
        }
        Err(_) => {
            errors.insert(field, "Enter a whole number.".to_string());
            None
        }
    }
}

impl ProductForm {
    /// Validate a new product, including its SKU.
    ///
    /// # Errors
    ///
    /// Returns the field messages when any field is invalid.
    pub fn validate_new(&self) -> Result<(Sku, ProductInput), FieldErrors> {
        let mut errors = FieldErrors::new();
        let sku = match Sku::parse(&self.sku) {
            Ok(sku) => Some(sku),
            Err(e) => {
                errors.insert("sku", e.to_string());
                None
            }
        };
        let input = self.validate_fields(&mut errors);
        match (sku, input) {
            (Some(sku), Some(input)) if errors.is_empty() => Ok((sku, input)),
            _ => Err(errors),
        }
    }

    /// Validate an edit; the SKU field is ignored.
    ///
    /// # Errors
    ///
    /// Returns the field messages when any field is invalid.
    pub fn validate_edit(&self) -> Result<ProductInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        match self.validate_fields(&mut errors) {
            Some(input) if errors.is_empty() => Ok(input),
            _ => Err(errors),
        }
    }

    fn validate_fields(&self, errors: &mut FieldErrors) -> Option<ProductInput> {
        let name = self.name.trim();
        if name.is_empty() {
            errors.insert("name", REQUIRED.to_string());
        } else if name.chars().count() > MAX_PRODUCT_NAME_LENGTH {
            errors.insert(
                "name",
                format!("Ensure this value has at most {MAX_PRODUCT_NAME_LENGTH} characters."),
            );
        }

        let subcategory_id = self.subcategory.trim().parse::<SubCategoryId>().ok();
        if subcategory_id.is_none() {
            errors.insert("subcategory", "Select a valid choice.".to_string());
        }

        let quantity_on_hand = non_negative_int(&self.quantity_on_hand, "quantity_on_hand", errors);
        let reorder_quantity = non_negative_int(&self.reorder_quantity, "reorder_quantity", errors);

        let unit_price = match self.unit_price.trim().parse::<Decimal>() {
            Ok(d) if d.is_sign_negative() => {
                errors.insert("unit_price", NOT_NEGATIVE.to_string());
                None
            }
            Ok(d) if d.round_dp(2) >= PRICE_CEILING => {
                errors.insert(
                    "unit_price",
                    "Ensure that there are no more than 10 digits before the decimal point."
                        .to_string(),
                );
                None
            }
            Ok(d) => Some(Price::new(d.round_dp(2))),
            Err(_) => {
                errors.insert("unit_price", "Enter a number.".to_string());
                None
            }
        };

        let rating = match self.rating.trim() {
            "" => Some(0.0),
            raw => match raw.parse::<f64>() {
                Ok(r) if (0.0..=MAX_RATING).contains(&r) => Some(r),
                _ => {
                    errors.insert("rating", "Enter a rating between 0 and 5.".to_string());
                    None
                }
            },
        };

        Some(ProductInput {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            subcategory_id: subcategory_id?,
            quantity_on_hand: quantity_on_hand?,
            reorder_quantity: reorder_quantity?,
            unit_price: unit_price?,
            rating: rating?,
        })
    }
}

/// Raw stock form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StockForm {
    pub quantity_on_hand: String,
    pub reorder_quantity: String,
}

impl StockForm {
    /// Validate both quantities.
    ///
    /// # Errors
    ///
    /// Returns the field messages when either quantity is invalid.
    pub fn validate(&self) -> Result<(i32, i32), FieldErrors> {
        let mut errors = FieldErrors::new();
        let qty = non_negative_int(&self.quantity_on_hand, "quantity_on_hand", &mut errors);
        let reorder = non_negative_int(&self.reorder_quantity, "reorder_quantity", &mut errors);
        match (qty, reorder) {
            (Some(qty), Some(reorder)) => Ok((qty, reorder)),
            _ => Err(errors),
        }
    }
}

/// Raw category name form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    pub name: String,
}

/// Validate a category or subcategory name.
///
/// # Errors
///
/// Returns the message to show under the name field.
pub fn validate_category_name(raw: &str) -> Result<String, String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(REQUIRED.to_string());
    }
    if name.chars().count() > MAX_CATEGORY_NAME_LENGTH {
        return Err(format!(
            "Ensure this value has at most {MAX_CATEGORY_NAME_LENGTH} characters."
        ));
    }
    Ok(name.to_string())
}

/// Raw subcategory form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubcategoryForm {
    pub name: String,
    pub category: String,
}

impl SubcategoryForm {
    /// Validate the name and parent category.
    ///
    /// # Errors
    ///
    /// Returns the field messages when either field is invalid.
    pub fn validate(&self) -> Result<(String, CategoryId), FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = validate_category_name(&self.name)
            .map_err(|e| errors.insert("name", e))
            .ok();
        let category = self.category.trim().parse::<CategoryId>().ok();
        if category.is_none() {
            errors.insert("category", "Select a valid choice.".to_string());
        }
        match (name, category) {
            (Some(name), Some(category)) => Ok((name, category)),
            _ => Err(errors),
        }
    }
}

/// Raw category merge form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MergeForm {
    pub source: String,
    pub target: String,
}

impl MergeForm {
    /// Parse both category ids.
    ///
    /// # Errors
    ///
    /// Returns a message when either id is missing or malformed.
    pub fn validate(&self) -> Result<(CategoryId, CategoryId), String> {
        let source = self.source.trim().parse::<CategoryId>();
        let target = self.target.trim().parse::<CategoryId>();
        match (source, target) {
            (Ok(source), Ok(target)) => Ok((source, target)),
            _ => Err("Choose both a source and a target category.".to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> ProductForm {
        ProductForm {
            sku: " LAMP-01 ".to_string(),
            name: "Desk Lamp".to_string(),
            description: "Warm white".to_string(),
            subcategory: "4".to_string(),
            quantity_on_hand: "12".to_string(),
            reorder_quantity: "5".to_string(),
            unit_price: "19.999".to_string(),
            rating: "4.5".to_string(),
        }
    }

    #[test]
    fn test_valid_new_product() {
        let (sku, input) = form().validate_new().unwrap();
        assert_eq!(sku.as_str(), "LAMP-01");
        assert_eq!(input.subcategory_id, SubCategoryId::new(4));
        assert_eq!(input.unit_price.amount(), Decimal::new(2000, 2));
        assert!((input.rating - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_field_errors_collected() {
        let mut bad = form();
        bad.sku = "   ".to_string();
        bad.name = "x".repeat(201);
        bad.quantity_on_hand = "-1".to_string();
        bad.unit_price = "free".to_string();
        bad.rating = "5.5".to_string();
        let errors = bad.validate_new().unwrap_err();
        for field in ["sku", "name", "quantity_on_hand", "unit_price", "rating"] {
            assert!(errors.contains_key(field), "missing error for {field}");
        }
        assert_eq!(errors["quantity_on_hand"], NOT_NEGATIVE);
    }

    #[test]
    fn test_price_must_fit_ten_digits() {
        let mut pricey = form();
        pricey.unit_price = "9999999999.99".to_string();
        assert!(pricey.validate_new().is_ok());
        pricey.unit_price = "9999999999.995".to_string();
        let errors = pricey.validate_new().unwrap_err();
        assert!(errors.contains_key("unit_price"));
    }

    #[test]
    fn test_edit_ignores_sku() {
        let mut edit = form();
        edit.sku = String::new();
        assert!(edit.validate_edit().is_ok());
    }

    #[test]
    fn test_stock_form() {
        let ok = StockForm {
            quantity_on_hand: "0".to_string(),
            reorder_quantity: "10".to_string(),
        };
        assert_eq!(ok.validate().unwrap(), (0, 10));

        let bad = StockForm {
            quantity_on_hand: "2.5".to_string(),
            reorder_quantity: String::new(),
        };
        let errors = bad.validate().unwrap_err();
        assert_eq!(errors["quantity_on_hand"], "Enter a whole number.");
        assert_eq!(errors["reorder_quantity"], REQUIRED);
    }

    #[test]
    fn test_category_name_limits() {
        assert_eq!(validate_category_name("  Books "), Ok("Books".to_string()));
        assert!(validate_category_name(" ").is_err());
        assert!(validate_category_name(&"c".repeat(51)).is_err());
    }

    #[test]
    fn test_merge_form_needs_both_ids() {
        let form = MergeForm {
            source: "3".to_string(),
            target: String::new(),
        };
        assert!(form.validate().is_err());
    }
}
