//! Checkout form validation and order placement.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;

use shopfront_core::{CustomerId, OrderId, PaymentMethod};

use crate::db::RepositoryError;
use crate::db::carts::CartRepository;
use crate::db::orders::{NewOrder, OrderRepository};
use crate::models::CartLine;

/// Maximum length of the shipping address.
pub const MAX_ADDRESS_LENGTH: usize = 255;

/// Field name to message.
pub type FieldErrors = BTreeMap<&'static str, String>;

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty.")]
    EmptyCart,

    /// Form fields failed validation.
    #[error("invalid checkout form")]
    Invalid(FieldErrors),

    /// Cart lines that cannot be bought right now.
    #[error("cart has unavailable items")]
    Unavailable(Vec<String>),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Raw checkout form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub payment_method: String,
}

impl CheckoutForm {
    /// Validate every field, collecting one message per bad field.
    ///
    /// # Errors
    ///
    /// Returns the field errors when any field is invalid.
    pub fn validate(&self) -> Result<NewOrder, FieldErrors> {
        let mut errors = FieldErrors::new();

        let address = self.address.trim();
        if address.is_empty() {
            errors.insert("address", "Address is required.".to_string());
        } else if address.chars().count() > MAX_ADDRESS_LENGTH {
            errors.insert(
                "address",
                format!("Address must be at most {MAX_ADDRESS_LENGTH} characters."),
            );
        }

        let postal_code = self.postal_code.trim();
        if !is_digits(postal_code, 6) {
            errors.insert("postal_code", "Postal code must be 6 digits.".to_string());
        }

        let phone = self.phone.trim();
        if !is_digits(phone, 8) {
            errors.insert("phone", "Phone number must be 8 digits.".to_string());
        }

        let payment_method = PaymentMethod::from_str(self.payment_method.trim()).ok();
        if payment_method.is_none() {
            errors.insert(
                "payment_method",
                "Choose a payment method.".to_string(),
            );
        }

        match payment_method {
            Some(payment_method) if errors.is_empty() => Ok(NewOrder {
                shipping_address: address.to_string(),
                postal_code: postal_code.to_string(),
                phone: phone.to_string(),
                payment_method,
            }),
            _ => Err(errors),
        }
    }
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

/// Messages for cart lines that cannot be ordered as they stand.
#[must_use]
pub fn line_problems(lines: &[CartLine]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| {
            if !line.available {
                Some(format!("{} is no longer available.", line.name))
            } else if line.quantity > line.quantity_on_hand {
                Some(format!(
                    "Only {} of {} left in stock.",
                    line.quantity_on_hand.max(0),
                    line.name
                ))
            } else {
                None
            }
        })
        .collect()
}

/// Checkout service.
pub struct CheckoutService<'a> {
    carts: CartRepository<'a>,
    orders: OrderRepository<'a>,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            carts: CartRepository::new(pool),
            orders: OrderRepository::new(pool),
        }
    }

    /// Validate and place an order from the customer's cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart`, `Invalid` or `Unavailable` when the
    /// order is rejected; nothing is written in those cases.
    pub async fn place(
        &self,
        customer_id: CustomerId,
        form: &CheckoutForm,
    ) -> Result<OrderId, CheckoutError> {
        let lines = self.carts.lines(customer_id).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let order = form.validate().map_err(CheckoutError::Invalid)?;

        let problems = line_problems(&lines);
        if !problems.is_empty() {
            return Err(CheckoutError::Unavailable(problems));
        }

        self.orders
            .place_order(customer_id, &order)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(message) if message == "cart is empty" => {
                    CheckoutError::EmptyCart
                }
                RepositoryError::Conflict(message) => CheckoutError::Unavailable(vec![message]),
                other => CheckoutError::Repository(other),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use shopfront_core::{Price, Sku};

    use super::*;

    fn form() -> CheckoutForm {
        CheckoutForm {
            address: "1 Orchard Road".to_string(),
            postal_code: "238823".to_string(),
            phone: "91234567".to_string(),
            payment_method: "paynow".to_string(),
        }
    }

    #[test]
    fn test_valid_form() {
        let order = form().validate().unwrap();
        assert_eq!(order.payment_method, PaymentMethod::PayNow);
        assert_eq!(order.postal_code, "238823");
    }

    #[test]
    fn test_each_field_reported() {
        let bad = CheckoutForm {
            address: "   ".to_string(),
            postal_code: "12345".to_string(),
            phone: "9123-4567".to_string(),
            payment_method: "cash".to_string(),
        };
        let errors = bad.validate().unwrap_err();
        assert_eq!(
            errors.keys().copied().collect::<Vec<_>>(),
            vec!["address", "payment_method", "phone", "postal_code"]
        );
    }

    #[test]
    fn test_address_length_limit() {
        let mut long = form();
        long.address = "a".repeat(MAX_ADDRESS_LENGTH + 1);
        assert!(long.validate().unwrap_err().contains_key("address"));
        long.address = "a".repeat(MAX_ADDRESS_LENGTH);
        assert!(long.validate().is_ok());
    }

    #[test]
    fn test_line_problems() {
        let line = |name: &str, qty, stock, available| CartLine {
            sku: Sku::parse(name).unwrap(),
            name: name.to_string(),
            unit_price: Price::new(Decimal::ONE),
            quantity: qty,
            quantity_on_hand: stock,
            available,
        };
        let problems = line_problems(&[
            line("ok", 1, 5, true),
            line("short", 4, 2, true),
            line("hidden", 1, 5, false),
        ]);
        assert_eq!(
            problems,
            vec![
                "Only 2 of short left in stock.".to_string(),
                "hidden is no longer available.".to_string(),
            ]
        );
    }
}
