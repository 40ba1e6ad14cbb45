//! Status enums for orders and payments.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    #[cfg_attr(feature = "postgres", sqlx(rename = "order_placed"))]
    #[serde(rename = "order_placed")]
    Placed,
    Shipped,
    Delivered,
}

impl OrderStatus {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Placed => "Order Placed",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// How an order was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    PayNow,
    ApplePay,
}

impl PaymentMethod {
    pub const ALL: [Self; 3] = [Self::Card, Self::PayNow, Self::ApplePay];

    /// Form value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::PayNow => "pay_now",
            Self::ApplePay => "apple_pay",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Card => "Card",
            Self::PayNow => "PayNow",
            Self::ApplePay => "Apple Pay",
        }
    }

    /// Status a freshly recorded payment starts in. `PayNow` transfers are
    /// confirmed out of band.
    #[must_use]
    pub const fn initial_status(self) -> PaymentStatus {
        match self {
            Self::PayNow => PaymentStatus::Pending,
            Self::Card | Self::ApplePay => PaymentStatus::Completed,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "card" => Ok(Self::Card),
            "pay_now" | "paynow" => Ok(Self::PayNow),
            "apple_pay" | "apple pay" => Ok(Self::ApplePay),
            other => Err(format!("invalid payment method: {other}")),
        }
    }
}

/// Payment settlement status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => f.write_str("Pending"),
            Self::Completed => f.write_str("Completed"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_labels() {
        assert_eq!(OrderStatus::default().to_string(), "Order Placed");
        assert_eq!(OrderStatus::Delivered.to_string(), "Delivered");
    }

    #[test]
    fn test_payment_method_parse() {
        for method in PaymentMethod::ALL {
            assert_eq!(method.as_str().parse::<PaymentMethod>().unwrap(), method);
        }
        assert_eq!("PayNow".parse::<PaymentMethod>().unwrap(), PaymentMethod::PayNow);
        assert!("cash".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_payment_initial_status() {
        assert_eq!(PaymentMethod::PayNow.initial_status(), PaymentStatus::Pending);
        assert_eq!(PaymentMethod::Card.initial_status(), PaymentStatus::Completed);
    }
}
