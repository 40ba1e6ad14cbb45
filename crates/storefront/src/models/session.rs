//! Session-related types.
//!
//! Types stored in the session for authentication state, the guest cart and
//! one-shot flash messages.

use serde::{Deserialize, Serialize};

use shopfront_core::{AccountId, CustomerId, Email};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Account (login) ID.
    pub account_id: AccountId,
    /// Customer record the account owns; carts and orders hang off this.
    pub customer_id: CustomerId,
    /// Login email.
    pub email: Email,
    /// Name shown in the header.
    pub display_name: String,
}

/// Severity of a flash message, mapped to a CSS class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

impl FlashLevel {
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "flash-success",
            Self::Info => "flash-info",
            Self::Error => "flash-error",
        }
    }
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub text: String,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the guest cart (`{sku: quantity}`).
    pub const CART: &str = "cart";

    /// Key for pending flash messages.
    pub const FLASH: &str = "flash";
}
