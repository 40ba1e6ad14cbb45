//! Integration tests for Shopfront.
//!
//! # Running Tests
//!
//! ```bash
//! # Library-level tests across crates
//! cargo test -p shopfront-integration-tests
//!
//! # HTTP tests against running servers (database migrated, servers up)
//! cargo test -p shopfront-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `catalogue_import` - CSV parsing for uploads and CLI imports
//! - `recommender` - training, artefact format and recommendations
//! - `cart_checkout` - guest carts, checkout checks and pagination
//! - `staff_roles` - role permissions and staff form validation
//! - `storefront_http`, `admin_http` - live servers (ignored by default)

use reqwest::Client;
use shopfront_core::Sku;

/// Base URL for the storefront (configurable via environment).
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Base URL for the admin panel (configurable via environment).
#[must_use]
pub fn admin_base_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// Client that keeps session cookies and does not follow redirects.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
#[allow(clippy::expect_used)]
pub fn session_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// Parse a SKU known to be valid.
///
/// # Panics
///
/// Panics if `s` is not a valid SKU.
#[must_use]
pub fn sku(s: &str) -> Sku {
    Sku::parse(s).unwrap_or_else(|e| panic!("bad test SKU {s}: {e}"))
}

/// Sign in to the admin panel as the bootstrap Admin
/// (`SHOPFRONT_SUPERUSER_USERNAME` / `SHOPFRONT_SUPERUSER_PASSWORD`).
///
/// # Panics
///
/// Panics if the password is unset or the login is refused.
pub async fn admin_session() -> Client {
    let username =
        std::env::var("SHOPFRONT_SUPERUSER_USERNAME").unwrap_or_else(|_| "admin".to_string());
    let password = std::env::var("SHOPFRONT_SUPERUSER_PASSWORD")
        .unwrap_or_else(|_| panic!("SHOPFRONT_SUPERUSER_PASSWORD must be set"));

    let client = session_client();
    let resp = client
        .post(format!("{}/auth/login", admin_base_url()))
        .form(&[("username", username.as_str()), ("password", password.as_str())])
        .send()
        .await
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(resp.status(), reqwest::StatusCode::SEE_OTHER, "admin login failed");
    client
}

/// A fresh shopper email, so repeated runs never collide.
#[must_use]
pub fn unique_email() -> String {
    format!("shopper-{:016x}@example.com", rand::random::<u64>())
}

/// The `value` attribute of the first `<input>` named `name`.
#[must_use]
pub fn input_value(html: &str, name: &str) -> Option<String> {
    let start = html.find(&format!("name=\"{name}\""))?;
    let rest = html.get(start..)?;
    let tag = rest.get(..rest.find('>')?)?;
    let value = tag.get(tag.find("value=\"")? + "value=\"".len()..)?;
    Some(value.get(..value.find('"')?)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_value() {
        let html = r#"<input type="number" name="qty_BK-1" value="5" min="0">
            <input name="quantity_on_hand" type="number" min="0" value="7" required>"#;
        assert_eq!(input_value(html, "qty_BK-1").as_deref(), Some("5"));
        assert_eq!(input_value(html, "quantity_on_hand").as_deref(), Some("7"));
        assert_eq!(input_value(html, "missing"), None);
    }

    #[test]
    fn test_unique_email_is_valid() {
        assert!(shopfront_core::Email::parse(&unique_email()).is_ok());
    }
}
