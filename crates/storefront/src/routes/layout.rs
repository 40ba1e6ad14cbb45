//! Shared page context and view types.
//!
//! Every page renders the category menu, the cart badge, the signed-in name
//! and pending flash messages. Handlers build a [`SiteContext`] once and
//! pass it to their template.

use tower_sessions::Session;

use crate::error::AppError;
use crate::middleware::take_flash;
use crate::models::{CurrentUser, Product};
use crate::services::cart::{CartOwner, CartService};
use crate::state::AppState;

/// Category menu entry.
#[derive(Debug, Clone)]
pub struct CategoryLink {
    pub name: String,
    pub url: String,
}

/// Flash message ready for the template.
#[derive(Debug, Clone)]
pub struct FlashView {
    pub css_class: &'static str,
    pub text: String,
}

/// Context shared by every storefront page.
#[derive(Debug, Clone, Default)]
pub struct SiteContext {
    pub categories: Vec<CategoryLink>,
    pub cart_count: i64,
    pub user_name: Option<String>,
    pub flash: Vec<FlashView>,
}

impl SiteContext {
    /// Gather the shared context, consuming pending flash messages.
    ///
    /// # Errors
    ///
    /// Returns `AppError` if categories or the cart cannot be read.
    pub async fn load(
        state: &AppState,
        session: &Session,
        user: Option<&CurrentUser>,
    ) -> Result<Self, AppError> {
        let categories = state
            .categories()
            .await?
            .iter()
            .map(|c| CategoryLink {
                name: c.name.clone(),
                url: format!("/products?category={}", c.slug),
            })
            .collect();

        let cart_count = CartService::new(state.pool(), session, cart_owner(user))
            .count()
            .await?;

        let flash = take_flash(session)
            .await
            .into_iter()
            .map(|m| FlashView {
                css_class: m.level.css_class(),
                text: m.text,
            })
            .collect();

        Ok(Self {
            categories,
            cart_count,
            user_name: user.map(|u| u.display_name.clone()),
            flash,
        })
    }
}

/// Cart owner for the current visitor.
#[must_use]
pub fn cart_owner(user: Option<&CurrentUser>) -> CartOwner {
    user.map_or(CartOwner::Guest, |u| CartOwner::Customer(u.customer_id))
}

/// Product tile for grids.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub price: String,
    pub rating: String,
    pub in_stock: bool,
    pub url: String,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        Self {
            sku: product.sku.to_string(),
            name: product.name.clone(),
            category: product.category_name.clone(),
            price: product.unit_price.to_string(),
            rating: format!("{:.1}", product.rating),
            in_stock: product.in_stock(),
            url: product_url(product.sku.as_str()),
        }
    }
}

/// Detail page URL for a SKU.
#[must_use]
pub fn product_url(sku: &str) -> String {
    format!("/products/{}", urlencoding::encode(sku))
}
