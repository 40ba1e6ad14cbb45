//! Cart route handlers.
//!
//! Guests and signed-in shoppers share these handlers; [`CartService`]
//! picks the session or database cart.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, header::REFERER},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::Sku;

use crate::db::products::ProductRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{OptionalAuth, push_flash, safe_next};
use crate::models::{CartLine, FlashLevel};
use crate::recommender::{DEFAULT_TOP_N, RuleMetric};
use crate::routes::layout::{ProductCard, SiteContext, cart_owner, product_url};
use crate::services::cart::{CartService, parse_quantity_updates};
use crate::state::AppState;

/// Add-to-cart form.
#[derive(Debug, Deserialize)]
pub struct AddForm {
    pub sku: String,
    pub quantity: Option<String>,
    pub next: Option<String>,
}

/// Remove-line form.
#[derive(Debug, Deserialize)]
pub struct RemoveForm {
    pub sku: String,
}

/// Cart line ready for display.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub sku: String,
    pub name: String,
    pub url: String,
    pub unit_price: String,
    pub quantity: i32,
    pub subtotal: String,
    pub available: bool,
    pub stock_note: Option<String>,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        let stock_note = if !line.available {
            Some("No longer available".to_string())
        } else if line.quantity > line.quantity_on_hand {
            Some(format!("Only {} in stock", line.quantity_on_hand.max(0)))
        } else {
            None
        };
        Self {
            sku: line.sku.to_string(),
            name: line.name.clone(),
            url: product_url(line.sku.as_str()),
            unit_price: line.unit_price.to_string(),
            quantity: line.quantity,
            subtotal: line.subtotal().to_string(),
            available: line.available,
            stock_note,
        }
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartTemplate {
    pub site: SiteContext,
    pub lines: Vec<CartLineView>,
    pub total: String,
    pub suggestions: Vec<ProductCard>,
}

/// Where to send the shopper after adding to the cart.
///
/// A safe local `next` wins, then a same-origin `Referer`, then `/products`.
#[must_use]
pub fn after_add_target(next: Option<&str>, referer: Option<&str>, base_url: &str) -> String {
    if let Some(next) = safe_next(next) {
        return next.to_string();
    }

    let same_origin = referer
        .and_then(|r| url::Url::parse(r).ok())
        .zip(url::Url::parse(base_url).ok())
        .filter(|(referer, base)| referer.origin() == base.origin())
        .map(|(referer, _)| match referer.query() {
            Some(query) => format!("{}?{query}", referer.path()),
            None => referer.path().to_string(),
        });

    same_origin.unwrap_or_else(|| "/products".to_string())
}

/// Requested quantity; missing, garbage and values below 1 mean 1.
fn requested_quantity(raw: Option<&str>) -> i32 {
    raw.and_then(|q| q.trim().parse::<i32>().ok())
        .unwrap_or(1)
        .max(1)
}

/// Display the cart.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<CartTemplate> {
    let summary = CartService::new(state.pool(), &session, cart_owner(user.as_ref()))
        .summary()
        .await?;

    let suggested = state
        .recommender()
        .get_recommendations(&summary.skus(), RuleMetric::default(), DEFAULT_TOP_N)
        .await;
    let suggestions = ProductRepository::new(state.pool())
        .get_visible_many(&suggested)
        .await?
        .iter()
        .map(ProductCard::from)
        .collect();

    let site = SiteContext::load(&state, &session, user.as_ref()).await?;

    Ok(CartTemplate {
        site,
        lines: summary.lines.iter().map(CartLineView::from).collect(),
        total: summary.total.to_string(),
        suggestions,
    })
}

/// Add a product to the cart.
#[instrument(skip(state, session, user, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    headers: HeaderMap,
    Form(form): Form<AddForm>,
) -> Result<Response> {
    let sku = Sku::parse(&form.sku).map_err(|_| AppError::NotFound(format!("product {}", form.sku)))?;
    let quantity = requested_quantity(form.quantity.as_deref());

    let product = CartService::new(state.pool(), &session, cart_owner(user.as_ref()))
        .add(&sku, quantity)
        .await?;

    add_breadcrumb("cart", "Added to cart", &[("sku", sku.as_str())]);
    push_flash(
        &session,
        FlashLevel::Success,
        format!("Added {} to cart", product.name),
    )
    .await?;

    let referer = headers.get(REFERER).and_then(|v| v.to_str().ok());
    let target = after_add_target(form.next.as_deref(), referer, &state.config().base_url);
    Ok(Redirect::to(&target).into_response())
}

/// Apply `qty_<sku>` quantity changes.
#[instrument(skip(state, session, user, fields))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Response> {
    let updates = parse_quantity_updates(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    CartService::new(state.pool(), &session, cart_owner(user.as_ref()))
        .update(&updates)
        .await?;

    push_flash(&session, FlashLevel::Success, "Cart updated").await?;
    Ok(Redirect::to("/cart").into_response())
}

/// Remove a line.
#[instrument(skip(state, session, user))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<RemoveForm>,
) -> Result<Response> {
    if let Ok(sku) = Sku::parse(&form.sku) {
        CartService::new(state.pool(), &session, cart_owner(user.as_ref()))
            .remove(&sku)
            .await?;
    }
    Ok(Redirect::to("/cart").into_response())
}

/// Cart badge count as plain text.
#[instrument(skip(state, session, user))]
pub async fn count(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<String> {
    let count = CartService::new(state.pool(), &session, cart_owner(user.as_ref()))
        .count()
        .await?;
    Ok(count.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://shop.example.sg";

    #[test]
    fn test_after_add_prefers_safe_next() {
        assert_eq!(
            after_add_target(Some("/products/BK-1"), Some("https://shop.example.sg/cart"), BASE),
            "/products/BK-1"
        );
    }

    #[test]
    fn test_after_add_uses_same_origin_referer() {
        assert_eq!(
            after_add_target(None, Some("https://shop.example.sg/products?page=2"), BASE),
            "/products?page=2"
        );
        assert_eq!(
            after_add_target(Some("https://evil.example/"), Some("https://evil.example/x"), BASE),
            "/products"
        );
    }

    #[test]
    fn test_after_add_default() {
        assert_eq!(after_add_target(None, None, BASE), "/products");
    }

    #[test]
    fn test_requested_quantity() {
        assert_eq!(requested_quantity(None), 1);
        assert_eq!(requested_quantity(Some("3")), 3);
        assert_eq!(requested_quantity(Some("0")), 1);
        assert_eq!(requested_quantity(Some("-2")), 1);
        assert_eq!(requested_quantity(Some("two")), 1);
    }
}
