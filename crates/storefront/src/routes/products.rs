//! Product listing and detail route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::{Paginator, Sku};

use crate::db::products::{ProductFilter, ProductRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::category::find_by_slug;
use crate::recommender::{DEFAULT_TOP_N, RuleMetric};
use crate::routes::layout::{ProductCard, SiteContext};
use crate::state::AppState;

/// Products per listing page.
const PER_PAGE: i64 = 24;

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub page: Option<String>,
}

/// Selected category on the listing page.
#[derive(Debug, Clone)]
pub struct SelectedCategory {
    pub name: String,
    pub slug: String,
}

/// Pagination controls.
#[derive(Debug, Clone)]
pub struct PageLinks {
    pub page: i64,
    pub num_pages: i64,
    pub total: i64,
    pub previous_url: Option<String>,
    pub next_url: Option<String>,
}

/// Product listing template.
#[derive(Template, WebTemplate)]
#[template(path = "products/list.html")]
pub struct ProductListTemplate {
    pub site: SiteContext,
    pub products: Vec<ProductCard>,
    pub q: String,
    pub category: Option<SelectedCategory>,
    pub pages: PageLinks,
}

/// Product detail view.
#[derive(Debug, Clone)]
pub struct ProductDetailView {
    pub sku: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub category_url: String,
    pub subcategory: String,
    pub price: String,
    pub rating: String,
    pub in_stock: bool,
    pub stock_label: String,
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "products/detail.html")]
pub struct ProductDetailTemplate {
    pub site: SiteContext,
    pub product: ProductDetailView,
    pub also_bought: Vec<ProductCard>,
}

/// Build a listing URL keeping the search and category.
fn listing_url(q: &str, category: Option<&str>, page: i64) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    if !q.is_empty() {
        query.append_pair("q", q);
    }
    if let Some(slug) = category {
        query.append_pair("category", slug);
    }
    query.append_pair("page", &page.to_string());
    format!("/products?{}", query.finish())
}

/// Product listing with search, category filter and pagination.
#[instrument(skip(state, session, user))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<ListQuery>,
) -> Result<ProductListTemplate> {
    let categories = state.categories().await?;

    let category = match query.category.as_deref().map(str::trim) {
        Some(slug) if !slug.is_empty() => Some(
            find_by_slug(&categories, slug)
                .ok_or_else(|| AppError::NotFound(format!("category {slug}")))?,
        ),
        _ => None,
    };

    let q = query.q.as_deref().map(str::trim).unwrap_or_default().to_string();
    let filter = ProductFilter {
        search: Some(q.clone()).filter(|s| !s.is_empty()),
        category_id: category.map(|c| c.id),
    };

    let products = ProductRepository::new(state.pool());
    let total = products.count(&filter).await?;
    let paginator = Paginator::new(query.page.as_deref(), PER_PAGE, total);
    let rows = products
        .list(&filter, paginator.limit(), paginator.offset())
        .await?;

    let slug = category.map(|c| c.slug.as_str());
    let pages = PageLinks {
        page: paginator.page(),
        num_pages: paginator.num_pages(),
        total: paginator.total(),
        previous_url: paginator
            .has_previous()
            .then(|| listing_url(&q, slug, paginator.page() - 1)),
        next_url: paginator
            .has_next()
            .then(|| listing_url(&q, slug, paginator.page() + 1)),
    };

    let site = SiteContext::load(&state, &session, user.as_ref()).await?;

    Ok(ProductListTemplate {
        site,
        products: rows.iter().map(ProductCard::from).collect(),
        q,
        category: category.map(|c| SelectedCategory {
            name: c.name.clone(),
            slug: c.slug.clone(),
        }),
        pages,
    })
}

/// Product detail with "customers also bought".
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(sku): Path<String>,
) -> Result<ProductDetailTemplate> {
    let sku = Sku::parse(&sku).map_err(|_| AppError::NotFound(format!("product {sku}")))?;
    let products = ProductRepository::new(state.pool());
    let product = products
        .get_visible(&sku)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {sku}")))?;

    let suggestions = state
        .recommender()
        .get_recommendations(
            std::slice::from_ref(&sku),
            RuleMetric::default(),
            DEFAULT_TOP_N,
        )
        .await;
    let also_bought = products
        .get_visible_many(&suggestions)
        .await?
        .iter()
        .map(ProductCard::from)
        .collect();

    let stock_label = match product.quantity_on_hand {
        n if n <= 0 => "Out of stock".to_string(),
        n if n <= 5 => format!("Only {n} left"),
        _ => "In stock".to_string(),
    };

    let site = SiteContext::load(&state, &session, user.as_ref()).await?;

    Ok(ProductDetailTemplate {
        site,
        product: ProductDetailView {
            sku: product.sku.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            category_url: format!(
                "/products?category={}",
                shopfront_core::category_slug(&product.category_name)
            ),
            category: product.category_name.clone(),
            subcategory: product.subcategory_name.clone(),
            price: product.unit_price.to_string(),
            rating: format!("{:.1}", product.rating),
            in_stock: product.in_stock(),
            stock_label,
        },
        also_bought,
    })
}
