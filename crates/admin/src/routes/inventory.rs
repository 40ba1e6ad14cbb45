//! Stock levels: low-stock list, stock edits and CSV export.

use askama::Template;
use axum::{
    Form,
    extract::{Path, RawQuery, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::{Paginator, Sku};

use crate::db::ProductRepository;
use crate::db::products::{ProductFilter, ProductSort};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{CanManageInventory, RequirePermission, push_flash};
use crate::models::{AdminProduct, CurrentStaff, FlashLevel};
use crate::routes::layout::{
    Choice, PageContext, PageLinks, QueryParams, Section, csv_download, render, sku_path,
};
use crate::services::FieldErrors;
use crate::services::catalogue::StockForm;
use crate::services::export::{export_filename, inventory_csv};
use crate::state::AppState;

/// Products per inventory page.
const PER_PAGE: i64 = 50;

type InventoryStaff = RequirePermission<CanManageInventory>;

/// Stock row on the inventory list.
#[derive(Debug, Clone)]
pub struct StockRowView {
    pub sku: String,
    pub name: String,
    pub quantity_on_hand: i32,
    pub reorder_quantity: i32,
    pub status: &'static str,
    pub low: bool,
    pub edit_url: String,
}

impl From<&AdminProduct> for StockRowView {
    fn from(p: &AdminProduct) -> Self {
        Self {
            sku: p.sku.to_string(),
            name: p.name.clone(),
            quantity_on_hand: p.quantity_on_hand,
            reorder_quantity: p.reorder_quantity,
            status: p.stock_status(),
            low: p.is_low(),
            edit_url: sku_path("/inventory", p.sku.as_str(), ""),
        }
    }
}

#[derive(Template)]
#[template(path = "inventory/list.html")]
pub struct InventoryListTemplate {
    pub page: PageContext,
    pub rows: Vec<StockRowView>,
    pub q: String,
    pub show_low: bool,
    pub sorts: Vec<Choice>,
    pub pages: PageLinks,
    pub export_url: String,
}

#[derive(Template)]
#[template(path = "inventory/edit.html")]
pub struct StockEditTemplate {
    pub page: PageContext,
    pub product: AdminProduct,
    pub action: String,
    pub form: StockForm,
    pub errors: FieldErrors,
}

/// Filters shared by the list and the export.
#[must_use]
pub fn stock_filter(params: &QueryParams) -> ProductFilter {
    ProductFilter {
        search: params.first("q").map(str::to_string),
        low_stock_only: params.first("low") == Some("1"),
        ..ProductFilter::default()
    }
}

async fn load_product(state: &AppState, raw: &str) -> Result<AdminProduct> {
    let not_found = || AppError::NotFound(format!("product {raw}"));
    let sku = Sku::parse(raw).map_err(|_| not_found())?;
    ProductRepository::new(state.pool())
        .get(&sku)
        .await?
        .ok_or_else(not_found)
}

/// GET /inventory
#[instrument(skip(state, session, staff, raw))]
pub async fn index(
    RequirePermission(staff, _): InventoryStaff,
    State(state): State<AppState>,
    session: Session,
    RawQuery(raw): RawQuery,
) -> Result<Response> {
    let params = QueryParams::parse(raw.as_deref());
    let filter = stock_filter(&params);
    let sort = ProductSort::parse(params.first("sort"));

    let products = ProductRepository::new(state.pool());
    let total = products.count(&filter).await?;
    let paginator = Paginator::new(params.first("page"), PER_PAGE, total);
    let rows = products
        .list(&filter, sort, paginator.limit(), paginator.offset())
        .await?;

    let query = params.without_page();
    let export_url = if query.is_empty() {
        "/inventory/export".to_string()
    } else {
        format!("/inventory/export?{query}")
    };

    render(&InventoryListTemplate {
        page: PageContext::load(&session, &staff, Section::Inventory).await,
        rows: rows.iter().map(StockRowView::from).collect(),
        q: filter.search.clone().unwrap_or_default(),
        show_low: filter.low_stock_only,
        sorts: ProductSort::ALL
            .into_iter()
            .map(|s| Choice::new(s.as_str(), s.label(), s == sort))
            .collect(),
        pages: PageLinks::new("/inventory", &query, &paginator),
        export_url,
    })
}

async fn edit_page_with(
    session: &Session,
    staff: &CurrentStaff,
    product: AdminProduct,
    form: StockForm,
    errors: FieldErrors,
) -> Result<Response> {
    render(&StockEditTemplate {
        page: PageContext::load(session, staff, Section::Inventory).await,
        action: sku_path("/inventory", product.sku.as_str(), ""),
        product,
        form,
        errors,
    })
}

/// GET /inventory/{sku}
pub async fn edit_page(
    RequirePermission(staff, _): InventoryStaff,
    State(state): State<AppState>,
    session: Session,
    Path(sku): Path<String>,
) -> Result<Response> {
    let product = load_product(&state, &sku).await?;
    let form = StockForm {
        quantity_on_hand: product.quantity_on_hand.to_string(),
        reorder_quantity: product.reorder_quantity.to_string(),
    };
    edit_page_with(&session, &staff, product, form, FieldErrors::new()).await
}

/// Set stock on hand and the reorder level.
///
/// POST /inventory/{sku}
#[instrument(skip(state, session, staff, form))]
pub async fn update(
    RequirePermission(staff, _): InventoryStaff,
    State(state): State<AppState>,
    session: Session,
    Path(sku): Path<String>,
    Form(form): Form<StockForm>,
) -> Result<Response> {
    let product = load_product(&state, &sku).await?;
    let (quantity, reorder) = match form.validate() {
        Ok(levels) => levels,
        Err(errors) => return edit_page_with(&session, &staff, product, form, errors).await,
    };

    ProductRepository::new(state.pool())
        .update_stock(&product.sku, quantity, reorder)
        .await?;
    tracing::info!(
        sku = %product.sku,
        from = product.quantity_on_hand,
        to = quantity,
        reorder,
        "Stock updated"
    );
    push_flash(
        &session,
        FlashLevel::Success,
        format!("Stock updated for {}", product.sku),
    )
    .await?;
    Ok(Redirect::to("/inventory").into_response())
}

/// GET /inventory/export
#[instrument(skip_all)]
pub async fn export(
    _staff: InventoryStaff,
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Response> {
    let params = QueryParams::parse(raw.as_deref());
    let products = ProductRepository::new(state.pool())
        .list_all(&stock_filter(&params), ProductSort::SkuAsc)
        .await?;

    let body = inventory_csv(&products).map_err(|e| AppError::Internal(e.to_string()))?;
    tracing::info!(count = products.len(), "Inventory exported");
    Ok(csv_download(
        &export_filename("inventory", Utc::now().naive_utc()),
        body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_flag_must_be_one() {
        assert!(stock_filter(&QueryParams::parse(Some("low=1"))).low_stock_only);
        assert!(!stock_filter(&QueryParams::parse(Some("low=yes"))).low_stock_only);
        assert!(!stock_filter(&QueryParams::default()).low_stock_only);
    }

    #[test]
    fn test_search_only_filter() {
        let filter = stock_filter(&QueryParams::parse(Some("q=cable&category=3")));
        assert_eq!(filter.search.as_deref(), Some("cable"));
        assert!(filter.category_ids.is_empty());
        assert_eq!(filter.hidden, None);
    }
}
