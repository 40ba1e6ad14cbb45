//! Catalogue management: product list, export, bulk upload and product CRUD.

use askama::Template;
use axum::{
    Form,
    extract::{Multipart, Path, RawQuery, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::{Paginator, Sku};

use crate::db::products::{ProductFilter, ProductSort, UpsertOptions};
use crate::db::{CategoryRepository, ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{CanManageCatalogue, RequirePermission, push_flash};
use crate::models::{AdminProduct, CurrentStaff, FlashLevel};
use crate::routes::layout::{
    Choice, PageContext, PageLinks, QueryParams, Section, csv_download, render, sku_path,
};
use crate::services::FieldErrors;
use crate::services::catalogue::ProductForm;
use crate::services::export::{export_filename, products_csv};
use crate::services::import::upload::{BLANK_DESCRIPTION, parse_upload, summary_messages};
use crate::state::AppState;

/// Products per catalogue page.
const PER_PAGE: i64 = 25;

type CatalogueStaff = RequirePermission<CanManageCatalogue>;

/// Product row on the catalogue list.
#[derive(Debug, Clone)]
pub struct ProductRowView {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub subcategory: String,
    pub quantity_on_hand: i32,
    pub reorder_quantity: i32,
    pub price: String,
    pub rating: String,
    pub hidden: bool,
    pub edit_url: String,
    pub toggle_url: String,
    pub delete_url: String,
}

impl From<&AdminProduct> for ProductRowView {
    fn from(p: &AdminProduct) -> Self {
        let base = "/catalogue/products";
        Self {
            sku: p.sku.to_string(),
            name: p.name.clone(),
            category: p.category_name.clone(),
            subcategory: p.subcategory_name.clone(),
            quantity_on_hand: p.quantity_on_hand,
            reorder_quantity: p.reorder_quantity,
            price: p.unit_price.to_string(),
            rating: format!("{:.1}", p.rating),
            hidden: p.hidden,
            edit_url: sku_path(base, p.sku.as_str(), "/edit"),
            toggle_url: sku_path(base, p.sku.as_str(), "/toggle-hidden"),
            delete_url: sku_path(base, p.sku.as_str(), "/delete"),
        }
    }
}

/// Catalogue list template.
#[derive(Template)]
#[template(path = "catalogue/list.html")]
pub struct CatalogueListTemplate {
    pub page: PageContext,
    pub products: Vec<ProductRowView>,
    pub q: String,
    pub categories: Vec<Choice>,
    pub subcategories: Vec<Choice>,
    pub visibility: Vec<Choice>,
    pub sorts: Vec<Choice>,
    pub pages: PageLinks,
    pub export_url: String,
}

/// Bulk upload template.
#[derive(Template)]
#[template(path = "catalogue/upload.html")]
pub struct UploadTemplate {
    pub page: PageContext,
    pub limit_kib: usize,
}

/// Product create/edit template.
#[derive(Template)]
#[template(path = "catalogue/product_form.html")]
pub struct ProductFormTemplate {
    pub page: PageContext,
    pub title: String,
    pub action: String,
    pub is_new: bool,
    pub form: ProductForm,
    pub errors: FieldErrors,
    pub subcategories: Vec<Choice>,
}

/// Filters shared by the list and the export.
#[must_use]
pub fn product_filter(params: &QueryParams) -> ProductFilter {
    let visible = params.has("visibility", "visible");
    let hidden = params.has("visibility", "hidden");
    ProductFilter {
        search: params.first("q").map(str::to_string),
        category_ids: params.parsed("category"),
        subcategory_ids: params.parsed("subcategory"),
        hidden: match (visible, hidden) {
            (true, false) => Some(false),
            (false, true) => Some(true),
            _ => None,
        },
        low_stock_only: false,
    }
}

fn sort_choices(sort: ProductSort) -> Vec<Choice> {
    ProductSort::ALL
        .into_iter()
        .map(|s| Choice::new(s.as_str(), s.label(), s == sort))
        .collect()
}

fn parse_sku(raw: &str) -> Result<Sku> {
    Sku::parse(raw).map_err(|_| AppError::NotFound(format!("product {raw}")))
}

/// Product list with search, filters, sort and pagination.
///
/// GET /catalogue
#[instrument(skip(state, session, staff, raw))]
pub async fn index(
    RequirePermission(staff, _): CatalogueStaff,
    State(state): State<AppState>,
    session: Session,
    RawQuery(raw): RawQuery,
) -> Result<Response> {
    let params = QueryParams::parse(raw.as_deref());
    let filter = product_filter(&params);
    let sort = ProductSort::parse(params.first("sort"));

    let products = ProductRepository::new(state.pool());
    let total = products.count(&filter).await?;
    let paginator = Paginator::new(params.first("page"), PER_PAGE, total);
    let rows = products
        .list(&filter, sort, paginator.limit(), paginator.offset())
        .await?;

    let taxonomy = CategoryRepository::new(state.pool());
    let categories = taxonomy
        .list_with_counts()
        .await?
        .into_iter()
        .map(|c| {
            let selected = filter.category_ids.contains(&c.id);
            Choice::new(c.id.to_string(), c.name, selected)
        })
        .collect();
    let subcategories = taxonomy
        .list_subcategories()
        .await?
        .into_iter()
        .map(|s| {
            let selected = filter.subcategory_ids.contains(&s.id);
            Choice::new(s.id.to_string(), s.qualified_name(), selected)
        })
        .collect();
    let visibility = vec![
        Choice::new("visible", "Visible", params.has("visibility", "visible")),
        Choice::new("hidden", "Hidden", params.has("visibility", "hidden")),
    ];

    let query = params.without_page();
    let export_url = if query.is_empty() {
        "/catalogue/export".to_string()
    } else {
        format!("/catalogue/export?{query}")
    };

    render(&CatalogueListTemplate {
        page: PageContext::load(&session, &staff, Section::Catalogue).await,
        products: rows.iter().map(ProductRowView::from).collect(),
        q: filter.search.clone().unwrap_or_default(),
        categories,
        subcategories,
        visibility,
        sorts: sort_choices(sort),
        pages: PageLinks::new("/catalogue", &query, &paginator),
        export_url,
    })
}

/// Download the filtered catalogue as CSV.
///
/// GET /catalogue/export
#[instrument(skip_all)]
pub async fn export(
    _staff: CatalogueStaff,
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Response> {
    let params = QueryParams::parse(raw.as_deref());
    let sort = ProductSort::parse(params.first("sort"));
    let products = ProductRepository::new(state.pool())
        .list_all(&product_filter(&params), sort)
        .await?;

    let body = products_csv(&products).map_err(|e| AppError::Internal(e.to_string()))?;
    tracing::info!(count = products.len(), "Catalogue exported");
    Ok(csv_download(
        &export_filename("products", Utc::now().naive_utc()),
        body,
    ))
}

/// Bulk upload form.
///
/// GET /catalogue/upload
pub async fn upload_page(
    RequirePermission(staff, _): CatalogueStaff,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response> {
    render(&UploadTemplate {
        page: PageContext::load(&session, &staff, Section::Catalogue).await,
        limit_kib: state.config().upload_limit_bytes / 1024,
    })
}

async fn upload_failed(session: &Session, message: impl Into<String>) -> Result<Response> {
    push_flash(session, FlashLevel::Error, message).await?;
    Ok(Redirect::to("/catalogue/upload").into_response())
}

/// Import products from an uploaded CSV file.
///
/// POST /catalogue/upload
#[instrument(skip_all)]
pub async fn upload(
    _staff: CatalogueStaff,
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> Result<Response> {
    let mut file: Option<Vec<u8>> = None;
    let mut update_existing = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                file = Some(bytes.to_vec());
            }
            Some("update_existing") => update_existing = true,
            _ => {}
        }
    }

    let Some(bytes) = file.filter(|b| !b.is_empty()) else {
        return upload_failed(&session, "Choose a CSV file to upload.").await;
    };

    let parsed = match parse_upload(&bytes) {
        Ok(parsed) => parsed,
        Err(e) => return upload_failed(&session, e.to_string()).await,
    };

    let report = ProductRepository::new(state.pool())
        .upsert_many(
            &parsed.rows,
            UpsertOptions {
                update_existing,
                blank_description: BLANK_DESCRIPTION,
            },
        )
        .await?;

    tracing::info!(
        created = report.created,
        updated = report.updated,
        skipped = report.skipped_existing.len(),
        issues = parsed.issues.len(),
        "Catalogue upload processed"
    );

    for (level, text) in summary_messages(&report, &parsed.issues) {
        push_flash(&session, level, text).await?;
    }
    Ok(Redirect::to("/catalogue").into_response())
}

async fn subcategory_choices(state: &AppState, selected: &str) -> Result<Vec<Choice>> {
    Ok(CategoryRepository::new(state.pool())
        .list_subcategories()
        .await?
        .into_iter()
        .map(|s| {
            let value = s.id.to_string();
            let is_selected = value == selected.trim();
            Choice::new(value, s.qualified_name(), is_selected)
        })
        .collect())
}

async fn product_form_page(
    state: &AppState,
    session: &Session,
    staff: &CurrentStaff,
    existing: Option<&Sku>,
    form: ProductForm,
    errors: FieldErrors,
) -> Result<Response> {
    let (title, action) = match existing {
        Some(sku) => (
            format!("Edit {sku}"),
            sku_path("/catalogue/products", sku.as_str(), "/edit"),
        ),
        None => ("New product".to_string(), "/catalogue/products/new".to_string()),
    };
    render(&ProductFormTemplate {
        page: PageContext::load(session, staff, Section::Catalogue).await,
        title,
        action,
        is_new: existing.is_none(),
        subcategories: subcategory_choices(state, &form.subcategory).await?,
        form,
        errors,
    })
}

/// New product form.
///
/// GET /catalogue/products/new
pub async fn new_page(
    RequirePermission(staff, _): CatalogueStaff,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response> {
    let form = ProductForm {
        quantity_on_hand: "0".to_string(),
        reorder_quantity: "0".to_string(),
        rating: "0".to_string(),
        ..ProductForm::default()
    };
    product_form_page(&state, &session, &staff, None, form, FieldErrors::new()).await
}

/// Create a product.
///
/// POST /catalogue/products/new
#[instrument(skip(state, session, staff, form), fields(sku = %form.sku))]
pub async fn create(
    RequirePermission(staff, _): CatalogueStaff,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let (sku, input) = match form.validate_new() {
        Ok(valid) => valid,
        Err(errors) => {
            return product_form_page(&state, &session, &staff, None, form, errors).await;
        }
    };

    match ProductRepository::new(state.pool()).create(&sku, &input).await {
        Ok(()) => {
            tracing::info!(sku = %sku, "Product created");
            push_flash(&session, FlashLevel::Success, "Product created").await?;
            Ok(Redirect::to("/catalogue").into_response())
        }
        Err(RepositoryError::Conflict(message)) => {
            let field = if message.contains("SKU") { "sku" } else { "subcategory" };
            let errors = FieldErrors::from([(field, message)]);
            product_form_page(&state, &session, &staff, None, form, errors).await
        }
        Err(e) => Err(e.into()),
    }
}

/// Edit product form. The SKU cannot change.
///
/// GET /catalogue/products/{sku}/edit
pub async fn edit_page(
    RequirePermission(staff, _): CatalogueStaff,
    State(state): State<AppState>,
    session: Session,
    Path(sku): Path<String>,
) -> Result<Response> {
    let sku = parse_sku(&sku)?;
    let product = ProductRepository::new(state.pool())
        .get(&sku)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {sku}")))?;
    let form = ProductForm::from(&product);
    product_form_page(&state, &session, &staff, Some(&sku), form, FieldErrors::new()).await
}

/// Save a product edit.
///
/// POST /catalogue/products/{sku}/edit
#[instrument(skip(state, session, staff, form))]
pub async fn update(
    RequirePermission(staff, _): CatalogueStaff,
    State(state): State<AppState>,
    session: Session,
    Path(sku): Path<String>,
    Form(mut form): Form<ProductForm>,
) -> Result<Response> {
    let sku = parse_sku(&sku)?;
    form.sku = sku.to_string();
    let input = match form.validate_edit() {
        Ok(input) => input,
        Err(errors) => {
            return product_form_page(&state, &session, &staff, Some(&sku), form, errors).await;
        }
    };

    match ProductRepository::new(state.pool()).update(&sku, &input).await {
        Ok(()) => {
            tracing::info!(sku = %sku, "Product updated");
            push_flash(&session, FlashLevel::Success, "Product updated.").await?;
            Ok(Redirect::to("/catalogue").into_response())
        }
        Err(RepositoryError::Conflict(message)) => {
            let errors = FieldErrors::from([("subcategory", message)]);
            product_form_page(&state, &session, &staff, Some(&sku), form, errors).await
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete a product that has never been ordered.
///
/// POST /catalogue/products/{sku}/delete
#[instrument(skip(_staff, state, session))]
pub async fn delete(
    _staff: CatalogueStaff,
    State(state): State<AppState>,
    session: Session,
    Path(sku): Path<String>,
) -> Result<Redirect> {
    let sku = parse_sku(&sku)?;
    match ProductRepository::new(state.pool()).delete(&sku).await {
        Ok(()) => {
            tracing::info!(sku = %sku, "Product deleted");
            push_flash(&session, FlashLevel::Success, format!("{sku} deleted.")).await?;
        }
        Err(RepositoryError::Conflict(message)) => {
            push_flash(&session, FlashLevel::Error, message).await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(Redirect::to("/catalogue"))
}

/// Hide a visible product or unhide a hidden one.
///
/// POST /catalogue/products/{sku}/toggle-hidden
#[instrument(skip(_staff, state, session))]
pub async fn toggle_hidden(
    _staff: CatalogueStaff,
    State(state): State<AppState>,
    session: Session,
    Path(sku): Path<String>,
) -> Result<Redirect> {
    let sku = parse_sku(&sku)?;
    let hidden = ProductRepository::new(state.pool())
        .toggle_hidden(&sku)
        .await?;
    let message = if hidden {
        format!("{sku} hidden.")
    } else {
        format!("{sku} unhidden.")
    };
    push_flash(&session, FlashLevel::Success, message).await?;
    Ok(Redirect::to("/catalogue"))
}

#[cfg(test)]
mod tests {
    use shopfront_core::CategoryId;

    use super::*;

    #[test]
    fn test_visibility_filter() {
        let both = product_filter(&QueryParams::parse(Some("visibility=visible&visibility=hidden")));
        assert_eq!(both.hidden, None);
        let hidden = product_filter(&QueryParams::parse(Some("visibility=hidden")));
        assert_eq!(hidden.hidden, Some(true));
        let visible = product_filter(&QueryParams::parse(Some("visibility=visible")));
        assert_eq!(visible.hidden, Some(false));
        assert_eq!(product_filter(&QueryParams::default()).hidden, None);
    }

    #[test]
    fn test_filter_ignores_bad_ids() {
        let filter = product_filter(&QueryParams::parse(Some("category=2&category=x&q=%20mug%20")));
        assert_eq!(filter.category_ids, vec![CategoryId::new(2)]);
        assert_eq!(filter.search.as_deref(), Some("mug"));
    }
}
