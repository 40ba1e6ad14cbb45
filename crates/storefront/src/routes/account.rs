//! Account route handlers.
//!
//! These routes require authentication; anonymous requests are redirected
//! to the login page by [`RequireAuth`].

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::{info, instrument};

use shopfront_core::demographics::OCCUPATIONS;
use shopfront_core::{Education, EmploymentStatus, Gender, OrderId, category_slug};

use crate::db::customers::CustomerRepository;
use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAuth, push_flash};
use crate::models::{CurrentUser, FlashLevel, OrderDetail, OrderSummary};
use crate::routes::layout::{CategoryLink, SiteContext, product_url};
use crate::services::checkout::FieldErrors;
use crate::services::profile::ProfileForm;
use crate::state::AppState;

/// Order history row.
#[derive(Debug, Clone)]
pub struct OrderRowView {
    pub id: String,
    pub url: String,
    pub status: &'static str,
    pub order_date: String,
    pub item_count: i64,
    pub total: String,
}

impl From<&OrderSummary> for OrderRowView {
    fn from(order: &OrderSummary) -> Self {
        Self {
            id: order.id.to_string(),
            url: format!("/account/orders/{}", order.id),
            status: order.status.label(),
            order_date: order.order_date.format("%d %b %Y").to_string(),
            item_count: order.item_count,
            total: order.total().to_string(),
        }
    }
}

/// Purchased line on the order page.
#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub name: String,
    pub url: String,
    pub quantity: i32,
    pub unit_price: String,
    pub subtotal: String,
}

/// Payment block on the order page.
#[derive(Debug, Clone)]
pub struct PaymentView {
    pub method: &'static str,
    pub status: String,
    pub amount: String,
    pub transaction_ref: String,
}

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub site: SiteContext,
    pub orders: Vec<OrderRowView>,
}

/// Order detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order_detail.html")]
pub struct OrderDetailTemplate {
    pub site: SiteContext,
    pub order: OrderRowView,
    pub required_date: String,
    pub shipped_date: Option<String>,
    pub shipping_address: String,
    pub postal_code: String,
    pub phone: String,
    pub subtotal: String,
    pub shipping: String,
    pub lines: Vec<OrderLineView>,
    pub payment: Option<PaymentView>,
}

impl OrderDetailTemplate {
    fn new(site: SiteContext, detail: &OrderDetail) -> Self {
        Self {
            site,
            order: OrderRowView::from(&detail.summary),
            required_date: detail.required_date.format("%d %b %Y").to_string(),
            shipped_date: detail
                .shipped_date
                .map(|d| d.format("%d %b %Y").to_string()),
            shipping_address: detail.shipping_address.clone(),
            postal_code: detail.postal_code.clone(),
            phone: detail.phone.clone(),
            subtotal: detail.summary.order_price.to_string(),
            shipping: detail.summary.shipping_fee.to_string(),
            lines: detail
                .lines
                .iter()
                .map(|line| OrderLineView {
                    name: line.name.clone(),
                    url: product_url(line.sku.as_str()),
                    quantity: line.quantity,
                    unit_price: line.unit_price.to_string(),
                    subtotal: line.subtotal().to_string(),
                })
                .collect(),
            payment: detail.payment.as_ref().map(|p| PaymentView {
                method: p.method.label(),
                status: p.status.to_string(),
                amount: p.amount.to_string(),
                transaction_ref: p.transaction_ref.clone(),
            }),
        }
    }
}

/// Select option for the profile form.
#[derive(Debug, Clone)]
pub struct ChoiceView {
    pub value: &'static str,
    pub selected: bool,
}

fn choices<'a>(values: impl IntoIterator<Item = &'a &'static str>, current: &str) -> Vec<ChoiceView> {
    values
        .into_iter()
        .map(|&value| ChoiceView {
            value,
            selected: value.eq_ignore_ascii_case(current.trim()),
        })
        .collect()
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub site: SiteContext,
    pub email: String,
    pub form: ProfileForm,
    pub genders: Vec<ChoiceView>,
    pub employment_statuses: Vec<ChoiceView>,
    pub educations: Vec<ChoiceView>,
    pub occupations: Vec<ChoiceView>,
    pub preferred_category: Option<CategoryLink>,
    pub errors: FieldErrors,
}

impl ProfileTemplate {
    fn new(
        site: SiteContext,
        user: &CurrentUser,
        form: ProfileForm,
        preferred_category: Option<&str>,
        errors: FieldErrors,
    ) -> Self {
        let genders: Vec<&'static str> = Gender::ALL.iter().map(|g| g.as_str()).collect();
        let employment: Vec<&'static str> =
            EmploymentStatus::ALL.iter().map(|e| e.as_str()).collect();
        let educations: Vec<&'static str> = Education::ALL.iter().map(|e| e.as_str()).collect();

        Self {
            site,
            email: user.email.to_string(),
            genders: choices(&genders, &form.gender),
            employment_statuses: choices(&employment, &form.employment_status),
            educations: choices(&educations, &form.education),
            occupations: choices(OCCUPATIONS, &form.occupation),
            form,
            preferred_category: preferred_category.map(|name| CategoryLink {
                name: name.to_string(),
                url: format!("/products?category={}", category_slug(name)),
            }),
            errors,
        }
    }
}

/// Display the signed-in customer's orders, newest first.
#[instrument(skip(state, session, user))]
pub async fn orders(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<OrdersTemplate> {
    let orders = OrderRepository::new(state.pool())
        .list_for_customer(user.customer_id)
        .await?;
    let site = SiteContext::load(&state, &session, Some(&user)).await?;

    Ok(OrdersTemplate {
        site,
        orders: orders.iter().map(OrderRowView::from).collect(),
    })
}

/// Display one order. Orders of other customers are not found.
#[instrument(skip(state, session, user))]
pub async fn order_detail(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<OrderDetailTemplate> {
    let order_id = id
        .parse::<OrderId>()
        .map_err(|_| AppError::NotFound(format!("Order {id}")))?;
    let detail = OrderRepository::new(state.pool())
        .get_for_customer(user.customer_id, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {order_id}")))?;
    let site = SiteContext::load(&state, &session, Some(&user)).await?;

    Ok(OrderDetailTemplate::new(site, &detail))
}

/// Display the profile form.
#[instrument(skip(state, session, user))]
pub async fn profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<ProfileTemplate> {
    let profile = CustomerRepository::new(state.pool())
        .get(user.customer_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer profile".to_string()))?;
    let site = SiteContext::load(&state, &session, Some(&user)).await?;
    Ok(ProfileTemplate::new(
        site,
        &user,
        ProfileForm::from(&profile),
        profile.preferred_category(),
        FieldErrors::new(),
    ))
}

/// Save the profile.
///
/// A blank preferred category is filled from the model's prediction for the
/// updated demographics.
#[instrument(skip(state, session, user, form))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    let update = match form.validate() {
        Ok(update) => update,
        Err(errors) => {
            let site = SiteContext::load(&state, &session, Some(&user)).await?;
            let page = ProfileTemplate::new(site, &user, form, None, errors);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let customers = CustomerRepository::new(state.pool());
    customers.update_profile(user.customer_id, &update).await?;

    if let Some(profile) = customers.get(user.customer_id).await?
        && profile.preferred_category().is_none()
        && let Some(category) = state
            .recommender()
            .predict_preferred_category(&profile.features())
            .await
        && customers
            .fill_preferred_category(user.customer_id, &category)
            .await?
    {
        info!(customer_id = %user.customer_id, category = %category, "Preferred category predicted");
    }

    push_flash(&session, FlashLevel::Success, "Profile updated").await?;
    Ok(Redirect::to("/account/profile").into_response())
}
