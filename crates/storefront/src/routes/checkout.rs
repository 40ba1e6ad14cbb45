//! Checkout route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::{PaymentMethod, Price};

use crate::db::customers::CustomerRepository;
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{RequireAuth, push_flash};
use crate::models::{CartSummary, CurrentUser, FlashLevel, shipping_fee};
use crate::routes::cart::CartLineView;
use crate::routes::layout::{SiteContext, cart_owner};
use crate::services::cart::CartService;
use crate::services::checkout::{
    CheckoutError, CheckoutForm, CheckoutService, FieldErrors, line_problems,
};
use crate::state::AppState;

/// Payment method radio option.
#[derive(Debug, Clone)]
pub struct PaymentOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Per-field validation messages.
#[derive(Debug, Clone, Default)]
pub struct CheckoutErrors {
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub payment_method: Option<String>,
    /// Problems with the cart lines themselves.
    pub lines: Vec<String>,
}

impl CheckoutErrors {
    fn from_fields(mut fields: FieldErrors) -> Self {
        Self {
            address: fields.remove("address"),
            postal_code: fields.remove("postal_code"),
            phone: fields.remove("phone"),
            payment_method: fields.remove("payment_method"),
            lines: Vec::new(),
        }
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub site: SiteContext,
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    pub shipping: String,
    pub total: String,
    pub form: CheckoutForm,
    pub payment_options: Vec<PaymentOption>,
    pub errors: CheckoutErrors,
}

fn payment_options(selected: &str) -> Vec<PaymentOption> {
    let selected = selected.parse::<PaymentMethod>().ok();
    PaymentMethod::ALL
        .iter()
        .map(|&method| PaymentOption {
            value: method.as_str(),
            label: method.label(),
            selected: selected == Some(method),
        })
        .collect()
}

async fn render(
    state: &AppState,
    session: &Session,
    user: &CurrentUser,
    summary: &CartSummary,
    form: CheckoutForm,
    errors: CheckoutErrors,
) -> Result<CheckoutTemplate> {
    let fee = shipping_fee(summary.total);
    let total: Price = summary.total + fee;
    let site = SiteContext::load(state, session, Some(user)).await?;

    Ok(CheckoutTemplate {
        site,
        lines: summary.lines.iter().map(CartLineView::from).collect(),
        subtotal: summary.total.to_string(),
        shipping: fee.to_string(),
        total: total.to_string(),
        payment_options: payment_options(&form.payment_method),
        form,
        errors,
    })
}

async fn empty_cart_redirect(session: &Session) -> Result<Response> {
    push_flash(session, FlashLevel::Error, CheckoutError::EmptyCart.to_string()).await?;
    Ok(Redirect::to("/cart").into_response())
}

/// Display the checkout form, prefilled from the profile.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Response> {
    let summary = CartService::new(state.pool(), &session, cart_owner(Some(&user)))
        .summary()
        .await?;
    if summary.is_empty() {
        return empty_cart_redirect(&session).await;
    }

    let profile = CustomerRepository::new(state.pool())
        .get(user.customer_id)
        .await?;
    let form = profile
        .map(|p| CheckoutForm {
            address: p.address.unwrap_or_default(),
            postal_code: p.postal_code.unwrap_or_default(),
            phone: p.phone.unwrap_or_default(),
            payment_method: String::new(),
        })
        .unwrap_or_default();

    let errors = CheckoutErrors {
        lines: line_problems(&summary.lines),
        ..CheckoutErrors::default()
    };

    Ok(render(&state, &session, &user, &summary, form, errors)
        .await?
        .into_response())
}

/// Place the order.
#[instrument(skip(state, session, user, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    match CheckoutService::new(state.pool())
        .place(user.customer_id, &form)
        .await
    {
        Ok(order_id) => {
            add_breadcrumb("checkout", "Order placed", &[("order_id", &order_id.to_string())]);
            push_flash(
                &session,
                FlashLevel::Success,
                format!("Order #{order_id} placed."),
            )
            .await?;
            Ok(Redirect::to(&format!("/account/orders/{order_id}")).into_response())
        }
        Err(CheckoutError::EmptyCart) => empty_cart_redirect(&session).await,
        Err(CheckoutError::Invalid(fields)) => {
            rerender(&state, &session, &user, form, CheckoutErrors::from_fields(fields)).await
        }
        Err(CheckoutError::Unavailable(lines)) => {
            let errors = CheckoutErrors {
                lines,
                ..CheckoutErrors::default()
            };
            rerender(&state, &session, &user, form, errors).await
        }
        Err(CheckoutError::Repository(e)) => Err(e.into()),
    }
}

async fn rerender(
    state: &AppState,
    session: &Session,
    user: &CurrentUser,
    form: CheckoutForm,
    errors: CheckoutErrors,
) -> Result<Response> {
    let summary = CartService::new(state.pool(), session, cart_owner(Some(user)))
        .summary()
        .await?;
    if summary.is_empty() {
        return empty_cart_redirect(session).await;
    }
    let page = render(state, session, user, &summary, form, errors).await?;
    Ok((axum::http::StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_options_mark_selection() {
        let options = payment_options("paynow");
        assert_eq!(options.len(), 3);
        assert!(options.iter().any(|o| o.value == "pay_now" && o.selected));
        assert_eq!(options.iter().filter(|o| o.selected).count(), 1);
        assert!(payment_options("").iter().all(|o| !o.selected));
    }
}
