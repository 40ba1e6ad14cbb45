//! Authentication route handlers.
//!
//! Registration and password login for shoppers. Both end by signing the
//! shopper in, merging the guest cart into their database cart and
//! redirecting to a safe local `next`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{instrument, warn};

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, push_flash, safe_next, set_current_user};
use crate::models::{Account, CurrentUser, FlashLevel};
use crate::routes::layout::SiteContext;
use crate::services::auth::{AuthError, AuthService, MIN_PASSWORD_LENGTH, Registration};
use crate::services::cart::merge_guest_cart;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub next: Option<String>,
}

/// `?next=` on the login and register pages.
#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub site: SiteContext,
    pub error: Option<String>,
    pub email: String,
    pub next: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub site: SiteContext,
    pub error: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub next: String,
    pub min_password_length: usize,
}

/// Message shown on the form for errors the shopper can fix.
///
/// Returns `None` for server-side failures.
fn user_message(err: &AuthError) -> Option<String> {
    match err {
        AuthError::InvalidEmail(_) => Some("Enter a valid email address.".to_string()),
        AuthError::InvalidCredentials => Some("Invalid email or password.".to_string()),
        AuthError::UserAlreadyExists => {
            Some("An account with this email already exists.".to_string())
        }
        AuthError::WeakPassword(reason) => Some(reason.clone()),
        AuthError::PasswordMismatch => Some("Passwords do not match.".to_string()),
        AuthError::Repository(_) | AuthError::PasswordHash => None,
    }
}

fn next_value(next: Option<&str>) -> String {
    safe_next(next).unwrap_or_default().to_string()
}

/// Sign the account in and carry the guest cart over.
async fn sign_in(state: &AppState, session: &Session, account: &Account) -> Result<()> {
    let user = CurrentUser {
        account_id: account.id,
        customer_id: account.customer_id,
        email: account.email.clone(),
        display_name: account.display_name(),
    };
    set_current_user(session, &user).await?;

    if let Err(e) = merge_guest_cart(state.pool(), session, account.customer_id).await {
        warn!(error = %e, customer_id = %account.customer_id, "Guest cart merge failed");
    }

    set_sentry_user(&account.id, Some(account.email.as_str()));
    Ok(())
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page. Signed-in shoppers go straight to `next`.
#[instrument(skip(state, session, user))]
pub async fn login_page(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<NextQuery>,
) -> Result<Response> {
    if user.is_some() {
        let target = safe_next(query.next.as_deref()).unwrap_or("/");
        return Ok(Redirect::to(target).into_response());
    }
    let site = SiteContext::load(&state, &session, None).await?;

    Ok(LoginTemplate {
        site,
        error: None,
        email: String::new(),
        next: next_value(query.next.as_deref()),
    }
    .into_response())
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(account) => {
            sign_in(&state, &session, &account).await?;
            let target = safe_next(form.next.as_deref()).unwrap_or("/");
            Ok(Redirect::to(target).into_response())
        }
        Err(e) => {
            let Some(message) = user_message(&e) else {
                return Err(e.into());
            };
            warn!(error = %e, "Login failed");
            let site = SiteContext::load(&state, &session, None).await?;
            let page = LoginTemplate {
                site,
                error: Some(message),
                email: form.email.trim().to_string(),
                next: next_value(form.next.as_deref()),
            };
            Ok((StatusCode::UNAUTHORIZED, page).into_response())
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
#[instrument(skip(state, session, user))]
pub async fn register_page(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<NextQuery>,
) -> Result<Response> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let site = SiteContext::load(&state, &session, None).await?;

    Ok(RegisterTemplate {
        site,
        error: None,
        first_name: String::new(),
        last_name: String::new(),
        email: String::new(),
        next: next_value(query.next.as_deref()),
        min_password_length: MIN_PASSWORD_LENGTH,
    }
    .into_response())
}

/// Handle registration form submission.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let registration = Registration {
        first_name: &form.first_name,
        last_name: &form.last_name,
        email: &form.email,
        password: &form.password,
        password_confirm: &form.password_confirm,
    };

    match AuthService::new(state.pool()).register(&registration).await {
        Ok(account) => {
            sign_in(&state, &session, &account).await?;
            push_flash(&session, FlashLevel::Success, "Welcome! Your account is ready.").await?;
            let target = safe_next(form.next.as_deref()).unwrap_or("/");
            Ok(Redirect::to(target).into_response())
        }
        Err(e) => {
            let Some(message) = user_message(&e) else {
                return Err(e.into());
            };
            let site = SiteContext::load(&state, &session, None).await?;
            let page = RegisterTemplate {
                site,
                error: Some(message),
                first_name: form.first_name.trim().to_string(),
                last_name: form.last_name.trim().to_string(),
                email: form.email.trim().to_string(),
                next: next_value(form.next.as_deref()),
                min_password_length: MIN_PASSWORD_LENGTH,
            };
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Sign out. The next guest cart starts empty.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    push_flash(&session, FlashLevel::Info, "You have been signed out.").await?;
    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hides_server_errors() {
        assert!(user_message(&AuthError::PasswordHash).is_none());
        assert_eq!(
            user_message(&AuthError::InvalidCredentials).as_deref(),
            Some("Invalid email or password.")
        );
        assert_eq!(
            user_message(&AuthError::WeakPassword("Too short".to_string())).as_deref(),
            Some("Too short")
        );
    }

    #[test]
    fn test_next_value_drops_offsite_targets() {
        assert_eq!(next_value(Some("/checkout")), "/checkout");
        assert_eq!(next_value(Some("https://evil.example")), "");
        assert_eq!(next_value(None), "");
    }
}
