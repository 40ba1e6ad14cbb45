//! Staff sign-in and sign-out.

use askama::Template;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::{OptionalStaff, clear_current_staff, set_current_staff};
use crate::models::CurrentStaff;
use crate::routes::layout::render;
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub username: String,
}

/// Display the login page. Signed-in staff go to the dashboard.
///
/// GET /auth/login
pub async fn login_page(OptionalStaff(staff): OptionalStaff) -> Result<Response> {
    if staff.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    render(&LoginTemplate {
        error: None,
        username: String::new(),
    })
}

/// Check credentials and sign in.
///
/// POST /auth/login
#[instrument(skip(state, session, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match AuthService::new(state.pool())
        .login(&form.username, &form.password)
        .await
    {
        Ok(user) => {
            set_current_staff(&session, &CurrentStaff::from(&user)).await?;
            tracing::info!(staff_id = %user.id, "Staff signed in");
            Ok(Redirect::to("/").into_response())
        }
        Err(AuthError::InvalidCredentials) => render(&LoginTemplate {
            error: Some(AuthError::InvalidCredentials.to_string()),
            username: form.username.trim().to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Sign out and return to the login page.
///
/// POST /auth/logout
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_staff(&session).await?;
    Ok(Redirect::to("/auth/login"))
}
