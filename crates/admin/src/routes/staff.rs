//! Staff account administration (Admin only).

use askama::Template;
use axum::{
    Form,
    extract::{Path, RawQuery, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::{Paginator, StaffRole, StaffUserId};

use crate::db::staff::StaffUpdate;
use crate::db::{RepositoryError, StaffRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{CanManageStaff, RequirePermission, push_flash, set_current_staff};
use crate::models::{CurrentStaff, FlashLevel, StaffUser};
use crate::routes::layout::{Choice, PageContext, PageLinks, QueryParams, Section, render};
use crate::services::auth::hash_password;
use crate::services::staff::{StaffCreateForm, StaffEditForm};
use crate::services::{AuthError, AuthService, FieldErrors};
use crate::state::AppState;

const PER_PAGE: i64 = 25;

type StaffAdmin = RequirePermission<CanManageStaff>;

#[derive(Template)]
#[template(path = "staff/list.html")]
pub struct StaffListTemplate {
    pub page: PageContext,
    pub accounts: Vec<StaffUser>,
    pub q: String,
    pub pages: PageLinks,
}

#[derive(Template)]
#[template(path = "staff/new.html")]
pub struct StaffNewTemplate {
    pub page: PageContext,
    pub form: StaffCreateForm,
    pub roles: Vec<Choice>,
    pub errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "staff/edit.html")]
pub struct StaffEditTemplate {
    pub page: PageContext,
    pub account: StaffUser,
    pub form: StaffEditForm,
    pub roles: Vec<Choice>,
    pub errors: FieldErrors,
}

/// Role options, with `selected` (a role's `as_str`) ticked.
fn role_choices(selected: &str) -> Vec<Choice> {
    StaffRole::ALL
        .into_iter()
        .map(|r| Choice::new(r.as_str(), r.label(), r.as_str() == selected.trim()))
        .collect()
}

async fn load_account(state: &AppState, id: StaffUserId) -> Result<StaffUser> {
    StaffRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("staff {id}")))
}

/// GET /staff
#[instrument(skip(state, session, staff, raw))]
pub async fn index(
    RequirePermission(staff, _): StaffAdmin,
    State(state): State<AppState>,
    session: Session,
    RawQuery(raw): RawQuery,
) -> Result<Response> {
    let params = QueryParams::parse(raw.as_deref());
    let search = params.first("q");

    let repo = StaffRepository::new(state.pool());
    let total = repo.count(search).await?;
    let paginator = Paginator::new(params.first("page"), PER_PAGE, total);
    let accounts = repo
        .list(search, paginator.limit(), paginator.offset())
        .await?;

    render(&StaffListTemplate {
        page: PageContext::load(&session, &staff, Section::Staff).await,
        accounts,
        q: search.unwrap_or_default().to_string(),
        pages: PageLinks::new("/staff", &params.without_page(), &paginator),
    })
}

async fn new_page_with(
    session: &Session,
    staff: &CurrentStaff,
    mut form: StaffCreateForm,
    errors: FieldErrors,
) -> Result<Response> {
    form.password1.clear();
    form.password2.clear();
    render(&StaffNewTemplate {
        page: PageContext::load(session, staff, Section::Staff).await,
        roles: role_choices(&form.role),
        form,
        errors,
    })
}

/// GET /staff/new
pub async fn new_page(
    RequirePermission(staff, _): StaffAdmin,
    session: Session,
) -> Result<Response> {
    let form = StaffCreateForm {
        role: StaffRole::Support.as_str().to_string(),
        ..StaffCreateForm::default()
    };
    new_page_with(&session, &staff, form, FieldErrors::new()).await
}

/// Create a staff account.
///
/// POST /staff/new
#[instrument(skip(state, session, staff, form), fields(username = %form.username))]
pub async fn create(
    RequirePermission(staff, _): StaffAdmin,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<StaffCreateForm>,
) -> Result<Response> {
    let valid = match form.validate() {
        Ok(valid) => valid,
        Err(errors) => return new_page_with(&session, &staff, form, errors).await,
    };

    match AuthService::new(state.pool()).create_account(&valid).await {
        Ok(created) => {
            push_flash(
                &session,
                FlashLevel::Success,
                format!("Staff '{}' created.", created.username),
            )
            .await?;
            Ok(Redirect::to("/staff").into_response())
        }
        Err(AuthError::Repository(RepositoryError::Conflict(message))) => {
            let errors = FieldErrors::from([("username", message)]);
            new_page_with(&session, &staff, form, errors).await
        }
        Err(e) => Err(e.into()),
    }
}

async fn edit_page_with(
    session: &Session,
    staff: &CurrentStaff,
    account: StaffUser,
    mut form: StaffEditForm,
    errors: FieldErrors,
) -> Result<Response> {
    form.password.clear();
    render(&StaffEditTemplate {
        page: PageContext::load(session, staff, Section::Staff).await,
        roles: role_choices(&form.role),
        account,
        form,
        errors,
    })
}

/// GET /staff/{id}/edit
pub async fn edit_page(
    RequirePermission(staff, _): StaffAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<StaffUserId>,
) -> Result<Response> {
    let account = load_account(&state, id).await?;
    let form = StaffEditForm::from(&account);
    edit_page_with(&session, &staff, account, form, FieldErrors::new()).await
}

/// Update profile, role, active flag and optionally the password.
///
/// POST /staff/{id}/edit
#[instrument(skip(state, session, staff, form))]
pub async fn update(
    RequirePermission(staff, _): StaffAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<StaffUserId>,
    Form(form): Form<StaffEditForm>,
) -> Result<Response> {
    let account = load_account(&state, id).await?;
    let valid = match form.validate(&account, &staff) {
        Ok(valid) => valid,
        Err(errors) => return edit_page_with(&session, &staff, account, form, errors).await,
    };

    let password_hash = valid.password.as_deref().map(hash_password).transpose()?;
    StaffRepository::new(state.pool())
        .update(
            id,
            &StaffUpdate {
                email: valid.email.as_str(),
                first_name: &valid.first_name,
                last_name: &valid.last_name,
                role: valid.role,
                is_active: valid.is_active,
                password_hash: password_hash.as_deref(),
            },
        )
        .await?;

    tracing::info!(
        staff_id = %id,
        role = valid.role.as_str(),
        is_active = valid.is_active,
        password_changed = password_hash.is_some(),
        "Staff account updated"
    );

    if id == staff.id {
        let refreshed = load_account(&state, id).await?;
        set_current_staff(&session, &CurrentStaff::from(&refreshed)).await?;
    }

    push_flash(
        &session,
        FlashLevel::Success,
        format!("Updated roles for '{}'.", account.username),
    )
    .await?;
    Ok(Redirect::to("/staff").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_choices_follow_role_order() {
        let choices = role_choices("inventory");
        let labels: Vec<&str> = choices.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels.len(), StaffRole::ALL.len());
        let selected: Vec<&str> = choices
            .iter()
            .filter(|c| c.selected)
            .map(|c| c.value.as_str())
            .collect();
        assert_eq!(selected, vec!["inventory"]);
    }

    #[test]
    fn test_unknown_role_selects_nothing() {
        assert!(role_choices("owner").iter().all(|c| !c.selected));
    }
}
