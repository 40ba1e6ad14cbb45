//! Category and subcategory management.

use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::{CategoryId, SubCategoryId};

use crate::db::{CategoryRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{CanManageCatalogue, RequirePermission, push_flash};
use crate::models::{CategorySummary, CurrentStaff, FlashLevel, SubcategorySummary};
use crate::routes::layout::{Choice, PageContext, Section, render};
use crate::services::FieldErrors;
use crate::services::catalogue::{CategoryForm, MergeForm, SubcategoryForm, validate_category_name};
use crate::state::AppState;

const CATEGORIES_PATH: &str = "/catalogue/categories";

type CatalogueStaff = RequirePermission<CanManageCatalogue>;

/// Categories overview with create, merge and subcategory forms.
#[derive(Template)]
#[template(path = "catalogue/categories.html")]
pub struct CategoriesTemplate {
    pub page: PageContext,
    pub categories: Vec<CategorySummary>,
    pub subcategories: Vec<SubcategorySummary>,
    pub category_choices: Vec<Choice>,
    pub category_form: CategoryForm,
    pub subcategory_form: SubcategoryForm,
    pub errors: FieldErrors,
}

/// Rename form for one category.
#[derive(Template)]
#[template(path = "catalogue/category_edit.html")]
pub struct CategoryEditTemplate {
    pub page: PageContext,
    pub category: CategorySummary,
    pub form: CategoryForm,
    pub error: Option<String>,
}

/// Edit form for one subcategory.
#[derive(Template)]
#[template(path = "catalogue/subcategory_edit.html")]
pub struct SubcategoryEditTemplate {
    pub page: PageContext,
    pub subcategory: SubcategorySummary,
    pub form: SubcategoryForm,
    pub category_choices: Vec<Choice>,
    pub errors: FieldErrors,
}

fn category_choices(categories: &[CategorySummary], selected: &str) -> Vec<Choice> {
    categories
        .iter()
        .map(|c| {
            let value = c.id.to_string();
            let is_selected = value == selected.trim();
            Choice::new(value, c.name.clone(), is_selected)
        })
        .collect()
}

async fn categories_page(
    state: &AppState,
    session: &Session,
    staff: &CurrentStaff,
    category_form: CategoryForm,
    subcategory_form: SubcategoryForm,
    errors: FieldErrors,
) -> Result<Response> {
    let repo = CategoryRepository::new(state.pool());
    let categories = repo.list_with_counts().await?;
    let subcategories = repo.list_subcategories().await?;
    render(&CategoriesTemplate {
        page: PageContext::load(session, staff, Section::Catalogue).await,
        category_choices: category_choices(&categories, &subcategory_form.category),
        categories,
        subcategories,
        category_form,
        subcategory_form,
        errors,
    })
}

async fn load_category(state: &AppState, id: CategoryId) -> Result<CategorySummary> {
    CategoryRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {id}")))
}

async fn load_subcategory(state: &AppState, id: SubCategoryId) -> Result<SubcategorySummary> {
    CategoryRepository::new(state.pool())
        .get_subcategory(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("subcategory {id}")))
}

/// GET /catalogue/categories
pub async fn index(
    RequirePermission(staff, _): CatalogueStaff,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response> {
    categories_page(
        &state,
        &session,
        &staff,
        CategoryForm::default(),
        SubcategoryForm::default(),
        FieldErrors::new(),
    )
    .await
}

/// Create a category, which also gets a default subcategory.
///
/// POST /catalogue/categories
#[instrument(skip(state, session, staff, form))]
pub async fn create(
    RequirePermission(staff, _): CatalogueStaff,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    let message = match validate_category_name(&form.name) {
        Ok(name) => match CategoryRepository::new(state.pool()).create(&name).await {
            Ok(id) => {
                tracing::info!(category_id = %id, name = %name, "Category created");
                push_flash(&session, FlashLevel::Success, "Category created.").await?;
                return Ok(Redirect::to(CATEGORIES_PATH).into_response());
            }
            Err(RepositoryError::Conflict(message)) => message,
            Err(e) => return Err(e.into()),
        },
        Err(message) => message,
    };
    let errors = FieldErrors::from([("category_name", message)]);
    categories_page(&state, &session, &staff, form, SubcategoryForm::default(), errors).await
}

/// GET /catalogue/categories/{id}/edit
pub async fn edit_page(
    RequirePermission(staff, _): CatalogueStaff,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<CategoryId>,
) -> Result<Response> {
    let category = load_category(&state, id).await?;
    render(&CategoryEditTemplate {
        page: PageContext::load(&session, &staff, Section::Catalogue).await,
        form: CategoryForm {
            name: category.name.clone(),
        },
        category,
        error: None,
    })
}

/// Rename a category.
///
/// POST /catalogue/categories/{id}/edit
#[instrument(skip(state, session, staff, form))]
pub async fn update(
    RequirePermission(staff, _): CatalogueStaff,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<CategoryId>,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    let category = load_category(&state, id).await?;
    let error = match validate_category_name(&form.name) {
        Ok(name) => match CategoryRepository::new(state.pool()).rename(id, &name).await {
            Ok(()) => {
                tracing::info!(category_id = %id, name = %name, "Category renamed");
                push_flash(&session, FlashLevel::Success, "Category renamed.").await?;
                return Ok(Redirect::to(CATEGORIES_PATH).into_response());
            }
            Err(RepositoryError::Conflict(message)) => message,
            Err(e) => return Err(e.into()),
        },
        Err(message) => message,
    };
    render(&CategoryEditTemplate {
        page: PageContext::load(&session, &staff, Section::Catalogue).await,
        category,
        form,
        error: Some(error),
    })
}

/// Move every subcategory and product of one category into another, then
/// delete the emptied category.
///
/// POST /catalogue/categories/merge
#[instrument(skip_all)]
pub async fn merge(
    _staff: CatalogueStaff,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<MergeForm>,
) -> Result<Redirect> {
    let (source_id, target_id) = match form.validate() {
        Ok(ids) => ids,
        Err(message) => {
            push_flash(&session, FlashLevel::Error, message).await?;
            return Ok(Redirect::to(CATEGORIES_PATH));
        }
    };
    let source = load_category(&state, source_id).await?;
    let target = load_category(&state, target_id).await?;

    match CategoryRepository::new(state.pool())
        .merge(source_id, target_id)
        .await
    {
        Ok(outcome) => {
            tracing::info!(
                source = %source_id,
                target = %target_id,
                moved = outcome.moved,
                merged = outcome.merged,
                "Categories merged"
            );
            push_flash(
                &session,
                FlashLevel::Success,
                format!("Merged '{}' into '{}'.", source.name, target.name),
            )
            .await?;
        }
        Err(RepositoryError::Conflict(message)) => {
            push_flash(&session, FlashLevel::Error, message).await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(Redirect::to(CATEGORIES_PATH))
}

/// Create a subcategory under a category.
///
/// POST /catalogue/subcategories
#[instrument(skip(state, session, staff, form))]
pub async fn create_subcategory(
    RequirePermission(staff, _): CatalogueStaff,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SubcategoryForm>,
) -> Result<Response> {
    let errors = match form.validate() {
        Ok((name, category_id)) => {
            match CategoryRepository::new(state.pool())
                .create_subcategory(category_id, &name)
                .await
            {
                Ok(id) => {
                    tracing::info!(subcategory_id = %id, name = %name, "Subcategory created");
                    push_flash(&session, FlashLevel::Success, "Subcategory created.").await?;
                    return Ok(Redirect::to(CATEGORIES_PATH).into_response());
                }
                Err(RepositoryError::Conflict(message)) => FieldErrors::from([("name", message)]),
                Err(e) => return Err(e.into()),
            }
        }
        Err(errors) => errors,
    };
    categories_page(&state, &session, &staff, CategoryForm::default(), form, errors).await
}

/// GET /catalogue/subcategories/{id}/edit
pub async fn edit_subcategory_page(
    RequirePermission(staff, _): CatalogueStaff,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<SubCategoryId>,
) -> Result<Response> {
    let subcategory = load_subcategory(&state, id).await?;
    let form = SubcategoryForm {
        name: subcategory.name.clone(),
        category: subcategory.category_id.to_string(),
    };
    subcategory_page(&state, &session, &staff, subcategory, form, FieldErrors::new()).await
}

async fn subcategory_page(
    state: &AppState,
    session: &Session,
    staff: &CurrentStaff,
    subcategory: SubcategorySummary,
    form: SubcategoryForm,
    errors: FieldErrors,
) -> Result<Response> {
    let categories = CategoryRepository::new(state.pool())
        .list_with_counts()
        .await?;
    render(&SubcategoryEditTemplate {
        page: PageContext::load(session, staff, Section::Catalogue).await,
        category_choices: category_choices(&categories, &form.category),
        subcategory,
        form,
        errors,
    })
}

/// Rename a subcategory or move it to another category.
///
/// POST /catalogue/subcategories/{id}/edit
#[instrument(skip(state, session, staff, form))]
pub async fn update_subcategory(
    RequirePermission(staff, _): CatalogueStaff,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<SubCategoryId>,
    Form(form): Form<SubcategoryForm>,
) -> Result<Response> {
    let subcategory = load_subcategory(&state, id).await?;
    let errors = match form.validate() {
        Ok((name, category_id)) => {
            match CategoryRepository::new(state.pool())
                .update_subcategory(id, category_id, &name)
                .await
            {
                Ok(()) => {
                    tracing::info!(subcategory_id = %id, name = %name, "Subcategory updated");
                    push_flash(&session, FlashLevel::Success, "Subcategory updated.").await?;
                    return Ok(Redirect::to(CATEGORIES_PATH).into_response());
                }
                Err(RepositoryError::Conflict(message)) => FieldErrors::from([("name", message)]),
                Err(e) => return Err(e.into()),
            }
        }
        Err(errors) => errors,
    };
    subcategory_page(&state, &session, &staff, subcategory, form, errors).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_choices_mark_selected() {
        let categories = vec![
            CategorySummary {
                id: CategoryId::new(1),
                name: "Books".to_string(),
                subcategory_count: 1,
                product_count: 3,
            },
            CategorySummary {
                id: CategoryId::new(2),
                name: "Games".to_string(),
                subcategory_count: 2,
                product_count: 0,
            },
        ];
        let choices = category_choices(&categories, " 2 ");
        let selected: Vec<&str> = choices
            .iter()
            .filter(|c| c.selected)
            .map(|c| c.label.as_str())
            .collect();
        assert_eq!(selected, vec!["Games"]);
    }
}
