//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::customers::CustomerRepository;
use crate::db::products::ProductRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::CurrentUser;
use crate::routes::layout::{ProductCard, SiteContext};
use crate::state::AppState;

/// Top-rated products on the home page.
const FEATURED_COUNT: i64 = 12;

/// Products in the "Recommended for you" strip.
const RECOMMENDED_COUNT: i64 = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub site: SiteContext,
    pub featured: Vec<ProductCard>,
    /// Category the recommendations were drawn from.
    pub recommended_category: Option<String>,
    pub recommended: Vec<ProductCard>,
}

/// Display the home page.
#[instrument(skip(state, session, user))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<HomeTemplate> {
    let site = SiteContext::load(&state, &session, user.as_ref()).await?;
    let products = ProductRepository::new(state.pool());

    let featured = products
        .top_rated(FEATURED_COUNT)
        .await?
        .iter()
        .map(ProductCard::from)
        .collect();

    let recommended_category = match &user {
        Some(user) => preferred_category(&state, user).await?,
        None => None,
    };
    let recommended = match &recommended_category {
        Some(category) => products
            .top_rated_in_category(category, RECOMMENDED_COUNT)
            .await?
            .iter()
            .map(ProductCard::from)
            .collect(),
        None => Vec::new(),
    };

    Ok(HomeTemplate {
        site,
        featured,
        recommended_category,
        recommended,
    })
}

/// The customer's stored preferred category, else the model's prediction.
async fn preferred_category(state: &AppState, user: &CurrentUser) -> Result<Option<String>> {
    let Some(profile) = CustomerRepository::new(state.pool())
        .get(user.customer_id)
        .await?
    else {
        return Ok(None);
    };

    if let Some(stored) = profile.preferred_category() {
        return Ok(Some(stored.to_string()));
    }

    Ok(state
        .recommender()
        .predict_preferred_category(&profile.features())
        .await)
}
