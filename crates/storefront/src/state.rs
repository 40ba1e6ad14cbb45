//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::categories::CategoryRepository;
use crate::error::AppError;
use crate::models::Category;
use crate::recommender::Recommender;

/// How long the category list is reused before re-reading it.
const CATEGORY_CACHE_TTL: Duration = Duration::from_secs(60);

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    recommender: Recommender,
    categories: Cache<(), Arc<Vec<Category>>>,
}

impl AppState {
    /// Create application state, loading recommender artefacts lazily from
    /// the configured paths.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let recommender = Recommender::new(config.recommender.clone());
        Self::with_recommender(config, pool, recommender)
    }

    /// Create application state with a specific recommender.
    #[must_use]
    pub fn with_recommender(
        config: StorefrontConfig,
        pool: PgPool,
        recommender: Recommender,
    ) -> Self {
        let categories = Cache::builder()
            .max_capacity(1)
            .time_to_live(CATEGORY_CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                recommender,
                categories,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn recommender(&self) -> &Recommender {
        &self.inner.recommender
    }

    /// All categories, cached briefly.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the list cannot be loaded.
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, AppError> {
        let pool = self.pool();
        self.inner
            .categories
            .try_get_with((), async move {
                CategoryRepository::new(pool).list_all().await.map(Arc::new)
            })
            .await
            .map_err(|e| AppError::Internal(format!("loading categories: {e}")))
    }
}
