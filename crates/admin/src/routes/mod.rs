//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Liveness check
//! GET  /health/ready                        - Readiness check (database)
//!
//! # Auth
//! GET  /auth/login                          - Login page
//! POST /auth/login                          - Password login
//! POST /auth/logout                         - Logout
//!
//! # Dashboard (any signed-in staff)
//! GET  /                                    - KPIs (?category, ?start, ?end)
//!
//! # Catalogue (Admin, Manager, Merchandiser)
//! GET  /catalogue                           - Products (?q, ?category, ?subcategory, ?visibility, ?sort, ?page)
//! GET  /catalogue/export                    - Filtered products as CSV
//! GET  /catalogue/upload                    - Bulk upload form
//! POST /catalogue/upload                    - Bulk upload (multipart)
//! GET  /catalogue/products/new              - New product form
//! POST /catalogue/products/new              - Create product
//! GET  /catalogue/products/{sku}/edit       - Edit product form
//! POST /catalogue/products/{sku}/edit       - Save product
//! POST /catalogue/products/{sku}/delete     - Delete product
//! POST /catalogue/products/{sku}/toggle-hidden - Hide or unhide
//! GET  /catalogue/categories                - Categories and subcategories
//! POST /catalogue/categories                - Create category
//! GET  /catalogue/categories/{id}/edit      - Rename form
//! POST /catalogue/categories/{id}/edit      - Rename category
//! POST /catalogue/categories/merge          - Merge two categories
//! POST /catalogue/subcategories             - Create subcategory
//! GET  /catalogue/subcategories/{id}/edit   - Edit subcategory form
//! POST /catalogue/subcategories/{id}/edit   - Save subcategory
//!
//! # Inventory (Admin, Manager, Inventory)
//! GET  /inventory                           - Stock levels (?q, ?low=1, ?sort, ?page)
//! GET  /inventory/export                    - Filtered stock as CSV
//! GET  /inventory/{sku}                     - Stock form
//! POST /inventory/{sku}                     - Save stock levels
//!
//! # Customers (Admin, Manager, Support)
//! GET  /customers                           - Directory with demographic filters
//! GET  /customers/{id}                      - Profile and order history
//!
//! # Staff (Admin)
//! GET  /staff                               - Accounts (?q, ?page)
//! GET  /staff/new                           - New account form
//! POST /staff/new                           - Create account
//! GET  /staff/{id}/edit                     - Edit account form
//! POST /staff/{id}/edit                     - Save account
//! ```

pub mod auth;
pub mod catalogue;
pub mod categories;
pub mod customers;
pub mod dashboard;
pub mod inventory;
pub mod layout;
pub mod staff;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::middleware::security_headers_middleware;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the catalogue routes router.
///
/// Only the upload route accepts bodies up to `upload_limit_bytes`.
pub fn catalogue_routes(upload_limit_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(catalogue::index))
        .route("/export", get(catalogue::export))
        .route(
            "/upload",
            get(catalogue::upload_page)
                .post(catalogue::upload)
                .layer(DefaultBodyLimit::max(upload_limit_bytes)),
        )
        .route(
            "/products/new",
            get(catalogue::new_page).post(catalogue::create),
        )
        .route(
            "/products/{sku}/edit",
            get(catalogue::edit_page).post(catalogue::update),
        )
        .route("/products/{sku}/delete", post(catalogue::delete))
        .route(
            "/products/{sku}/toggle-hidden",
            post(catalogue::toggle_hidden),
        )
        .route(
            "/categories",
            get(categories::index).post(categories::create),
        )
        .route(
            "/categories/{id}/edit",
            get(categories::edit_page).post(categories::update),
        )
        .route("/categories/merge", post(categories::merge))
        .route("/subcategories", post(categories::create_subcategory))
        .route(
            "/subcategories/{id}/edit",
            get(categories::edit_subcategory_page).post(categories::update_subcategory),
        )
}

/// Create the inventory routes router.
pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(inventory::index))
        .route("/export", get(inventory::export))
        .route("/{sku}", get(inventory::edit_page).post(inventory::update))
}

/// Create the customer directory routes router.
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(customers::index))
        .route("/{id}", get(customers::detail))
}

/// Create the staff administration routes router.
pub fn staff_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(staff::index))
        .route("/new", get(staff::new_page).post(staff::create))
        .route("/{id}/edit", get(staff::edit_page).post(staff::update))
}

/// Create all page routes for the admin panel.
pub fn routes(upload_limit_bytes: usize) -> Router<AppState> {
    Router::new()
        // Dashboard
        .route("/", get(dashboard::index))
        // Health checks
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/auth", auth_routes())
        .nest("/catalogue", catalogue_routes(upload_limit_bytes))
        .nest("/inventory", inventory_routes())
        .nest("/customers", customer_routes())
        .nest("/staff", staff_routes())
}

/// Build the complete application with sessions, static files and headers.
///
/// Sentry layers are added by the binary around this router.
pub fn app<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    let static_dir = state.config().static_dir.clone();
    let upload_limit_bytes = state.config().upload_limit_bytes;

    Router::new()
        .merge(routes(upload_limit_bytes))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use axum::body::Body;
    use axum::http::{Request, header};
    use secrecy::SecretString;
    use shopfront_core::{StaffRole, StaffUserId};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::session::{Id, Record};
    use tower_sessions::{MemoryStore, SessionStore as _};

    use super::*;
    use crate::config::{AdminConfig, DEFAULT_UPLOAD_LIMIT_BYTES};
    use crate::middleware::session_layer_with_store;
    use crate::models::{CurrentStaff, session_keys};

    fn test_app(store: MemoryStore) -> Router {
        let config = AdminConfig {
            database_url: SecretString::from("postgres://localhost/shopfront_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            base_url: "http://localhost:3001".to_string(),
            static_dir: PathBuf::from("static"),
            upload_limit_bytes: DEFAULT_UPLOAD_LIMIT_BYTES,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        // Never connects unless a handler touches the database.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/shopfront_test")
            .unwrap();
        app(
            AppState::new(config, pool),
            session_layer_with_store(store, false),
        )
    }

    /// Store a signed-in session for `role` and return its cookie header.
    async fn signed_in(store: &MemoryStore, role: StaffRole) -> String {
        let staff = CurrentStaff {
            id: StaffUserId::new(1),
            username: "lee".to_string(),
            display_name: "Lee".to_string(),
            role,
        };
        let mut record = Record {
            id: Id::default(),
            data: std::collections::HashMap::from([(
                session_keys::CURRENT_STAFF.to_string(),
                serde_json::to_value(&staff).unwrap(),
            )]),
            expiry_date: tower_sessions::cookie::time::OffsetDateTime::now_utc()
                + tower_sessions::cookie::time::Duration::hours(1),
        };
        store.create(&mut record).await.unwrap();
        format!("{}={}", crate::middleware::session::SESSION_COOKIE_NAME, record.id)
    }

    async fn send(app: Router, uri: &str, cookie: Option<&str>) -> axum::response::Response {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        app.oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_has_security_headers() {
        let response = send(test_app(MemoryStore::default()), "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
        assert_eq!(headers.get("referrer-policy").unwrap(), "no-referrer");
        assert_eq!(headers.get("cache-control").unwrap(), "no-store");
    }

    #[tokio::test]
    async fn test_anonymous_is_sent_to_login() {
        for uri in ["/", "/catalogue", "/inventory/export", "/staff/new"] {
            let response = send(test_app(MemoryStore::default()), uri, None).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(
                response.headers().get(header::LOCATION).unwrap(),
                "/auth/login"
            );
        }
    }

    #[tokio::test]
    async fn test_role_without_permission_is_forbidden() {
        let store = MemoryStore::default();
        let cookie = signed_in(&store, StaffRole::Support).await;
        for uri in ["/catalogue", "/inventory", "/staff"] {
            let response = send(test_app(store.clone()), uri, Some(&cookie)).await;
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_login_page_renders() {
        let response = send(test_app(MemoryStore::default()), "/auth/login", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_static_css_is_served() {
        let response = send(
            test_app(MemoryStore::default()),
            "/static/css/admin.css",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
