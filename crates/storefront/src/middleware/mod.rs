//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction per route)
//! 2. `TraceLayer` (request tracing)
//! 3. Security headers
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//! 5. Rate limiting on auth and cart posts (governor)

pub mod auth;
pub mod flash;
pub mod rate_limit;
pub mod security_headers;
pub mod session;

pub use auth::{
    OptionalAuth, RequireAuth, clear_current_user, login_url, safe_next, set_current_user,
};
pub use flash::{push_flash, take_flash};
pub use rate_limit::{auth_rate_limiter, cart_rate_limiter};
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, session_layer_with_store};
