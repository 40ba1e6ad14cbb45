//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction per route)
//! 2. `TraceLayer` (request tracing)
//! 3. Security headers (no framing, no caching)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! Authentication and role checks are extractors, applied per handler.

pub mod auth;
pub mod flash;
pub mod security_headers;
pub mod session;

pub use auth::{
    CanManageCatalogue, CanManageCustomers, CanManageInventory, CanManageStaff, OptionalStaff,
    RequirePermission, RequireStaff, clear_current_staff, set_current_staff,
};
pub use flash::{push_flash, take_flash};
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, session_layer_with_store};
