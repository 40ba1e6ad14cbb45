//! Business logic for the admin panel.
//!
//! # Services
//!
//! - `auth` - username and password sign-in, account creation
//! - `bootstrap` - default superuser from the environment
//! - `catalogue` - product, stock and category forms
//! - `export` - catalogue and inventory CSV downloads
//! - `import` - CSV uploads and CLI imports
//! - `staff` - staff account forms

pub mod auth;
pub mod bootstrap;
pub mod catalogue;
pub mod export;
pub mod import;
pub mod staff;

use std::collections::BTreeMap;

pub use auth::{AuthError, AuthService};

/// Form validation messages keyed by field name.
pub type FieldErrors = BTreeMap<&'static str, String>;
