//! Core types for Shopfront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod demographics;
pub mod email;
pub mod id;
pub mod pagination;
pub mod price;
pub mod role;
pub mod sku;
pub mod slug;
pub mod status;

pub use demographics::{EmploymentStatus, Education, Gender};
pub use email::{Email, EmailError};
pub use id::*;
pub use pagination::Paginator;
pub use price::Price;
pub use role::{Permission, StaffRole};
pub use sku::{Sku, SkuError};
pub use slug::category_slug;
pub use status::*;
