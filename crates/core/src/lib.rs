//! Shopfront Core - Shared domain types.
//!
//! This crate provides the types used across all Shopfront components:
//! - `storefront` - Public shop: catalogue, cart, checkout, recommendations
//! - `admin` - Staff panel: catalogue, inventory, customers, staff roles
//! - `cli` - Migrations, CSV imports, and recommender training
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Database encoding is available behind the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - IDs, SKUs, prices, emails, statuses, roles, demographics, paging

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
