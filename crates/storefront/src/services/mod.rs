//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Account registration and password login
//! - `cart` - Guest and signed-in cart operations, merge on login
//! - `checkout` - Checkout validation and order placement
//! - `profile` - Profile form validation

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod profile;
