//! Shopfront storefront library.
//!
//! The public shop: catalogue browsing, guest and signed-in carts, checkout,
//! order history and recommendations. Built as a library so the router can
//! be exercised in tests and the CLI can reuse the recommender trainer.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod recommender;
pub mod routes;
pub mod services;
pub mod state;
