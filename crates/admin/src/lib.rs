//! Shopfront admin library.
//!
//! The staff panel: dashboard KPIs, catalogue and taxonomy management, bulk
//! CSV upload, stock levels, the customer directory and staff accounts.
//! Built as a library so the router can be exercised in tests and the CLI
//! can reuse the importers and the superuser bootstrap.
//!
//! # Security
//!
//! Every page except sign-in requires a staff session; each section also
//! checks the role's permission. Responses are never cached.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
