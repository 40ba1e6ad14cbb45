//! CSV import commands.
//!
//! # Usage
//!
//! ```bash
//! shopfront-cli import customers data/customers.csv
//! shopfront-cli import products data/products.csv
//! shopfront-cli import transactions data/transactions.csv
//! ```
//!
//! Each import runs in one transaction: a failed insert leaves the database
//! as it was.

use std::path::Path;

use shopfront_admin::db::products::UpsertOptions;
use shopfront_admin::db::{CustomerRepository, ProductRepository};
use shopfront_admin::services::import::customers::parse_customer_file;
use shopfront_admin::services::import::products::parse_product_file;
use shopfront_admin::services::import::transactions::{header_skus, seed_products};

use crate::commands::{connect, read_file};
use crate::error::CliError;

/// Insert every row of a customer demographics file.
pub async fn customers(path: &Path) -> Result<(), CliError> {
    let file = parse_customer_file(&read_file(path).await?)?;
    if file.lossy {
        tracing::warn!(path = %path.display(), "File is not valid UTF-8; undecodable bytes were replaced");
    }

    let pool = connect().await?;
    let inserted = CustomerRepository::new(&pool)
        .insert_many(&file.customers)
        .await?;
    tracing::info!("Inserted {inserted} customers");
    Ok(())
}

/// Create or update products by SKU.
pub async fn products(path: &Path) -> Result<(), CliError> {
    let file = parse_product_file(&read_file(path).await?)?;
    if file.lossy {
        tracing::warn!(path = %path.display(), "File is not valid UTF-8; undecodable bytes were replaced");
    }
    for line in &file.skipped_lines {
        tracing::warn!(line, "Skipping row without a SKU or with a value that does not fit");
    }

    let pool = connect().await?;
    let report = ProductRepository::new(&pool)
        .upsert_many(
            &file.rows,
            UpsertOptions {
                update_existing: true,
                blank_description: "",
            },
        )
        .await?;
    tracing::info!("Created: {}, Updated: {}", report.created, report.updated);
    Ok(())
}

/// Create a placeholder product for every header SKU not in the catalogue.
pub async fn transactions(path: &Path) -> Result<(), CliError> {
    let skus = header_skus(&read_file(path).await?)?;
    let rows = seed_products(&skus, &mut rand::rng());

    let pool = connect().await?;
    let created = ProductRepository::new(&pool).create_missing(&rows).await?;
    tracing::info!(
        "Created {created} products ({} already existed)",
        skus.len().saturating_sub(created)
    );
    Ok(())
}
