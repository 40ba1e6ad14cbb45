//! Recommender training commands.
//!
//! # Usage
//!
//! ```bash
//! # Preferred-category decision tree from labelled customers
//! shopfront-cli train classifier --max-depth 10
//!
//! # Product association rules from a one-hot basket file
//! shopfront-cli train rules data/transactions.csv --min-support 0.01
//! ```
//!
//! Both write the JSON artefacts the storefront loads on first use.

use std::path::Path;

use shopfront_admin::services::import::decode_lossy;
use shopfront_storefront::db::customers::CustomerRepository;
use shopfront_storefront::recommender::training::{
    RuleOptions, TreeOptions, mine_rules, parse_baskets, train_classifier,
};

use crate::commands::{connect, read_file, write_file};
use crate::error::CliError;

/// Default output for `train classifier`.
pub const DEFAULT_CLASSIFIER_PATH: &str = "models/preferred_category.json";

/// Default output for `train rules`.
pub const DEFAULT_RULES_PATH: &str = "models/association_rules.json";

/// Fit the preferred-category model on customers with a recorded category.
pub async fn classifier(out: &Path, max_depth: usize) -> Result<(), CliError> {
    let pool = connect().await?;
    let customers = CustomerRepository::new(&pool).list_labelled().await?;
    let samples: Vec<_> = customers
        .iter()
        .filter_map(|c| {
            c.preferred_category()
                .map(|label| (c.features(), label.to_string()))
        })
        .collect();
    tracing::info!("Training on {} labelled customers", samples.len());

    let options = TreeOptions {
        max_depth,
        ..TreeOptions::default()
    };
    let (model, report) = train_classifier(&samples, &options)?;

    match report.accuracy {
        Some(accuracy) => tracing::info!(
            train = report.train_size,
            test = report.test_size,
            "Test accuracy: {:.2}%",
            accuracy * 100.0
        ),
        None => tracing::warn!(
            train = report.train_size,
            "Too few customers per category to hold out a test set"
        ),
    }

    write_file(out, &serde_json::to_vec_pretty(&model)?).await?;
    tracing::info!(
        classes = model.classes.len(),
        "Model written to {}",
        out.display()
    );
    Ok(())
}

/// Mine pair rules from a transactions file.
pub async fn rules(
    path: &Path,
    out: &Path,
    min_support: f64,
    min_confidence: f64,
) -> Result<(), CliError> {
    let (text, lossy) = decode_lossy(&read_file(path).await?);
    if lossy {
        tracing::warn!(path = %path.display(), "File is not valid UTF-8; undecodable bytes were replaced");
    }

    let file = parse_baskets(&text)?;
    tracing::info!(
        "Mining {} baskets over {} products",
        file.baskets.len(),
        file.items.len()
    );

    let options = RuleOptions {
        min_support,
        min_confidence,
    };
    let table = mine_rules(&file.items, &file.baskets, &options)?;
    if table.is_empty() {
        tracing::warn!("No rules met the support and confidence thresholds");
    }

    write_file(out, &serde_json::to_vec_pretty(&table)?).await?;
    tracing::info!("{} rules written to {}", table.len(), out.display());
    Ok(())
}
