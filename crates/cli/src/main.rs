//! Shopfront CLI - migrations, staff accounts, imports and model training.
//!
//! # Usage
//!
//! ```bash
//! # Apply migrations and bootstrap the first Admin
//! shopfront-cli migrate
//!
//! # Create a staff account
//! shopfront-cli staff create -u lee -e lee@example.com -r manager
//!
//! # Load data
//! shopfront-cli import customers data/customers.csv
//! shopfront-cli import products data/products.csv
//! shopfront-cli import transactions data/transactions.csv
//!
//! # Train the recommender
//! shopfront-cli train classifier
//! shopfront-cli train rules data/transactions.csv
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `SHOPFRONT_SUPERUSER_USERNAME`, `SHOPFRONT_SUPERUSER_EMAIL`,
//!   `SHOPFRONT_SUPERUSER_PASSWORD` - default Admin for the bootstrap
//! - `SHOPFRONT_STAFF_PASSWORD` - password for `staff create`
//! - `RUST_LOG` - log filter (default: info)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;

use commands::train::{DEFAULT_CLASSIFIER_PATH, DEFAULT_RULES_PATH};
use error::CliError;

#[derive(Parser)]
#[command(name = "shopfront-cli")]
#[command(author, version, about = "Shopfront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply database migrations, then bootstrap the default Admin
    Migrate,
    /// Manage staff accounts
    Staff {
        #[command(subcommand)]
        action: StaffAction,
    },
    /// Import CSV data
    Import {
        #[command(subcommand)]
        source: ImportSource,
    },
    /// Train recommender models
    Train {
        #[command(subcommand)]
        model: TrainModel,
    },
}

#[derive(Subcommand)]
enum StaffAction {
    /// Create a staff account
    Create(commands::staff::CreateArgs),
    /// Create the default Admin from `SHOPFRONT_SUPERUSER_*` if none exists
    Bootstrap,
}

#[derive(Subcommand)]
enum ImportSource {
    /// Customer demographics
    Customers { path: PathBuf },
    /// Products, upserted by SKU
    Products { path: PathBuf },
    /// Products named by a transactions file header
    Transactions { path: PathBuf },
}

#[derive(Subcommand)]
enum TrainModel {
    /// Preferred-category decision tree
    Classifier {
        #[arg(long, default_value = DEFAULT_CLASSIFIER_PATH)]
        out: PathBuf,

        #[arg(long, default_value_t = 10)]
        max_depth: usize,
    },
    /// Product association rules
    Rules {
        path: PathBuf,

        #[arg(long, default_value = DEFAULT_RULES_PATH)]
        out: PathBuf,

        #[arg(long, default_value_t = 0.01)]
        min_support: f64,

        #[arg(long, default_value_t = 0.1)]
        min_confidence: f64,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Staff { action } => match action {
            StaffAction::Create(args) => commands::staff::create(&args).await?,
            StaffAction::Bootstrap => commands::staff::bootstrap().await?,
        },
        Commands::Import { source } => match source {
            ImportSource::Customers { path } => commands::import::customers(&path).await?,
            ImportSource::Products { path } => commands::import::products(&path).await?,
            ImportSource::Transactions { path } => commands::import::transactions(&path).await?,
        },
        Commands::Train { model } => match model {
            TrainModel::Classifier { out, max_depth } => {
                commands::train::classifier(&out, max_depth).await?;
            }
            TrainModel::Rules {
                path,
                out,
                min_support,
                min_confidence,
            } => commands::train::rules(&path, &out, min_support, min_confidence).await?,
        },
    }
    Ok(())
}
