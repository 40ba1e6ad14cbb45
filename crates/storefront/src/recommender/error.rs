//! Recommender error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors loading or validating a recommender artefact.
#[derive(Debug, Error)]
pub enum RecommenderError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The file parsed but refers to columns or classes it does not define.
    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("cannot read transactions: {0}")]
    Csv(#[from] csv::Error),

    /// Training input is empty or has nothing to learn from.
    #[error("not enough data: {0}")]
    InsufficientData(String),
}
