//! Product and category recommendations.
//!
//! Two pre-built artefacts back the recommender:
//!
//! - a decision tree predicting a customer's preferred category
//! - an association-rule table keyed by SKU
//!
//! Each is read on first use and kept for the life of the process. A missing
//! or invalid file is logged once and every caller then gets no
//! recommendation; rendering never fails because of the recommender.

pub mod classifier;
pub mod error;
pub mod features;
pub mod rules;
pub mod training;

use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use shopfront_core::Sku;

use crate::config::RecommenderConfig;

pub use classifier::{CategoryClassifier, TreeNode};
pub use error::RecommenderError;
pub use features::CustomerFeatures;
pub use rules::{AssociationRule, RuleMetric, RuleTable};

/// Default number of product suggestions.
pub const DEFAULT_TOP_N: usize = 3;

/// Lazily loaded recommender artefacts.
pub struct Recommender {
    config: RecommenderConfig,
    classifier: OnceCell<Option<Arc<CategoryClassifier>>>,
    rules: OnceCell<Option<Arc<RuleTable>>>,
}

impl Recommender {
    /// Create a recommender that loads from the configured paths on first use.
    #[must_use]
    pub fn new(config: RecommenderConfig) -> Self {
        Self {
            config,
            classifier: OnceCell::new(),
            rules: OnceCell::new(),
        }
    }

    /// Create a recommender with artefacts already in memory.
    #[must_use]
    pub fn preloaded(classifier: Option<CategoryClassifier>, rules: Option<RuleTable>) -> Self {
        Self {
            config: RecommenderConfig::default(),
            classifier: OnceCell::new_with(Some(classifier.map(Arc::new))),
            rules: OnceCell::new_with(Some(rules.map(Arc::new))),
        }
    }

    async fn classifier(&self) -> Option<Arc<CategoryClassifier>> {
        self.classifier
            .get_or_init(|| async {
                load_artefact::<CategoryClassifier>(&self.config.classifier_path)
                    .await
                    .and_then(|model| model.validate().map(|()| model))
                    .map_err(|e| warn!(error = %e, "Preferred-category model unavailable"))
                    .ok()
                    .map(Arc::new)
            })
            .await
            .clone()
    }

    async fn rules(&self) -> Option<Arc<RuleTable>> {
        self.rules
            .get_or_init(|| async {
                load_artefact::<RuleTable>(&self.config.rules_path)
                    .await
                    .map_err(|e| warn!(error = %e, "Association rules unavailable"))
                    .ok()
                    .map(Arc::new)
            })
            .await
            .clone()
    }

    /// Predict a customer's preferred category label.
    pub async fn predict_preferred_category(&self, features: &CustomerFeatures) -> Option<String> {
        let model = self.classifier().await?;
        let label = model.predict(features).map(ToString::to_string);
        debug!(category = ?label, "Predicted preferred category");
        label
    }

    /// SKUs frequently bought with `items`. Empty when rules are unavailable.
    pub async fn get_recommendations(
        &self,
        items: &[Sku],
        metric: RuleMetric,
        top_n: usize,
    ) -> Vec<Sku> {
        if items.is_empty() {
            return Vec::new();
        }
        match self.rules().await {
            Some(table) => table.recommend(items, metric, top_n),
            None => Vec::new(),
        }
    }
}

async fn load_artefact<T: DeserializeOwned>(path: &Path) -> Result<T, RecommenderError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| RecommenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_slice(&bytes).map_err(|source| RecommenderError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn sku(s: &str) -> Sku {
        Sku::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_missing_artefacts_degrade_to_nothing() {
        let recommender = Recommender::new(RecommenderConfig {
            classifier_path: PathBuf::from("/nonexistent/model.json"),
            rules_path: PathBuf::from("/nonexistent/rules.json"),
        });
        assert!(recommender
            .get_recommendations(&[sku("A")], RuleMetric::Confidence, 3)
            .await
            .is_empty());
        let features = CustomerFeatures {
            age: 30,
            household_size: 1,
            has_children: false,
            monthly_income_sgd: 0.0,
            gender: "Male".to_string(),
            employment_status: "Student".to_string(),
            occupation: String::new(),
            education: "Secondary".to_string(),
        };
        assert_eq!(recommender.predict_preferred_category(&features).await, None);
    }

    #[tokio::test]
    async fn test_preloaded_rules() {
        let table = RuleTable::new(vec![AssociationRule {
            antecedents: vec![sku("A")],
            consequents: vec![sku("B")],
            support: 0.1,
            confidence: 0.5,
            lift: 2.0,
        }]);
        let recommender = Recommender::preloaded(None, Some(table));
        assert_eq!(
            recommender
                .get_recommendations(&[sku("A")], RuleMetric::default(), DEFAULT_TOP_N)
                .await,
            vec![sku("B")]
        );
    }
}
