//! Decision-tree classifier for a customer's preferred category.
//!
//! Serialized as
//! `{"columns": [...], "classes": [...], "root": <node>}` where a node is
//! `{"leaf": {"class": i}}` or
//! `{"split": {"feature": i, "threshold": t, "left": <node>, "right": <node>}}`.
//! A sample goes left when `x[feature] <= threshold`.

use serde::{Deserialize, Serialize};

use super::error::RecommenderError;
use super::features::CustomerFeatures;

/// One node of the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    Leaf {
        class: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn classify(&self, sample: &[f64]) -> usize {
        let mut node = self;
        loop {
            match node {
                Self::Leaf { class } => return *class,
                Self::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let x = sample.get(*feature).copied().unwrap_or(0.0);
                    node = if x <= *threshold { &**left } else { &**right };
                }
            }
        }
    }

    fn check(&self, columns: usize, classes: usize) -> Result<(), RecommenderError> {
        match self {
            Self::Leaf { class } if *class >= classes => Err(RecommenderError::InvalidModel(
                format!("leaf class {class} out of range"),
            )),
            Self::Leaf { .. } => Ok(()),
            Self::Split { feature, .. } if *feature >= columns => Err(
                RecommenderError::InvalidModel(format!("split feature {feature} out of range")),
            ),
            Self::Split { left, right, .. } => {
                left.check(columns, classes)?;
                right.check(columns, classes)
            }
        }
    }
}

/// A trained preferred-category model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryClassifier {
    /// Feature columns the tree indexes into.
    pub columns: Vec<String>,
    /// Category labels the leaves index into.
    pub classes: Vec<String>,
    pub root: TreeNode,
}

impl CategoryClassifier {
    /// Confirm every index in the tree is in range.
    ///
    /// # Errors
    ///
    /// Returns `RecommenderError::InvalidModel` naming the first bad index.
    pub fn validate(&self) -> Result<(), RecommenderError> {
        if self.classes.is_empty() {
            return Err(RecommenderError::InvalidModel("no classes".to_string()));
        }
        self.root.check(self.columns.len(), self.classes.len())
    }

    /// Predict the category label for an encoded sample aligned to `columns`.
    #[must_use]
    pub fn predict_encoded(&self, sample: &[f64]) -> Option<&str> {
        self.classes
            .get(self.root.classify(sample))
            .map(String::as_str)
    }

    /// Predict the category label for a customer.
    #[must_use]
    pub fn predict(&self, features: &CustomerFeatures) -> Option<&str> {
        self.predict_encoded(&features.encode(&self.columns))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const MODEL: &str = r#"{
        "columns": ["age", "gender_Female"],
        "classes": ["Books", "Health", "Toys & Games"],
        "root": {"split": {
            "feature": 0, "threshold": 30.5,
            "left": {"split": {
                "feature": 1, "threshold": 0.5,
                "left": {"leaf": {"class": 2}},
                "right": {"leaf": {"class": 1}}
            }},
            "right": {"leaf": {"class": 0}}
        }}
    }"#;

    fn features(age: i32, gender: &str) -> CustomerFeatures {
        CustomerFeatures {
            age,
            household_size: 1,
            has_children: false,
            monthly_income_sgd: 3000.0,
            gender: gender.to_string(),
            employment_status: "Student".to_string(),
            occupation: String::new(),
            education: "Diploma".to_string(),
        }
    }

    #[test]
    fn test_predict_walks_tree() {
        let model: CategoryClassifier = serde_json::from_str(MODEL).unwrap();
        model.validate().unwrap();
        assert_eq!(model.predict(&features(22, "Female")), Some("Health"));
        assert_eq!(model.predict(&features(22, "Male")), Some("Toys & Games"));
        assert_eq!(model.predict(&features(45, "Female")), Some("Books"));
    }

    #[test]
    fn test_threshold_is_inclusive_left() {
        let model: CategoryClassifier = serde_json::from_str(MODEL).unwrap();
        assert_eq!(model.predict_encoded(&[30.5, 0.0]), Some("Toys & Games"));
    }

    #[test]
    fn test_validate_rejects_bad_index() {
        let mut model: CategoryClassifier = serde_json::from_str(MODEL).unwrap();
        model.classes.truncate(1);
        assert!(matches!(
            model.validate(),
            Err(RecommenderError::InvalidModel(_))
        ));
    }
}
