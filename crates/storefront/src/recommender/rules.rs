//! Association rules ("customers who bought X also bought Y").

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use shopfront_core::Sku;

/// One mined rule `antecedents => consequents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationRule {
    pub antecedents: Vec<Sku>,
    pub consequents: Vec<Sku>,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
}

impl AssociationRule {
    #[must_use]
    pub const fn score(&self, metric: RuleMetric) -> f64 {
        match metric {
            RuleMetric::Support => self.support,
            RuleMetric::Confidence => self.confidence,
            RuleMetric::Lift => self.lift,
        }
    }
}

/// Which rule strength to rank by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleMetric {
    Support,
    #[default]
    Confidence,
    Lift,
}

impl fmt::Display for RuleMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Support => "support",
            Self::Confidence => "confidence",
            Self::Lift => "lift",
        })
    }
}

impl FromStr for RuleMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "support" => Ok(Self::Support),
            "confidence" => Ok(Self::Confidence),
            "lift" => Ok(Self::Lift),
            other => Err(format!("unknown metric '{other}'")),
        }
    }
}

/// The full rule table as stored on disk (a JSON array).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleTable {
    pub rules: Vec<AssociationRule>,
}

impl RuleTable {
    #[must_use]
    pub const fn new(rules: Vec<AssociationRule>) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Products to suggest alongside `items`.
    ///
    /// For each item, the `top_n` strongest rules (by `metric`) whose
    /// antecedents contain it contribute their consequents. Suggestions keep
    /// the order they were found in, skip duplicates and anything already in
    /// `items`, and stop at `top_n`.
    #[must_use]
    pub fn recommend(&self, items: &[Sku], metric: RuleMetric, top_n: usize) -> Vec<Sku> {
        let mut found: Vec<&Sku> = Vec::new();

        for item in items {
            let mut matched: Vec<&AssociationRule> = self
                .rules
                .iter()
                .filter(|rule| rule.antecedents.contains(item))
                .collect();
            matched.sort_by(|a, b| descending(a.score(metric), b.score(metric)));

            for rule in matched.into_iter().take(top_n) {
                for sku in &rule.consequents {
                    if !found.contains(&sku) {
                        found.push(sku);
                    }
                }
            }
        }

        found
            .into_iter()
            .filter(|sku| !items.contains(*sku))
            .take(top_n)
            .cloned()
            .collect()
    }
}

fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sku(s: &str) -> Sku {
        Sku::parse(s).unwrap()
    }

    fn rule(a: &str, c: &[&str], support: f64, confidence: f64, lift: f64) -> AssociationRule {
        AssociationRule {
            antecedents: vec![sku(a)],
            consequents: c.iter().map(|s| sku(s)).collect(),
            support,
            confidence,
            lift,
        }
    }

    fn table() -> RuleTable {
        RuleTable::new(vec![
            rule("A", &["B"], 0.05, 0.40, 1.2),
            rule("A", &["C"], 0.02, 0.90, 3.0),
            rule("A", &["D"], 0.09, 0.10, 0.8),
            rule("A", &["E"], 0.01, 0.20, 5.0),
            rule("B", &["A", "F"], 0.03, 0.70, 2.0),
        ])
    }

    #[test]
    fn test_ranked_by_confidence_by_default() {
        let recs = table().recommend(&[sku("A")], RuleMetric::default(), 3);
        assert_eq!(recs, vec![sku("C"), sku("B"), sku("E")]);
    }

    #[test]
    fn test_ranked_by_lift() {
        let recs = table().recommend(&[sku("A")], RuleMetric::Lift, 2);
        assert_eq!(recs, vec![sku("E"), sku("C")]);
    }

    #[test]
    fn test_inputs_excluded_and_deduplicated() {
        let recs = table().recommend(&[sku("B"), sku("A")], RuleMetric::Confidence, 3);
        assert_eq!(recs, vec![sku("F"), sku("C"), sku("E")]);
    }

    #[test]
    fn test_unknown_item_has_no_recommendations() {
        assert!(table().recommend(&[sku("Z")], RuleMetric::Support, 3).is_empty());
    }

    #[test]
    fn test_table_is_json_array() {
        let json = r#"[{"antecedents":["A"],"consequents":["B"],"support":0.1,"confidence":0.5,"lift":1.5}]"#;
        let table: RuleTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rules[0].consequents, vec![sku("B")]);
    }

    #[test]
    fn test_metric_parse() {
        assert_eq!("LIFT".parse::<RuleMetric>().unwrap(), RuleMetric::Lift);
        assert!("votes".parse::<RuleMetric>().is_err());
    }
}
