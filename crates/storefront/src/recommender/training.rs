//! Offline training for the recommender artefacts.
//!
//! The classifier is a CART decision tree (Gini impurity) fitted on a
//! stratified, seeded split. Association rules are mined over single-item
//! pairs, which is all the storefront consults.

// Dense index arithmetic over small in-memory training matrices.
#![allow(clippy::indexing_slicing, clippy::cast_precision_loss)]

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use shopfront_core::Sku;

use super::classifier::{CategoryClassifier, TreeNode};
use super::error::RecommenderError;
use super::features::{CustomerFeatures, standard_columns};
use super::rules::{AssociationRule, RuleTable};

/// Decision tree fitting options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeOptions {
    pub max_depth: usize,
    pub min_samples_split: usize,
    /// Percentage of each class held out for evaluation.
    pub test_percent: usize,
    pub seed: u64,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 2,
            test_percent: 20,
            seed: 42,
        }
    }
}

/// Outcome of a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub train_size: usize,
    pub test_size: usize,
    /// Share of held-out samples predicted correctly; `None` with no test set.
    pub accuracy: Option<f64>,
}

/// Fit the preferred-category tree on labelled customers.
///
/// # Errors
///
/// Returns `RecommenderError::InsufficientData` when `samples` is empty.
pub fn train_classifier(
    samples: &[(CustomerFeatures, String)],
    options: &TreeOptions,
) -> Result<(CategoryClassifier, TrainingReport), RecommenderError> {
    if samples.is_empty() {
        return Err(RecommenderError::InsufficientData(
            "no customers with a preferred category".to_string(),
        ));
    }

    let columns = standard_columns();
    let classes: Vec<String> = samples
        .iter()
        .map(|(_, label)| label.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let class_index: HashMap<&str, usize> = classes
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();

    let x: Vec<Vec<f64>> = samples.iter().map(|(f, _)| f.encode(&columns)).collect();
    let y: Vec<usize> = samples
        .iter()
        .map(|(_, label)| class_index.get(label.as_str()).copied().unwrap_or(0))
        .collect();

    let (train, test) = stratified_split(&y, options.test_percent, options.seed);

    let fitter = TreeFitter {
        x: &x,
        y: &y,
        n_classes: classes.len(),
        options,
    };
    let root = fitter.build(train.clone(), 0);
    let model = CategoryClassifier {
        columns,
        classes,
        root,
    };

    let accuracy = if test.is_empty() {
        None
    } else {
        let correct = test
            .iter()
            .filter(|&&i| model.predict_encoded(&x[i]) == Some(model.classes[y[i]].as_str()))
            .count();
        Some(correct as f64 / test.len() as f64)
    };

    let report = TrainingReport {
        train_size: train.len(),
        test_size: test.len(),
        accuracy,
    };
    Ok((model, report))
}

/// Split indices per class, holding out `test_percent` of each (rounded).
/// A class with a single sample stays in training.
fn stratified_split(y: &[usize], test_percent: usize, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, &class) in y.iter().enumerate() {
        by_class.entry(class).or_default().push(i);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(y.len());
    let mut test = Vec::new();

    for mut members in by_class.into_values() {
        members.shuffle(&mut rng);
        let n_test = if members.len() < 2 {
            0
        } else {
            ((members.len() * test_percent + 50) / 100).min(members.len() - 1)
        };
        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

struct TreeFitter<'a> {
    x: &'a [Vec<f64>],
    y: &'a [usize],
    n_classes: usize,
    options: &'a TreeOptions,
}

struct Split {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl TreeFitter<'_> {
    fn counts(&self, rows: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &i in rows {
            counts[self.y[i]] += 1;
        }
        counts
    }

    fn build(&self, rows: Vec<usize>, depth: usize) -> TreeNode {
        let counts = self.counts(&rows);
        let majority = majority(&counts);
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;

        if pure || depth >= self.options.max_depth || rows.len() < self.options.min_samples_split
        {
            return TreeNode::Leaf { class: majority };
        }

        let parent = gini(&counts, rows.len());
        let Some(split) = self.best_split(&rows).filter(|s| s.impurity < parent) else {
            return TreeNode::Leaf { class: majority };
        };

        let (left, right): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&i| self.x[i][split.feature] <= split.threshold);

        TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(self.build(left, depth + 1)),
            right: Box::new(self.build(right, depth + 1)),
        }
    }

    fn best_split(&self, rows: &[usize]) -> Option<Split> {
        let n_features = self.x.first().map_or(0, Vec::len);
        let total = self.counts(rows);
        let n = rows.len();
        let mut best: Option<Split> = None;

        for feature in 0..n_features {
            let mut sorted = rows.to_vec();
            sorted.sort_by(|&a, &b| self.x[a][feature].total_cmp(&self.x[b][feature]));

            let mut left = vec![0; self.n_classes];
            for pos in 1..n {
                left[self.y[sorted[pos - 1]]] += 1;
                let lo = self.x[sorted[pos - 1]][feature];
                let hi = self.x[sorted[pos]][feature];
                if lo >= hi {
                    continue;
                }

                let right: Vec<usize> = total.iter().zip(&left).map(|(t, l)| t - l).collect();
                let impurity = (pos as f64 * gini(&left, pos)
                    + (n - pos) as f64 * gini(&right, n - pos))
                    / n as f64;

                if best.as_ref().is_none_or(|b| impurity < b.impurity) {
                    best = Some(Split {
                        feature,
                        threshold: lo + (hi - lo) / 2.0,
                        impurity,
                    });
                }
            }
        }

        best
    }
}

fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

/// Most frequent class; ties go to the lowest index.
fn majority(counts: &[usize]) -> usize {
    counts
        .iter()
        .enumerate()
        .fold((0, 0), |(best, best_count), (i, &c)| {
            if c > best_count { (i, c) } else { (best, best_count) }
        })
        .0
}

/// Rule mining thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleOptions {
    pub min_support: f64,
    pub min_confidence: f64,
}

impl Default for RuleOptions {
    fn default() -> Self {
        Self {
            min_support: 0.01,
            min_confidence: 0.1,
        }
    }
}

/// Mine `A => B` rules from baskets of column indices into `items`.
///
/// Rules are sorted by confidence, then support, descending.
///
/// # Errors
///
/// Returns `RecommenderError::InsufficientData` when there are no baskets.
pub fn mine_rules(
    items: &[Sku],
    baskets: &[BTreeSet<usize>],
    options: &RuleOptions,
) -> Result<RuleTable, RecommenderError> {
    if baskets.is_empty() {
        return Err(RecommenderError::InsufficientData(
            "no transactions".to_string(),
        ));
    }

    let mut singles = vec![0_usize; items.len()];
    let mut pairs: HashMap<(usize, usize), usize> = HashMap::new();

    for basket in baskets {
        let present: Vec<usize> = basket.iter().copied().filter(|&i| i < items.len()).collect();
        for (pos, &a) in present.iter().enumerate() {
            singles[a] += 1;
            for &b in &present[pos + 1..] {
                *pairs.entry((a, b)).or_insert(0) += 1;
            }
        }
    }

    let n = baskets.len() as f64;
    let mut rules = Vec::new();

    for (&(a, b), &together) in &pairs {
        let support = together as f64 / n;
        if support < options.min_support {
            continue;
        }
        for (from, to) in [(a, b), (b, a)] {
            let confidence = together as f64 / singles[from] as f64;
            if confidence < options.min_confidence {
                continue;
            }
            let lift = confidence / (singles[to] as f64 / n);
            rules.push(AssociationRule {
                antecedents: vec![items[from].clone()],
                consequents: vec![items[to].clone()],
                support,
                confidence,
                lift,
            });
        }
    }

    rules.sort_by(|x, y| {
        y.confidence
            .total_cmp(&x.confidence)
            .then(y.support.total_cmp(&x.support))
            .then_with(|| x.antecedents.cmp(&y.antecedents))
            .then_with(|| x.consequents.cmp(&y.consequents))
    });

    Ok(RuleTable::new(rules))
}

/// Items and baskets read from a one-hot transactions file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BasketFile {
    pub items: Vec<Sku>,
    /// Indices into `items`, one set per data row.
    pub baskets: Vec<BTreeSet<usize>>,
}

/// Read a transactions file.
///
/// Each header column names a SKU and each row is a basket; a cell that
/// parses to a number above 0 puts that SKU in the basket. Columns whose
/// header is not a SKU are ignored and a repeated SKU shares one item.
///
/// # Errors
///
/// Returns `RecommenderError::Csv` if the file cannot be read, or
/// `RecommenderError::InsufficientData` when no header names a SKU.
pub fn parse_baskets(text: &str) -> Result<BasketFile, RecommenderError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut items: Vec<Sku> = Vec::new();
    let mut column_items: Vec<Option<usize>> = Vec::new();
    for cell in reader.headers()? {
        let Ok(sku) = Sku::parse(cell) else {
            column_items.push(None);
            continue;
        };
        let existing = items.iter().position(|s| *s == sku);
        let item = existing.unwrap_or_else(|| {
            items.push(sku);
            items.len() - 1
        });
        column_items.push(Some(item));
    }
    if items.is_empty() {
        return Err(RecommenderError::InsufficientData(
            "no SKU columns in header".to_string(),
        ));
    }

    let mut baskets = Vec::new();
    for record in reader.records() {
        let record = record?;
        let basket = record
            .iter()
            .zip(&column_items)
            .filter_map(|(cell, item)| {
                let bought = cell.trim().parse::<f64>().is_ok_and(|v| v > 0.0);
                item.filter(|_| bought)
            })
            .collect();
        baskets.push(basket);
    }

    Ok(BasketFile { items, baskets })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn customer(age: i32, gender: &str) -> CustomerFeatures {
        CustomerFeatures {
            age,
            household_size: 2,
            has_children: false,
            monthly_income_sgd: 4000.0,
            gender: gender.to_string(),
            employment_status: "Full-time".to_string(),
            occupation: "Tech".to_string(),
            education: "Bachelor".to_string(),
        }
    }

    #[test]
    fn test_tree_separates_by_age() {
        let mut samples = Vec::new();
        for age in 18..28 {
            samples.push((customer(age, "Male"), "Toys & Games".to_string()));
        }
        for age in 50..60 {
            samples.push((customer(age, "Female"), "Health".to_string()));
        }

        let (model, report) = train_classifier(&samples, &TreeOptions::default()).unwrap();
        model.validate().unwrap();
        assert_eq!(model.classes, vec!["Health", "Toys & Games"]);
        assert_eq!(report.train_size + report.test_size, 20);
        assert_eq!(report.test_size, 4);
        assert_eq!(report.accuracy, Some(1.0));
        assert_eq!(model.predict(&customer(21, "Male")), Some("Toys & Games"));
        assert_eq!(model.predict(&customer(57, "Female")), Some("Health"));
    }

    #[test]
    fn test_split_is_seeded() {
        let y = vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1];
        let first = stratified_split(&y, 20, 42);
        assert_eq!(first, stratified_split(&y, 20, 42));
        assert_eq!(first.1.len(), 3);
    }

    #[test]
    fn test_max_depth_zero_is_majority_leaf() {
        let samples = vec![
            (customer(20, "Male"), "Books".to_string()),
            (customer(30, "Male"), "Books".to_string()),
            (customer(40, "Male"), "Health".to_string()),
        ];
        let options = TreeOptions {
            max_depth: 0,
            ..TreeOptions::default()
        };
        let (model, _) = train_classifier(&samples, &options).unwrap();
        assert_eq!(model.root, TreeNode::Leaf { class: 0 });
    }

    #[test]
    fn test_empty_training_set() {
        assert!(matches!(
            train_classifier(&[], &TreeOptions::default()),
            Err(RecommenderError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_mine_pair_rules() {
        let items: Vec<Sku> = ["A", "B", "C"].iter().map(|s| Sku::parse(s).unwrap()).collect();
        let baskets: Vec<BTreeSet<usize>> = vec![
            [0, 1].into_iter().collect(),
            [0, 1].into_iter().collect(),
            [0, 2].into_iter().collect(),
            [1].into_iter().collect(),
        ];
        let options = RuleOptions {
            min_support: 0.3,
            min_confidence: 0.5,
        };
        let table = mine_rules(&items, &baskets, &options).unwrap();

        // A,B together in 2 of 4 baskets; A in 3, B in 3.
        assert_eq!(table.len(), 2);
        let rule = &table.rules[0];
        assert!((rule.support - 0.5).abs() < 1e-9);
        assert!((rule.confidence - 2.0 / 3.0).abs() < 1e-9);
        assert!((rule.lift - (2.0 / 3.0) / 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_parse_baskets_reads_one_hot_rows() {
        let file = parse_baskets("A,B, ,A\n1,0,x,0\n0,2.5,,1\n0,0,0,0\n").unwrap();
        let items: Vec<&str> = file.items.iter().map(Sku::as_str).collect();
        assert_eq!(items, vec!["A", "B"]);
        let expected: Vec<BTreeSet<usize>> = vec![
            [0].into_iter().collect(),
            [0, 1].into_iter().collect(),
            BTreeSet::new(),
        ];
        assert_eq!(file.baskets, expected);
    }

    #[test]
    fn test_parse_baskets_needs_a_sku_column() {
        assert!(matches!(
            parse_baskets(""),
            Err(RecommenderError::InsufficientData(_))
        ));
    }
}
