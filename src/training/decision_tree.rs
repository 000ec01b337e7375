//! Binary decision tree classifier

use crate::error::{BankTreeError, Result};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Decision tree node. `counts` holds `[negative, positive]` training samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node
    Leaf { counts: [usize; 2] },
    /// Internal node; samples with `x[feature_idx] <= threshold` go left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        counts: [usize; 2],
        impurity: f64,
    },
}

impl TreeNode {
    pub fn counts(&self) -> [usize; 2] {
        match self {
            TreeNode::Leaf { counts } | TreeNode::Split { counts, .. } => *counts,
        }
    }

    pub fn n_samples(&self) -> usize {
        let [n, p] = self.counts();
        n + p
    }

    /// Majority class, ties going to the negative class
    pub fn class(&self) -> bool {
        let [n, p] = self.counts();
        p > n
    }
}

/// Impurity criterion
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Criterion {
    /// Gini impurity
    Gini,
    /// Shannon entropy in bits
    #[default]
    Entropy,
}

impl Criterion {
    fn impurity(&self, counts: [usize; 2]) -> f64 {
        let n = (counts[0] + counts[1]) as f64;
        if n == 0.0 {
            return 0.0;
        }
        match self {
            Criterion::Gini => 1.0 - counts.iter().map(|&c| (c as f64 / n).powi(2)).sum::<f64>(),
            Criterion::Entropy => -counts
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = c as f64 / n;
                    p * p.log2()
                })
                .sum::<f64>(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Criterion::Gini => "gini",
            Criterion::Entropy => "entropy",
        }
    }
}

/// Decision tree model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Tree root
    root: Option<TreeNode>,
    /// Maximum number of split levels
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Impurity criterion
    pub criterion: Criterion,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            criterion: Criterion::Entropy,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Set criterion
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }

    /// Fit to a feature matrix and 0/1 labels
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(BankTreeError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(BankTreeError::TrainingError("no training samples".to_string()));
        }
        if self.max_depth == Some(0) {
            return Err(BankTreeError::InvalidParameter {
                name: "max_depth".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.min_samples_leaf == 0 {
            return Err(BankTreeError::InvalidParameter {
                name: "min_samples_leaf".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if let Some(bad) = y.iter().find(|&&v| v != 0.0 && v != 1.0) {
            return Err(BankTreeError::TrainingError(format!(
                "labels must be 0 or 1, found {}",
                bad
            )));
        }

        self.n_features = n_features;
        let labels: Vec<bool> = y.iter().map(|&v| v == 1.0).collect();

        let mut importances = vec![0.0; n_features];
        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_tree(x, &labels, &indices, 0, &mut importances));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &[bool],
        indices: &[usize],
        depth: usize,
        importances: &mut [f64],
    ) -> TreeNode {
        let n_samples = indices.len();
        let counts = class_counts(y, indices);
        let impurity = self.criterion.impurity(counts);

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || counts[0] == 0
            || counts[1] == 0;

        if should_stop {
            return TreeNode::Leaf { counts };
        }

        let Some((feature_idx, threshold, gain)) = self.find_best_split(x, y, indices, counts, impurity) else {
            return TreeNode::Leaf { counts };
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, feature_idx]] <= threshold);

        importances[feature_idx] += n_samples as f64 * gain;

        let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1, importances));
        let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1, importances));

        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            counts,
            impurity,
        }
    }

    /// Best (feature, threshold, gain) over all features; lowest feature index wins ties
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &[bool],
        indices: &[usize],
        counts: [usize; 2],
        parent_impurity: f64,
    ) -> Option<(usize, f64, f64)> {
        let n = indices.len();

        // Each feature independently sweeps its sorted values
        let feature_results: Vec<Option<(usize, f64, f64)>> = (0..x.ncols())
            .into_par_iter()
            .map(|feature_idx| {
                let mut values: Vec<(f64, bool)> = indices
                    .iter()
                    .map(|&i| (x[[i, feature_idx]], y[i]))
                    .filter(|(v, _)| !v.is_nan())
                    .collect();
                values.sort_by(|a, b| a.0.total_cmp(&b.0));

                let mut best: Option<(f64, f64)> = None;
                let mut left = [0usize; 2];

                for k in 0..values.len().saturating_sub(1) {
                    left[values[k].1 as usize] += 1;
                    if values[k].0 == values[k + 1].0 {
                        continue;
                    }

                    let left_n = k + 1;
                    // NaN rows are routed right at prediction time
                    let right_n = n - left_n;
                    if left_n < self.min_samples_leaf || right_n < self.min_samples_leaf {
                        continue;
                    }
                    let right = [counts[0] - left[0], counts[1] - left[1]];

                    let weighted = (left_n as f64 * self.criterion.impurity(left)
                        + right_n as f64 * self.criterion.impurity(right))
                        / n as f64;
                    let gain = parent_impurity - weighted;

                    if gain > 1e-12 && best.map_or(true, |(_, g)| gain > g) {
                        best = Some(((values[k].0 + values[k + 1].0) / 2.0, gain));
                    }
                }

                best.map(|(threshold, gain)| (feature_idx, threshold, gain))
            })
            .collect();

        feature_results
            .into_iter()
            .flatten()
            .fold(None, |acc: Option<(usize, f64, f64)>, cand| match acc {
                Some(best) if best.2 >= cand.2 => Some(best),
                _ => Some(cand),
            })
    }

    fn leaf_for<'a>(&'a self, mut node: &'a TreeNode, sample: &[f64]) -> &'a TreeNode {
        while let TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            ..
        } = node
        {
            node = if sample[*feature_idx] <= *threshold { &**left } else { &**right };
        }
        node
    }

    fn check_input(&self, x: &Array2<f64>) -> Result<&TreeNode> {
        let root = self.root.as_ref().ok_or(BankTreeError::ModelNotFitted)?;
        if x.ncols() != self.n_features {
            return Err(BankTreeError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(root)
    }

    /// Predict 0/1 labels
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.check_input(x)?;
        Ok(x
            .rows()
            .into_iter()
            .map(|row| {
                let sample = row.to_vec();
                if self.leaf_for(root, &sample).class() { 1.0 } else { 0.0 }
            })
            .collect())
    }

    /// Fraction of positive training samples in the leaf each row lands in
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.check_input(x)?;
        Ok(x
            .rows()
            .into_iter()
            .map(|row| {
                let sample = row.to_vec();
                let leaf = self.leaf_for(root, &sample);
                leaf.counts()[1] as f64 / leaf.n_samples().max(1) as f64
            })
            .collect())
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Number of split levels on the longest path (a lone leaf has depth 0)
    pub fn get_depth(&self) -> usize {
        fn depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        self.root.as_ref().map_or(0, depth)
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        fn leaves(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => leaves(left) + leaves(right),
            }
        }
        self.root.as_ref().map_or(0, leaves)
    }

    /// Indented text rendering of the rules
    ///
    /// ```text
    /// |--- income <= 30000.50
    /// |   |--- class: NO
    /// |--- income >  30000.50
    /// |   |--- class: YES
    /// ```
    pub fn export_text(&self, feature_names: &[String], class_names: [&str; 2]) -> Result<String> {
        let root = self.root.as_ref().ok_or(BankTreeError::ModelNotFitted)?;
        if feature_names.len() != self.n_features {
            return Err(BankTreeError::ShapeError {
                expected: format!("{} feature names", self.n_features),
                actual: format!("{} feature names", feature_names.len()),
            });
        }

        let mut out = String::new();
        self.write_node(&mut out, root, feature_names, class_names, 0);
        Ok(out)
    }

    fn write_node(&self, out: &mut String, node: &TreeNode, names: &[String], classes: [&str; 2], indent: usize) {
        let prefix = format!("{}|--- ", "|   ".repeat(indent));
        match node {
            TreeNode::Leaf { counts } => {
                let _ = writeln!(
                    out,
                    "{}class: {} ({}={:.3}, samples={}, value=[{}, {}])",
                    prefix,
                    classes[node.class() as usize],
                    self.criterion.name(),
                    self.criterion.impurity(*counts),
                    node.n_samples(),
                    counts[0],
                    counts[1]
                );
            }
            TreeNode::Split {
                feature_idx,
                threshold,
                left,
                right,
                ..
            } => {
                let name = &names[*feature_idx];
                let _ = writeln!(out, "{}{} <= {:.2}", prefix, name, threshold);
                self.write_node(out, left, names, classes, indent + 1);
                let _ = writeln!(out, "{}{} >  {:.2}", prefix, name, threshold);
                self.write_node(out, right, names, classes, indent + 1);
            }
        }
    }
}

fn class_counts(y: &[bool], indices: &[usize]) -> [usize; 2] {
    let mut counts = [0usize; 2];
    for &i in indices {
        counts[y[i] as usize] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_classifier_separable() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.predict(&x).unwrap(), y);
        assert_eq!(tree.get_depth(), 1);
        assert_eq!(tree.get_n_leaves(), 2);
    }

    #[test]
    fn test_max_depth_limits_splits() {
        // x0 AND x1 needs two levels
        let x = array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
        let y = array![0.0, 0.0, 0.0, 1.0];

        let mut shallow = DecisionTree::new().with_max_depth(1);
        shallow.fit(&x, &y).unwrap();
        assert_eq!(shallow.get_depth(), 1);
        assert_eq!(shallow.predict(&x).unwrap(), array![0.0, 0.0, 0.0, 0.0]);

        let mut deep = DecisionTree::new().with_max_depth(3);
        deep.fit(&x, &y).unwrap();
        assert_eq!(deep.get_depth(), 2);
        assert_eq!(deep.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_zero_depth_rejected() {
        let x = array![[1.0], [2.0]];
        let y = array![0.0, 1.0];
        let mut tree = DecisionTree::new().with_max_depth(0);
        assert!(matches!(
            tree.fit(&x, &y),
            Err(BankTreeError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_non_binary_labels_rejected() {
        let x = array![[1.0], [2.0]];
        let y = array![0.0, 2.0];
        assert!(DecisionTree::new().fit(&x, &y).is_err());
    }

    #[test]
    fn test_predict_proba_from_leaf_counts() {
        let x = array![[1.0], [1.0], [1.0], [5.0]];
        let y = array![0.0, 1.0, 1.0, 0.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let proba = tree.predict_proba(&array![[1.0], [5.0]]).unwrap();
        assert!((proba[0] - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(proba[1], 0.0);
    }

    #[test]
    fn test_unfitted_predict() {
        let tree = DecisionTree::new();
        assert!(matches!(
            tree.predict(&array![[1.0]]),
            Err(BankTreeError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_feature_importances() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let importances = tree.feature_importances().unwrap();
        assert_eq!(importances[0], 1.0);
        assert_eq!(importances[1], 0.0);
    }

    #[test]
    fn test_export_text() {
        let x = array![[10.0], [20.0], [30.0], [40.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let text = tree.export_text(&["income".to_string()], ["NO", "YES"]).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "|--- income <= 25.00");
        assert!(lines[1].starts_with("|   |--- class: NO"));
        assert_eq!(lines[2], "|--- income >  25.00");
        assert!(lines[3].starts_with("|   |--- class: YES"));
    }

    #[test]
    fn test_entropy_values() {
        assert_eq!(Criterion::Entropy.impurity([5, 5]), 1.0);
        assert_eq!(Criterion::Entropy.impurity([4, 0]), 0.0);
        assert!((Criterion::Gini.impurity([5, 5]) - 0.5).abs() < 1e-12);
    }
}
