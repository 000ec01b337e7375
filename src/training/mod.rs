//! Model training and evaluation
//!
//! An entropy decision tree trained on encoded tables, plus the metrics used
//! to judge it on the holdout table.

mod decision_tree;
mod engine;
mod metrics;

pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use engine::{Evaluation, TrainedTree, TreeTrainer};
pub use metrics::{ClassificationMetrics, ConfusionMatrix, RocCurve};

use crate::error::{BankTreeError, Result};
use serde::{Deserialize, Serialize};

/// Tree hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub criterion: Criterion,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            min_samples_split: 2,
            min_samples_leaf: 1,
            criterion: Criterion::Entropy,
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the maximum depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(BankTreeError::InvalidParameter {
                name: "max_depth".to_string(),
                value: self.max_depth.to_string(),
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
        if self.min_samples_split < 2 {
            return Err(BankTreeError::InvalidParameter {
                name: "min_samples_split".to_string(),
                value: self.min_samples_split.to_string(),
                reason: "must be at least 2".to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn build_tree(&self) -> DecisionTree {
        DecisionTree::new()
            .with_max_depth(self.max_depth)
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_criterion(self.criterion)
    }
}
