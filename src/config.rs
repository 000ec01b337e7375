//! Explorer configuration

use crate::error::{BankTreeError, Result};
use crate::preprocessing::CategoryUniverse;
use crate::training::{Criterion, TrainingConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Settings for one explorer session
///
/// Every field has a default, so a JSON file only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Boolean column the tree predicts and summaries split on
    pub label_column: String,

    /// Maximum number of split levels
    pub max_depth: usize,

    /// Rows shown by previews
    pub preview_rows: usize,

    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub criterion: Criterion,

    /// Which categories get an indicator column when encoding
    pub category_universe: CategoryUniverse,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        let training = TrainingConfig::default();
        Self {
            label_column: "pep".to_string(),
            max_depth: training.max_depth,
            preview_rows: 10,
            min_samples_split: training.min_samples_split,
            min_samples_leaf: training.min_samples_leaf,
            criterion: training.criterion,
            category_universe: CategoryUniverse::Declared,
        }
    }
}

impl ExplorerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the label column
    pub fn with_label_column(mut self, label: impl Into<String>) -> Self {
        self.label_column = label.into();
        self
    }

    /// Builder method to set the maximum depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    pub fn with_category_universe(mut self, universe: CategoryUniverse) -> Self {
        self.category_universe = universe;
        self
    }

    /// Tree hyperparameters carried by this config
    pub fn training(&self) -> TrainingConfig {
        TrainingConfig {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            criterion: self.criterion,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.label_column.trim().is_empty() {
            return Err(BankTreeError::ConfigError(
                "label_column must not be empty".to_string(),
            ));
        }
        self.training().validate()
    }

    /// Load from a JSON file and validate
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }
}
