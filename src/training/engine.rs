//! Training engine: encoded tables in, fitted tree and evaluation out

use super::{ClassificationMetrics, ConfusionMatrix, DecisionTree, RocCurve, TrainingConfig};
use crate::error::{BankTreeError, Result};
use crate::preprocessing::{EncodedColumn, EncodedDataset};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;
use tracing::info;

/// Trains a decision tree on an encoded table
#[derive(Debug, Clone)]
pub struct TreeTrainer {
    config: TrainingConfig,
}

impl TreeTrainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Fit on every column except those derived from `label`
    pub fn fit(&self, data: &EncodedDataset, label: &str) -> Result<TrainedTree> {
        self.config.validate()?;
        let start = Instant::now();

        let y = label_vector(data, label)?;
        let (feature_names, x) = data.features_without(label);
        if feature_names.is_empty() {
            return Err(BankTreeError::TrainingError(
                "no feature columns besides the label".to_string(),
            ));
        }

        let mut tree = self.config.build_tree();
        tree.fit(&x, &y)?;

        let predictions = tree.predict(&x)?;
        let training_accuracy = ConfusionMatrix::from_predictions(&y, &predictions).accuracy();
        let training_time_secs = start.elapsed().as_secs_f64();

        info!(
            max_depth = self.config.max_depth,
            depth = tree.get_depth(),
            leaves = tree.get_n_leaves(),
            features = feature_names.len(),
            samples = x.nrows(),
            accuracy = training_accuracy,
            "Trained decision tree"
        );

        Ok(TrainedTree {
            tree,
            label: label.to_string(),
            feature_names,
            training_accuracy,
            training_time_secs,
        })
    }
}

/// Pull the 0/1 label column out of an encoded table
fn label_vector(data: &EncodedDataset, label: &str) -> Result<Array1<f64>> {
    let invalid = |reason: &str| BankTreeError::InvalidLabelColumn {
        column: label.to_string(),
        reason: reason.to_string(),
    };

    let idx = data
        .column_index(label)
        .ok_or_else(|| invalid("column not found in encoded table"))?;
    if !matches!(data.layout().columns()[idx], EncodedColumn::Passthrough { .. }) {
        return Err(invalid("label must be a boolean column"));
    }

    // Missing labels count as negative
    let y = data.data().column(idx).mapv(|v| if v.is_nan() { 0.0 } else { v });
    if y.iter().any(|&v| v != 0.0 && v != 1.0) {
        return Err(invalid("label values must all be true or false"));
    }
    Ok(y)
}

/// Holdout evaluation results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub confusion: ConfusionMatrix,
    pub roc: RocCurve,
    pub metrics: ClassificationMetrics,
}

/// A fitted tree with the feature layout it was trained on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedTree {
    tree: DecisionTree,
    label: String,
    feature_names: Vec<String>,
    training_accuracy: f64,
    training_time_secs: f64,
}

impl TrainedTree {
    pub fn tree(&self) -> &DecisionTree {
        &self.tree
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn training_accuracy(&self) -> f64 {
        self.training_accuracy
    }

    pub fn training_time_secs(&self) -> f64 {
        self.training_time_secs
    }

    /// Feature matrix of `data` in training column order
    fn features(&self, data: &EncodedDataset) -> Result<Array2<f64>> {
        let (names, x) = data.features_without(&self.label);
        if names != self.feature_names {
            let trained: HashSet<&String> = self.feature_names.iter().collect();
            let given: HashSet<&String> = names.iter().collect();
            let mut missing_in_holdout: Vec<String> =
                trained.difference(&given).map(|s| s.to_string()).collect();
            let mut missing_in_training: Vec<String> =
                given.difference(&trained).map(|s| s.to_string()).collect();
            missing_in_holdout.sort();
            missing_in_training.sort();
            return Err(BankTreeError::SchemaMismatch {
                missing_in_holdout,
                missing_in_training,
            });
        }
        Ok(x)
    }

    pub fn predict(&self, data: &EncodedDataset) -> Result<Array1<f64>> {
        self.tree.predict(&self.features(data)?)
    }

    pub fn predict_proba(&self, data: &EncodedDataset) -> Result<Array1<f64>> {
        self.tree.predict_proba(&self.features(data)?)
    }

    /// Score the tree on a table encoded the same way as the training table
    pub fn evaluate(&self, data: &EncodedDataset) -> Result<Evaluation> {
        let x = self.features(data)?;
        let y = label_vector(data, &self.label)?;

        let predictions = self.tree.predict(&x)?;
        let scores = self.tree.predict_proba(&x)?;

        let confusion = ConfusionMatrix::from_predictions(&y, &predictions);
        let roc = RocCurve::from_scores(&y, &scores);
        let metrics = ClassificationMetrics::compute(&confusion, &roc);

        info!(
            samples = metrics.n_samples,
            accuracy = metrics.accuracy,
            auc = ?metrics.auc_roc,
            "Evaluated decision tree"
        );

        Ok(Evaluation {
            confusion,
            roc,
            metrics,
        })
    }

    /// Feature names with their importances, largest first, zeros left out
    pub fn importances(&self) -> Vec<(String, f64)> {
        let Some(values) = self.tree.feature_importances() else {
            return Vec::new();
        };
        let mut ranked: Vec<(String, f64)> = self
            .feature_names
            .iter()
            .cloned()
            .zip(values.iter().copied())
            .filter(|(_, v)| *v > 0.0)
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    /// Rules as indented text
    pub fn export_text(&self) -> Result<String> {
        self.tree.export_text(&self.feature_names, ["False", "True"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AttributeMeta, Dataset, Schema, Value};
    use crate::preprocessing::{clean, encode, encode_with_layout, EncodingLayout};

    fn bank(rows: &[(f64, &str, &str)]) -> Dataset {
        let schema = Schema::new(vec![
            AttributeMeta::numeric("income"),
            AttributeMeta::categorical("region", ["TOWN", "RURAL"]),
            AttributeMeta::categorical("pep", ["YES", "NO"]),
        ]);
        let records = rows
            .iter()
            .map(|(income, region, pep)| {
                vec![
                    Value::Number(*income),
                    Value::Text(region.to_string()),
                    Value::Text(pep.to_string()),
                ]
            })
            .collect();
        Dataset::new("bank", schema, records).unwrap()
    }

    fn training_rows() -> Vec<(f64, &'static str, &'static str)> {
        vec![
            (12000.0, "TOWN", "NO"),
            (15000.0, "RURAL", "NO"),
            (18000.0, "TOWN", "NO"),
            (41000.0, "RURAL", "YES"),
            (45000.0, "TOWN", "YES"),
            (52000.0, "RURAL", "YES"),
        ]
    }

    #[test]
    fn test_fit_and_evaluate() {
        let train = encode(&clean(&bank(&training_rows()))).unwrap();
        let trained = TreeTrainer::new(TrainingConfig::default())
            .fit(&train, "pep")
            .unwrap();

        assert_eq!(trained.training_accuracy(), 1.0);
        assert!(!trained.feature_names().contains(&"pep".to_string()));

        let holdout_clean = clean(&bank(&[(10000.0, "TOWN", "NO"), (60000.0, "RURAL", "YES")]));
        let holdout = encode_with_layout(&holdout_clean, train.layout()).unwrap();
        let eval = trained.evaluate(&holdout).unwrap();

        assert_eq!(eval.metrics.accuracy, 1.0);
        assert_eq!(eval.confusion.as_rows(), [[1, 0], [0, 1]]);
        assert_eq!(eval.roc.auc, Some(1.0));
        assert_eq!(trained.importances()[0].0, "income");
    }

    #[test]
    fn test_misaligned_holdout() {
        let train = encode(&clean(&bank(&training_rows()))).unwrap();
        let trained = TreeTrainer::new(TrainingConfig::default())
            .fit(&train, "pep")
            .unwrap();

        let holdout = encode(&clean(&bank(&[(10000.0, "TOWN", "NO")]))).unwrap();
        let err = trained.evaluate(&holdout).unwrap_err();
        assert!(matches!(err, BankTreeError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_label_must_be_boolean() {
        let train = encode(&clean(&bank(&training_rows()))).unwrap();
        let trainer = TreeTrainer::new(TrainingConfig::default());

        assert!(matches!(
            trainer.fit(&train, "income"),
            Err(BankTreeError::InvalidLabelColumn { .. })
        ));
        assert!(matches!(
            trainer.fit(&train, "region"),
            Err(BankTreeError::InvalidLabelColumn { .. })
        ));
    }

    #[test]
    fn test_export_text_names_features() {
        let train = encode(&clean(&bank(&training_rows()))).unwrap();
        let trained = TreeTrainer::new(TrainingConfig::default().with_max_depth(1))
            .fit(&train, "pep")
            .unwrap();

        let text = trained.export_text().unwrap();
        assert!(text.starts_with("|--- income <= 29500.00"));
        assert!(text.contains("class: True"));
    }

    #[test]
    fn test_declared_layout_roundtrip() {
        let train_clean = clean(&bank(&training_rows()));
        let layout = EncodingLayout::from_schema(train_clean.schema());
        let train = encode_with_layout(&train_clean, &layout).unwrap();
        let trained = TreeTrainer::new(TrainingConfig::default())
            .fit(&train, "pep")
            .unwrap();
        assert_eq!(trained.predict(&train).unwrap().len(), 6);
    }
}
