//! Classification metrics: confusion matrix and ROC curve

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// 2x2 confusion matrix with the negative class first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

impl ConfusionMatrix {
    /// Count outcomes; values above 0.5 are the positive class
    pub fn from_predictions(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let mut cm = Self::default();
        for (t, p) in y_true.iter().zip(y_pred.iter()) {
            match (*t > 0.5, *p > 0.5) {
                (true, true) => cm.true_positive += 1,
                (false, true) => cm.false_positive += 1,
                (false, false) => cm.true_negative += 1,
                (true, false) => cm.false_negative += 1,
            }
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }

    /// Rows are the actual class, columns the predicted class
    pub fn as_rows(&self) -> [[usize; 2]; 2] {
        [
            [self.true_negative, self.false_positive],
            [self.false_negative, self.true_positive],
        ]
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            (self.true_positive + self.true_negative) as f64 / total as f64
        }
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    pub fn f1_score(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r > 0.0 {
            2.0 * p * r / (p + r)
        } else {
            0.0
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den > 0 {
        num as f64 / den as f64
    } else {
        0.0
    }
}

/// Receiver operating characteristic curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    /// (false positive rate, true positive rate), from (0, 0) to (1, 1)
    pub points: Vec<(f64, f64)>,
    /// Score threshold for each point after the first
    pub thresholds: Vec<f64>,
    /// Area under the curve; `None` when only one class is present
    pub auc: Option<f64>,
}

impl RocCurve {
    /// Sweep thresholds over the distinct scores in descending order
    pub fn from_scores(y_true: &Array1<f64>, scores: &Array1<f64>) -> Self {
        let positives = y_true.iter().filter(|&&t| t > 0.5).count();
        let negatives = y_true.len() - positives;

        let mut pairs: Vec<(f64, bool)> = scores
            .iter()
            .zip(y_true.iter())
            .map(|(&s, &t)| (s, t > 0.5))
            .collect();
        pairs.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut points = vec![(0.0, 0.0)];
        let mut thresholds = Vec::new();
        let (mut tp, mut fp) = (0usize, 0usize);

        for (i, &(score, positive)) in pairs.iter().enumerate() {
            if positive {
                tp += 1;
            } else {
                fp += 1;
            }
            let last_of_group = pairs.get(i + 1).map_or(true, |next| next.0 != score);
            if last_of_group {
                points.push((ratio(fp, negatives), ratio(tp, positives)));
                thresholds.push(score);
            }
        }

        let auc = if positives == 0 || negatives == 0 {
            None
        } else {
            Some(
                points
                    .windows(2)
                    .map(|w| (w[1].0 - w[0].0) * (w[1].1 + w[0].1) / 2.0)
                    .sum(),
            )
        };

        Self {
            points,
            thresholds,
            auc,
        }
    }
}

/// Summary metrics for a binary classifier on one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub auc_roc: Option<f64>,
    pub n_samples: usize,
}

impl ClassificationMetrics {
    pub fn compute(confusion: &ConfusionMatrix, roc: &RocCurve) -> Self {
        Self {
            accuracy: confusion.accuracy(),
            precision: confusion.precision(),
            recall: confusion.recall(),
            f1_score: confusion.f1_score(),
            auc_roc: roc.auc,
            n_samples: confusion.total(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_confusion_counts() {
        let y_true = array![1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0];
        let y_pred = array![1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0];

        let cm = ConfusionMatrix::from_predictions(&y_true, &y_pred);
        assert_eq!(cm.as_rows(), [[3, 1], [1, 3]]);
        assert_eq!(cm.accuracy(), 0.75);
        assert_eq!(cm.precision(), 0.75);
        assert_eq!(cm.recall(), 0.75);
    }

    #[test]
    fn test_perfect_roc() {
        let y_true = array![0.0, 0.0, 1.0, 1.0];
        let scores = array![0.1, 0.2, 0.8, 0.9];

        let roc = RocCurve::from_scores(&y_true, &scores);
        assert_eq!(roc.auc, Some(1.0));
        assert_eq!(roc.points.first(), Some(&(0.0, 0.0)));
        assert_eq!(roc.points.last(), Some(&(1.0, 1.0)));
    }

    #[test]
    fn test_tied_scores_single_point() {
        let y_true = array![0.0, 1.0, 0.0, 1.0];
        let scores = array![0.5, 0.5, 0.5, 0.5];

        let roc = RocCurve::from_scores(&y_true, &scores);
        assert_eq!(roc.points, vec![(0.0, 0.0), (1.0, 1.0)]);
        assert_eq!(roc.auc, Some(0.5));
    }

    #[test]
    fn test_single_class_has_no_auc() {
        let roc = RocCurve::from_scores(&array![1.0, 1.0], &array![0.3, 0.7]);
        assert!(roc.auc.is_none());
    }
}
