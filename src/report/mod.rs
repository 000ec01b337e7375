//! Chart primitives and reports handed to the host for display
//!
//! Nothing here draws pixels. Each chart carries its title, labels and values,
//! serializes to JSON, and has a plain-text rendering for terminals.

use crate::summary::DistributionSummary;
use crate::training::{ClassificationMetrics, ConfusionMatrix, Evaluation, RocCurve, TrainedTree};
use crate::error::Result;
use serde::{Deserialize, Serialize};

const BAR_WIDTH: usize = 40;

/// Legend name of the negative-label series
pub const NEGATIVE_SERIES: &str = "No PEP";
/// Legend name of the positive-label series
pub const POSITIVE_SERIES: &str = "Yes PEP";

/// One named series of bar heights
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarSeries {
    pub name: String,
    pub values: Vec<usize>,
}

/// Grouped bar chart; every series has one value per label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarChart {
    pub title: String,
    pub labels: Vec<String>,
    pub series: Vec<BarSeries>,
}

impl BarChart {
    /// Negative series first, then positive
    pub fn from_summary(summary: &DistributionSummary) -> Self {
        Self {
            title: format!("{} distribution", summary.attribute),
            labels: summary.labels.clone(),
            series: vec![
                BarSeries {
                    name: NEGATIVE_SERIES.to_string(),
                    values: summary.negative.clone(),
                },
                BarSeries {
                    name: POSITIVE_SERIES.to_string(),
                    values: summary.positive.clone(),
                },
            ],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Horizontal bars scaled to the largest value
    pub fn to_text(&self) -> String {
        let mut out = format!("{}\n", self.title);
        if self.is_empty() {
            out.push_str("  (no data)\n");
            return out;
        }

        let max = self
            .series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .max()
            .unwrap_or(0)
            .max(1);
        let label_width = self.labels.iter().map(String::len).max().unwrap_or(0);
        let name_width = self.series.iter().map(|s| s.name.len()).max().unwrap_or(0);

        for (i, label) in self.labels.iter().enumerate() {
            for (k, series) in self.series.iter().enumerate() {
                let value = series.values.get(i).copied().unwrap_or(0);
                let bar = "#".repeat(value * BAR_WIDTH / max);
                let shown = if k == 0 { label.as_str() } else { "" };
                out.push_str(&format!(
                    "  {:>lw$}  {:<nw$} {} {}\n",
                    shown,
                    series.name,
                    bar,
                    value,
                    lw = label_width,
                    nw = name_width
                ));
            }
        }
        out
    }
}

/// Confusion matrix laid out for display, actual class per row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionChart {
    pub title: String,
    pub labels: [String; 2],
    pub cells: [[usize; 2]; 2],
}

impl ConfusionChart {
    pub fn new(matrix: &ConfusionMatrix) -> Self {
        Self {
            title: "Confusion matrix".to_string(),
            labels: ["False".to_string(), "True".to_string()],
            cells: matrix.as_rows(),
        }
    }

    pub fn to_text(&self) -> String {
        let width = self
            .cells
            .iter()
            .flatten()
            .map(|c| c.to_string().len())
            .max()
            .unwrap_or(1)
            .max(self.labels.iter().map(String::len).max().unwrap_or(0));

        let mut out = format!("{}\n", self.title);
        out.push_str(&format!(
            "  {:>12}  {:>w$}  {:>w$}\n",
            "actual \\ pred",
            self.labels[0],
            self.labels[1],
            w = width
        ));
        for (label, row) in self.labels.iter().zip(self.cells.iter()) {
            out.push_str(&format!(
                "  {:>12}  {:>w$}  {:>w$}\n",
                label,
                row[0],
                row[1],
                w = width
            ));
        }
        out
    }
}

/// ROC curve points with the area under them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocChart {
    pub title: String,
    pub points: Vec<(f64, f64)>,
    pub auc: Option<f64>,
}

impl RocChart {
    pub fn new(roc: &RocCurve) -> Self {
        let title = match roc.auc {
            Some(auc) => format!("ROC curve (AUC = {:.3})", auc),
            None => "ROC curve (AUC undefined)".to_string(),
        };
        Self {
            title,
            points: roc.points.clone(),
            auc: roc.auc,
        }
    }

    pub fn to_text(&self) -> String {
        let mut out = format!("{}\n  {:>6}  {:>6}\n", self.title, "fpr", "tpr");
        for (fpr, tpr) in &self.points {
            out.push_str(&format!("  {:>6.3}  {:>6.3}\n", fpr, tpr));
        }
        out
    }
}

/// Everything a training request produces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub label: String,
    pub max_depth: usize,
    pub depth: usize,
    pub leaves: usize,
    pub training_accuracy: f64,
    pub training_time_secs: f64,
    pub tree_text: String,
    pub importances: Vec<(String, f64)>,
    pub metrics: ClassificationMetrics,
    pub confusion: ConfusionChart,
    pub roc: RocChart,
}

impl TrainingReport {
    pub fn new(trained: &TrainedTree, max_depth: usize, evaluation: &Evaluation) -> Result<Self> {
        Ok(Self {
            label: trained.label().to_string(),
            max_depth,
            depth: trained.tree().get_depth(),
            leaves: trained.tree().get_n_leaves(),
            training_accuracy: trained.training_accuracy(),
            training_time_secs: trained.training_time_secs(),
            tree_text: trained.export_text()?,
            importances: trained.importances(),
            metrics: evaluation.metrics.clone(),
            confusion: ConfusionChart::new(&evaluation.confusion),
            roc: RocChart::new(&evaluation.roc),
        })
    }

    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str(&format!("# Decision tree for `{}`\n\n", self.label));
        md.push_str(&format!("- **Max depth:** {}\n", self.max_depth));
        md.push_str(&format!("- **Depth:** {}\n", self.depth));
        md.push_str(&format!("- **Leaves:** {}\n", self.leaves));
        md.push_str(&format!("- **Training accuracy:** {:.4}\n", self.training_accuracy));
        md.push_str(&format!("- **Holdout accuracy:** {:.4}\n\n", self.metrics.accuracy));

        md.push_str("## Tree\n\n```text\n");
        md.push_str(&self.tree_text);
        md.push_str("```\n\n");

        if !self.importances.is_empty() {
            md.push_str("## Feature importances\n\n| Feature | Importance |\n|---------|------------|\n");
            for (name, value) in &self.importances {
                md.push_str(&format!("| {} | {:.4} |\n", name, value));
            }
            md.push('\n');
        }

        md.push_str("## Holdout\n\n```text\n");
        md.push_str(&self.confusion.to_text());
        md.push_str("```\n\n");
        md.push_str("| Metric | Value |\n|--------|-------|\n");
        md.push_str(&format!("| precision | {:.4} |\n", self.metrics.precision));
        md.push_str(&format!("| recall | {:.4} |\n", self.metrics.recall));
        md.push_str(&format!("| f1 | {:.4} |\n", self.metrics.f1_score));
        match self.metrics.auc_roc {
            Some(auc) => md.push_str(&format!("| auc | {:.4} |\n", auc)),
            None => md.push_str("| auc | n/a |\n"),
        }
        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn summary() -> DistributionSummary {
        DistributionSummary {
            attribute: "sex".to_string(),
            labels: vec!["MALE".to_string(), "FEMALE".to_string()],
            negative: vec![3, 1],
            positive: vec![4, 2],
        }
    }

    #[test]
    fn test_bar_chart_series_order() {
        let chart = BarChart::from_summary(&summary());
        assert_eq!(chart.title, "sex distribution");
        assert_eq!(chart.series[0].name, "No PEP");
        assert_eq!(chart.series[0].values, vec![3, 1]);
        assert_eq!(chart.series[1].name, "Yes PEP");
        assert_eq!(chart.series[1].values, vec![4, 2]);
    }

    #[test]
    fn test_bar_chart_text() {
        let text = BarChart::from_summary(&summary()).to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "sex distribution");
        assert_eq!(lines.len(), 5);
        assert!(lines[1].contains("MALE"));
        assert!(lines[2].ends_with(&format!("{} 4", "#".repeat(BAR_WIDTH))));
    }

    #[test]
    fn test_empty_chart() {
        let empty = DistributionSummary {
            attribute: "age".to_string(),
            labels: Vec::new(),
            negative: Vec::new(),
            positive: Vec::new(),
        };
        let chart = BarChart::from_summary(&empty);
        assert!(chart.is_empty());
        assert!(chart.to_text().contains("(no data)"));
    }

    #[test]
    fn test_chart_json() {
        let json = serde_json::to_string(&BarChart::from_summary(&summary())).unwrap();
        assert!(json.contains("\"title\":\"sex distribution\""));
        assert!(json.contains("\"No PEP\""));
    }

    #[test]
    fn test_confusion_and_roc_charts() {
        let y = array![0.0, 1.0, 1.0, 0.0];
        let p = array![0.0, 1.0, 0.0, 0.0];
        let confusion = ConfusionChart::new(&ConfusionMatrix::from_predictions(&y, &p));
        assert_eq!(confusion.cells, [[2, 0], [1, 1]]);
        assert!(confusion.to_text().starts_with("Confusion matrix\n"));

        let roc = RocChart::new(&RocCurve::from_scores(&y, &array![0.1, 0.9, 0.8, 0.2]));
        assert_eq!(roc.auc, Some(1.0));
        assert_eq!(roc.title, "ROC curve (AUC = 1.000)");
    }
}
