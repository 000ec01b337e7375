//! Attribute distribution summaries
//!
//! Splits the rows of a clean dataset by a boolean label and counts how often
//! each value (or value range) of a chosen attribute occurs on either side.
//! Numeric attributes with a narrow observed range get one bucket per integer;
//! wider ranges are cut into [`WIDE_BUCKETS`] equal-width buckets starting at
//! the observed minimum.

mod binning;

pub use binning::{Bucketing, NARROW_RANGE_LIMIT, WIDE_BUCKETS};

use crate::data::{AttributeDomain, Value};
use crate::error::{BankTreeError, Result};
use crate::preprocessing::CleanDataset;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Paired negative/positive counts over the buckets of one attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub attribute: String,
    pub labels: Vec<String>,
    /// Rows where the label is not true
    pub negative: Vec<usize>,
    /// Rows where the label is true
    pub positive: Vec<usize>,
}

impl DistributionSummary {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Total count over both series
    pub fn total(&self) -> usize {
        self.negative.iter().sum::<usize>() + self.positive.iter().sum::<usize>()
    }

    /// (label, negative, positive) per bucket
    pub fn rows(&self) -> impl Iterator<Item = (&str, usize, usize)> + '_ {
        self.labels
            .iter()
            .zip(self.negative.iter().zip(&self.positive))
            .map(|(l, (n, p))| (l.as_str(), *n, *p))
    }
}

/// Summarize `attribute` split by the boolean `label_column`
pub fn summarize(data: &CleanDataset, label_column: &str, attribute: &str) -> Result<DistributionSummary> {
    let schema = data.schema();

    let label_idx = schema
        .index_of(label_column)
        .ok_or_else(|| BankTreeError::InvalidLabelColumn {
            column: label_column.to_string(),
            reason: "column not found".to_string(),
        })?;
    if !schema.attributes()[label_idx].domain.is_boolean() {
        return Err(BankTreeError::InvalidLabelColumn {
            column: label_column.to_string(),
            reason: format!(
                "expected a boolean column, found {}",
                schema.attributes()[label_idx].domain.describe()
            ),
        });
    }

    let attr_idx = schema
        .index_of(attribute)
        .ok_or_else(|| BankTreeError::UnknownAttribute(attribute.to_string()))?;
    let domain = &schema.attributes()[attr_idx].domain;

    let summary = if data.is_empty() {
        DistributionSummary {
            attribute: attribute.to_string(),
            labels: Vec::new(),
            negative: Vec::new(),
            positive: Vec::new(),
        }
    } else {
        let rows: Vec<(&Value, bool)> = data
            .records()
            .iter()
            .map(|r| (&r[attr_idx], r[label_idx].as_bool() == Some(true)))
            .collect();
        match domain {
            AttributeDomain::Categorical(labels) => count_labels(attribute, labels, &rows, |v, l| v.as_str() == Some(l)),
            AttributeDomain::Boolean { labels } => count_labels(attribute, labels, &rows, |v, l| {
                v.as_bool().map(|b| b == (l == "YES")).unwrap_or(false)
            }),
            AttributeDomain::Text => {
                let distinct: BTreeSet<&str> = rows.iter().filter_map(|(v, _)| v.as_str()).collect();
                let labels: Vec<String> = distinct.into_iter().map(str::to_string).collect();
                count_labels(attribute, &labels, &rows, |v, l| v.as_str() == Some(l))
            }
            AttributeDomain::Numeric => count_numeric(attribute, &rows),
        }
    };

    debug!(
        attribute,
        label = label_column,
        buckets = summary.len(),
        "Summarized attribute"
    );
    Ok(summary)
}

fn count_labels<F>(attribute: &str, labels: &[String], rows: &[(&Value, bool)], matches: F) -> DistributionSummary
where
    F: Fn(&Value, &str) -> bool,
{
    let mut all = vec![0usize; labels.len()];
    let mut positive = vec![0usize; labels.len()];

    for (value, is_positive) in rows {
        if let Some(i) = labels.iter().position(|l| matches(*value, l.as_str())) {
            all[i] += 1;
            if *is_positive {
                positive[i] += 1;
            }
        }
    }

    finish(attribute, labels.to_vec(), all, positive)
}

fn count_numeric(attribute: &str, rows: &[(&Value, bool)]) -> DistributionSummary {
    let observed: Vec<(f64, bool)> = rows
        .iter()
        .filter_map(|(v, p)| v.as_f64().filter(|x| x.is_finite()).map(|x| (x, *p)))
        .collect();

    let Some(bucketing) = Bucketing::from_values(observed.iter().map(|(x, _)| *x)) else {
        return finish(attribute, Vec::new(), Vec::new(), Vec::new());
    };

    let mut all = vec![0usize; bucketing.len()];
    let mut positive = vec![0usize; bucketing.len()];
    for (x, is_positive) in observed {
        let i = bucketing.bucket_of(x);
        all[i] += 1;
        if is_positive {
            positive[i] += 1;
        }
    }

    finish(attribute, bucketing.labels(), all, positive)
}

fn finish(attribute: &str, labels: Vec<String>, all: Vec<usize>, positive: Vec<usize>) -> DistributionSummary {
    let negative = all.iter().zip(&positive).map(|(a, p)| a - p).collect();
    DistributionSummary {
        attribute: attribute.to_string(),
        labels,
        negative,
        positive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AttributeMeta, Dataset, Schema};
    use crate::preprocessing::clean;

    fn sex_pep(rows: &[(&str, &str)]) -> CleanDataset {
        let schema = Schema::new(vec![
            AttributeMeta::categorical("sex", ["MALE", "FEMALE"]),
            AttributeMeta::categorical("pep", ["YES", "NO"]),
        ]);
        let records = rows
            .iter()
            .map(|(s, p)| vec![Value::Text(s.to_string()), Value::Text(p.to_string())])
            .collect();
        clean(&Dataset::new("bank", schema, records).unwrap())
    }

    fn numeric(values: &[f64], pep: &[bool]) -> CleanDataset {
        let schema = Schema::new(vec![
            AttributeMeta::numeric("age"),
            AttributeMeta::categorical("pep", ["YES", "NO"]),
        ]);
        let records = values
            .iter()
            .zip(pep)
            .map(|(v, p)| {
                vec![
                    Value::Number(*v),
                    Value::Text(if *p { "YES" } else { "NO" }.to_string()),
                ]
            })
            .collect();
        clean(&Dataset::new("bank", schema, records).unwrap())
    }

    #[test]
    fn test_categorical_example() {
        let mut rows = Vec::new();
        rows.extend(std::iter::repeat(("MALE", "YES")).take(4));
        rows.extend(std::iter::repeat(("FEMALE", "YES")).take(2));
        rows.extend(std::iter::repeat(("MALE", "NO")).take(3));
        rows.push(("FEMALE", "NO"));

        let summary = summarize(&sex_pep(&rows), "pep", "sex").unwrap();
        assert_eq!(summary.labels, vec!["MALE", "FEMALE"]);
        assert_eq!(summary.negative, vec![3, 1]);
        assert_eq!(summary.positive, vec![4, 2]);
        assert_eq!(summary.total(), 10);
    }

    #[test]
    fn test_boolean_attribute_uses_declared_order() {
        let summary = summarize(&sex_pep(&[("MALE", "YES"), ("MALE", "NO")]), "pep", "pep").unwrap();
        assert_eq!(summary.labels, vec!["YES", "NO"]);
        assert_eq!(summary.positive, vec![1, 0]);
        assert_eq!(summary.negative, vec![0, 1]);
    }

    #[test]
    fn test_wide_numeric_range() {
        let values: Vec<f64> = (18..=70).map(f64::from).collect();
        let pep: Vec<bool> = values.iter().map(|v| *v > 40.0).collect();
        let summary = summarize(&numeric(&values, &pep), "pep", "age").unwrap();

        assert_eq!(summary.len(), 8);
        assert_eq!(summary.labels[0], "18-23");
        assert_eq!(summary.total(), values.len());
    }

    #[test]
    fn test_narrow_numeric_range() {
        let summary = summarize(&numeric(&[0.0, 1.0, 3.0, 3.0], &[true, false, true, false]), "pep", "age").unwrap();
        assert_eq!(summary.labels, vec!["0", "1", "2", "3"]);
        assert_eq!(summary.positive, vec![1, 0, 0, 1]);
        assert_eq!(summary.negative, vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_constant_numeric_single_bucket() {
        let summary = summarize(&numeric(&[5.0, 5.0, 5.0], &[true, false, true]), "pep", "age").unwrap();
        assert_eq!(summary.labels, vec!["5"]);
        assert_eq!(summary.positive, vec![2]);
        assert_eq!(summary.negative, vec![1]);
    }

    #[test]
    fn test_empty_dataset() {
        let summary = summarize(&sex_pep(&[]), "pep", "sex").unwrap();
        assert!(summary.is_empty());
        assert!(summary.negative.is_empty());
        assert!(summary.positive.is_empty());
    }

    #[test]
    fn test_unknown_attribute() {
        let err = summarize(&sex_pep(&[("MALE", "YES")]), "pep", "salary").unwrap_err();
        assert!(matches!(err, BankTreeError::UnknownAttribute(name) if name == "salary"));
    }

    #[test]
    fn test_invalid_label_column() {
        let data = sex_pep(&[("MALE", "YES")]);
        assert!(matches!(
            summarize(&data, "sex", "sex"),
            Err(BankTreeError::InvalidLabelColumn { .. })
        ));
        assert!(matches!(
            summarize(&data, "missing", "sex"),
            Err(BankTreeError::InvalidLabelColumn { .. })
        ));
    }
}
