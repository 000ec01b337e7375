//! Boolean decoding of YES/NO coded columns

use crate::data::{AttributeDomain, AttributeMeta, Dataset, Schema, Value};
use std::ops::Deref;
use tracing::debug;

const TRUE_LABEL: &str = "YES";
const FALSE_LABEL: &str = "NO";

/// A dataset whose YES/NO coded columns have been decoded to booleans
#[derive(Debug, Clone, PartialEq)]
pub struct CleanDataset {
    inner: Dataset,
}

impl CleanDataset {
    pub fn as_dataset(&self) -> &Dataset {
        &self.inner
    }

    pub fn into_inner(self) -> Dataset {
        self.inner
    }
}

impl Deref for CleanDataset {
    type Target = Dataset;

    fn deref(&self) -> &Dataset {
        &self.inner
    }
}

/// Whether a domain is YES/NO coded: a non-empty declared label set drawn from {YES, NO}
pub fn is_yes_no_coded(domain: &AttributeDomain) -> bool {
    match domain {
        AttributeDomain::Categorical(labels) => {
            !labels.is_empty()
                && labels
                    .iter()
                    .all(|l| l == TRUE_LABEL || l == FALSE_LABEL)
        }
        _ => false,
    }
}

/// Labels of a `string` column whose observed values are all YES or NO
///
/// `None` when the column holds anything else or has no non-missing values.
/// Labels come back in YES, NO order, restricted to the ones present.
fn observed_yes_no_labels(dataset: &Dataset, column: usize) -> Option<Vec<String>> {
    let (mut seen_true, mut seen_false) = (false, false);
    for record in dataset.records() {
        match &record[column] {
            Value::Missing => {}
            value => match value.as_str() {
                Some(TRUE_LABEL) => seen_true = true,
                Some(FALSE_LABEL) => seen_false = true,
                _ => return None,
            },
        }
    }

    let labels: Vec<String> = [(TRUE_LABEL, seen_true), (FALSE_LABEL, seen_false)]
        .into_iter()
        .filter(|(_, seen)| *seen)
        .map(|(label, _)| label.to_string())
        .collect();
    (!labels.is_empty()).then_some(labels)
}

/// Boolean labels for a column that should be decoded, if any
fn boolean_labels(dataset: &Dataset, column: usize, domain: &AttributeDomain) -> Option<Vec<String>> {
    match domain {
        AttributeDomain::Categorical(labels) if is_yes_no_coded(domain) => Some(labels.clone()),
        AttributeDomain::Text => observed_yes_no_labels(dataset, column),
        _ => None,
    }
}

/// Decode YES/NO coded columns to booleans. Other columns pass through untouched.
///
/// Nominal columns are decoded when their declared label set is drawn from
/// {YES, NO}; `string` columns when every observed value is YES or NO.
/// Row and column counts never change, and cleaning a clean dataset is a no-op.
pub fn clean(dataset: &Dataset) -> CleanDataset {
    let decoded: Vec<Option<Vec<String>>> = dataset
        .schema()
        .iter()
        .enumerate()
        .map(|(i, attr)| boolean_labels(dataset, i, &attr.domain))
        .collect();

    if decoded.iter().all(Option::is_none) {
        return CleanDataset {
            inner: dataset.clone(),
        };
    }

    let attributes: Vec<AttributeMeta> = dataset
        .schema()
        .iter()
        .zip(&decoded)
        .map(|(attr, labels)| match labels {
            Some(labels) => {
                debug!(column = %attr.name, "Decoding YES/NO column to boolean");
                AttributeMeta::new(
                    attr.name.clone(),
                    AttributeDomain::Boolean {
                        labels: labels.clone(),
                    },
                )
            }
            None => attr.clone(),
        })
        .collect();

    let records = dataset
        .records()
        .iter()
        .map(|record| {
            record
                .iter()
                .zip(&decoded)
                .map(|(value, labels)| if labels.is_some() { decode_value(value) } else { value.clone() })
                .collect()
        })
        .collect();

    CleanDataset {
        inner: dataset.with_parts(Schema::new(attributes), records),
    }
}

fn decode_value(value: &Value) -> Value {
    match value.as_str() {
        Some(TRUE_LABEL) => Value::Bool(true),
        Some(FALSE_LABEL) => Value::Bool(false),
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank_sample() -> Dataset {
        let schema = Schema::new(vec![
            AttributeMeta::numeric("age"),
            AttributeMeta::categorical("married", ["NO", "YES"]),
            AttributeMeta::categorical("region", ["INNER_CITY", "TOWN"]),
            AttributeMeta::categorical("pep", ["YES", "NO"]),
        ]);
        Dataset::new(
            "bank",
            schema,
            vec![
                vec![
                    Value::Number(48.0),
                    Value::Text("NO".into()),
                    Value::Text("TOWN".into()),
                    Value::Text("YES".into()),
                ],
                vec![
                    Value::Number(40.0),
                    Value::Missing,
                    Value::Text("INNER_CITY".into()),
                    Value::Text("NO".into()),
                ],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_decodes_yes_no_columns() {
        let cleaned = clean(&bank_sample());
        assert_eq!(cleaned.value(0, "married"), Some(&Value::Bool(false)));
        assert_eq!(cleaned.value(1, "married"), Some(&Value::Missing));
        assert_eq!(cleaned.value(0, "pep"), Some(&Value::Bool(true)));
        assert_eq!(
            cleaned.schema().get("pep").unwrap().domain,
            AttributeDomain::Boolean {
                labels: vec!["YES".into(), "NO".into()]
            }
        );
    }

    #[test]
    fn test_other_columns_untouched() {
        let raw = bank_sample();
        let cleaned = clean(&raw);
        assert_eq!(cleaned.value(0, "region"), raw.value(0, "region"));
        assert_eq!(cleaned.value(1, "age"), raw.value(1, "age"));
        assert_eq!(cleaned.n_rows(), raw.n_rows());
        assert_eq!(cleaned.n_columns(), raw.n_columns());
    }

    #[test]
    fn test_clean_is_idempotent() {
        let once = clean(&bank_sample());
        let twice = clean(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_yes_no_detection() {
        assert!(is_yes_no_coded(&AttributeDomain::Categorical(vec!["YES".into()])));
        assert!(!is_yes_no_coded(&AttributeDomain::Categorical(vec![])));
        assert!(!is_yes_no_coded(&AttributeDomain::Categorical(vec![
            "YES".into(),
            "MAYBE".into()
        ])));
        assert!(!is_yes_no_coded(&AttributeDomain::Numeric));
    }

    fn flags(values: &[Value]) -> Dataset {
        let schema = Schema::new(vec![AttributeMeta::new("flag", AttributeDomain::Text)]);
        Dataset::new("flags", schema, values.iter().map(|v| vec![v.clone()]).collect()).unwrap()
    }

    #[test]
    fn test_decodes_observed_yes_no_strings() {
        let cleaned = clean(&flags(&[
            Value::Text("NO".into()),
            Value::Missing,
            Value::Text("YES".into()),
        ]));
        assert_eq!(
            cleaned.schema().get("flag").unwrap().domain,
            AttributeDomain::Boolean {
                labels: vec!["YES".into(), "NO".into()]
            }
        );
        assert_eq!(cleaned.value(0, "flag"), Some(&Value::Bool(false)));
        assert_eq!(cleaned.value(1, "flag"), Some(&Value::Missing));
        assert_eq!(cleaned.value(2, "flag"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_other_strings_stay_text() {
        let mixed = flags(&[Value::Text("YES".into()), Value::Text("yes".into())]);
        assert_eq!(clean(&mixed).as_dataset(), &mixed);

        let empty = flags(&[Value::Missing]);
        assert_eq!(clean(&empty).schema().get("flag").unwrap().domain, AttributeDomain::Text);
    }
}
