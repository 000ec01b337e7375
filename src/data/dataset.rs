//! In-memory dataset: schema plus positional records

use super::schema::{AttributeDomain, Schema};
use crate::error::{BankTreeError, Result};
use polars::prelude::*;
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single raw or decoded cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Text(String),
    Number(f64),
    Bool(bool),
    Missing,
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Text(s) => s.hash(state),
            Value::Number(v) => v.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Missing => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{}", s),
            Value::Number(v) => write!(f, "{}", v),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Missing => write!(f, "?"),
        }
    }
}

/// One observation, values in schema order
pub type Record = Vec<Value>;

/// Ordered records sharing one schema
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    relation: String,
    schema: Schema,
    records: Vec<Record>,
}

impl Dataset {
    /// Create a dataset, checking every record against the schema width
    pub fn new(relation: impl Into<String>, schema: Schema, records: Vec<Record>) -> Result<Self> {
        if let Some((row, record)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != schema.len())
        {
            return Err(BankTreeError::ShapeError {
                expected: format!("{} values per record", schema.len()),
                actual: format!("{} values in record {}", record.len(), row),
            });
        }

        Ok(Self {
            relation: relation.into(),
            schema,
            records,
        })
    }

    pub fn relation(&self) -> &str {
        &self.relation
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn n_rows(&self) -> usize {
        self.records.len()
    }

    pub fn n_columns(&self) -> usize {
        self.schema.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Value of the named attribute in the given row
    pub fn value(&self, row: usize, name: &str) -> Option<&Value> {
        let idx = self.schema.index_of(name)?;
        self.records.get(row).map(|r| &r[idx])
    }

    /// Iterate over one column
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Value> + '_> {
        let idx = self
            .schema
            .index_of(name)
            .ok_or_else(|| BankTreeError::UnknownAttribute(name.to_string()))?;
        Ok(self.records.iter().map(move |r| &r[idx]))
    }

    /// Deterministic hash over relation, schema and every value
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.relation.hash(&mut hasher);
        self.schema.attributes().hash(&mut hasher);
        self.records.hash(&mut hasher);
        hasher.finish()
    }

    /// Build a polars frame for display
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let columns: Vec<Column> = self
            .schema
            .iter()
            .enumerate()
            .map(|(idx, attr)| {
                let name: PlSmallStr = attr.name.as_str().into();
                let series = match &attr.domain {
                    AttributeDomain::Numeric => {
                        let values: Vec<Option<f64>> =
                            self.records.iter().map(|r| r[idx].as_f64()).collect();
                        Series::new(name, values)
                    }
                    AttributeDomain::Boolean { .. } => {
                        let values: Vec<Option<bool>> =
                            self.records.iter().map(|r| r[idx].as_bool()).collect();
                        Series::new(name, values)
                    }
                    AttributeDomain::Categorical(_) | AttributeDomain::Text => {
                        let values: Vec<Option<&str>> =
                            self.records.iter().map(|r| r[idx].as_str()).collect();
                        Series::new(name, values)
                    }
                };
                series.into()
            })
            .collect();

        Ok(DataFrame::new(columns)?)
    }

    /// First `n` rows as a polars frame
    pub fn preview(&self, n: usize) -> Result<DataFrame> {
        Ok(self.to_dataframe()?.head(Some(n)))
    }

    /// Replace schema and records, keeping the relation name
    pub(crate) fn with_parts(&self, schema: Schema, records: Vec<Record>) -> Self {
        Self {
            relation: self.relation.clone(),
            schema,
            records,
        }
    }
}
