//! One-hot encoding of clean datasets into numeric matrices

use super::cleaner::{clean, CleanDataset};
use crate::data::{AttributeDomain, Dataset, Schema, Value};
use crate::error::{BankTreeError, Result};
use ndarray::{Array2, ArrayView1, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};

/// Which category values get an indicator column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryUniverse {
    /// Only categories present in the data being encoded
    #[default]
    Observed,
    /// Every category declared in the schema
    Declared,
}

/// Provenance of one encoded column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncodedColumn {
    /// Numeric or boolean source column copied as is
    Passthrough { source: String },
    /// 0/1 indicator for one category of a categorical source column
    Indicator { source: String, category: String },
}

impl EncodedColumn {
    pub fn name(&self) -> String {
        match self {
            EncodedColumn::Passthrough { source } => source.clone(),
            EncodedColumn::Indicator { source, category } => format!("{}_{}", source, category),
        }
    }

    pub fn source(&self) -> &str {
        match self {
            EncodedColumn::Passthrough { source } | EncodedColumn::Indicator { source, .. } => source,
        }
    }
}

/// Ordered list of encoded columns
///
/// Columns are sorted by source column name, then by category value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncodingLayout {
    columns: Vec<EncodedColumn>,
}

impl EncodingLayout {
    /// Layout with one indicator per category observed in `data`
    pub fn observed(data: &CleanDataset) -> Self {
        Self::build(data.schema(), |idx, _| {
            data.records()
                .iter()
                .filter_map(|r| r[idx].as_str())
                .map(str::to_string)
                .collect()
        })
    }

    /// Layout with one indicator per declared category
    pub fn from_schema(schema: &Schema) -> Self {
        Self::build(schema, |_, labels| labels.iter().cloned().collect())
    }

    pub fn for_universe(data: &CleanDataset, universe: CategoryUniverse) -> Self {
        match universe {
            CategoryUniverse::Observed => Self::observed(data),
            CategoryUniverse::Declared => Self::from_schema(data.schema()),
        }
    }

    fn build<F>(schema: &Schema, categories: F) -> Self
    where
        F: Fn(usize, &[String]) -> BTreeSet<String>,
    {
        let mut order: Vec<(usize, &str)> = schema
            .iter()
            .enumerate()
            .map(|(i, a)| (i, a.name.as_str()))
            .collect();
        order.sort_by(|a, b| a.1.cmp(b.1));

        let mut columns = Vec::new();
        for (idx, name) in order {
            match &schema.attributes()[idx].domain {
                AttributeDomain::Numeric | AttributeDomain::Boolean { .. } => {
                    columns.push(EncodedColumn::Passthrough {
                        source: name.to_string(),
                    });
                }
                AttributeDomain::Categorical(labels) => {
                    for category in categories(idx, labels) {
                        columns.push(EncodedColumn::Indicator {
                            source: name.to_string(),
                            category,
                        });
                    }
                }
                AttributeDomain::Text => {
                    warn!(column = %name, "Skipping string column during encoding");
                }
            }
        }
        Self { columns }
    }

    pub fn columns(&self) -> &[EncodedColumn] {
        &self.columns
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(EncodedColumn::name).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Fully numeric table used as model input
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedDataset {
    layout: EncodingLayout,
    names: Vec<String>,
    data: Array2<f64>,
}

impl EncodedDataset {
    pub fn layout(&self) -> &EncodingLayout {
        &self.layout
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_columns(&self) -> usize {
        self.data.ncols()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Result<ArrayView1<'_, f64>> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| BankTreeError::UnknownAttribute(name.to_string()))?;
        Ok(self.data.column(idx))
    }

    /// Split into (feature names, feature matrix) leaving out every column derived from `source`
    pub fn features_without(&self, source: &str) -> (Vec<String>, Array2<f64>) {
        let keep: Vec<usize> = self
            .layout
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.source() != source)
            .map(|(i, _)| i)
            .collect();
        let names = keep.iter().map(|&i| self.names[i].clone()).collect();
        (names, self.data.select(Axis(1), &keep))
    }

    /// Build a polars frame for display or export
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let columns: Vec<Column> = self
            .names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                Series::new(name.as_str().into(), self.data.column(i).to_vec()).into()
            })
            .collect();
        Ok(DataFrame::new(columns)?)
    }

    pub fn preview(&self, n: usize) -> Result<DataFrame> {
        Ok(self.to_dataframe()?.head(Some(n)))
    }
}

/// One-hot encode with an indicator per observed category
pub fn encode(data: &CleanDataset) -> Result<EncodedDataset> {
    encode_with_layout(data, &EncodingLayout::observed(data))
}

/// Encode against a fixed layout
///
/// Fails with `SchemaMismatch` when the data holds a category the layout has no
/// column for, and with `DataError` when a layout column has no usable source.
pub fn encode_with_layout(data: &CleanDataset, layout: &EncodingLayout) -> Result<EncodedDataset> {
    let schema = data.schema();

    let mut sources = Vec::with_capacity(layout.len());
    for column in layout.columns() {
        let idx = schema.index_of(column.source()).ok_or_else(|| {
            BankTreeError::DataError(format!("layout column '{}' has no source column", column.name()))
        })?;
        let domain = &schema.attributes()[idx].domain;
        let compatible = match column {
            EncodedColumn::Passthrough { .. } => {
                matches!(domain, AttributeDomain::Numeric | AttributeDomain::Boolean { .. })
            }
            EncodedColumn::Indicator { .. } => domain.is_categorical(),
        };
        if !compatible {
            return Err(BankTreeError::DataError(format!(
                "layout column '{}' does not fit source domain {}",
                column.name(),
                domain.describe()
            )));
        }
        sources.push(idx);
    }

    let unregistered = unregistered_categories(data, layout);
    if !unregistered.is_empty() {
        return Err(BankTreeError::SchemaMismatch {
            missing_in_holdout: Vec::new(),
            missing_in_training: unregistered,
        });
    }

    let records = data.records();
    let columns = layout.columns();
    let matrix = Array2::from_shape_fn((records.len(), columns.len()), |(r, c)| {
        let value = &records[r][sources[c]];
        match &columns[c] {
            EncodedColumn::Passthrough { .. } => value.as_f64().unwrap_or(f64::NAN),
            EncodedColumn::Indicator { category, .. } => match value {
                Value::Text(s) if s == category => 1.0,
                _ => 0.0,
            },
        }
    });

    debug!(
        rows = matrix.nrows(),
        columns = matrix.ncols(),
        "Encoded dataset"
    );

    Ok(EncodedDataset {
        layout: layout.clone(),
        names: layout.names(),
        data: matrix,
    })
}

/// Encoded names of categories present in the data but absent from the layout
fn unregistered_categories(data: &CleanDataset, layout: &EncodingLayout) -> Vec<String> {
    let registered: HashSet<(&str, &str)> = layout
        .columns()
        .iter()
        .filter_map(|c| match c {
            EncodedColumn::Indicator { source, category } => Some((source.as_str(), category.as_str())),
            EncodedColumn::Passthrough { .. } => None,
        })
        .collect();

    let mut missing = BTreeSet::new();
    for (idx, attr) in data.schema().iter().enumerate() {
        if !attr.domain.is_categorical() {
            continue;
        }
        for record in data.records() {
            if let Some(category) = record[idx].as_str() {
                if !registered.contains(&(attr.name.as_str(), category)) {
                    missing.insert(format!("{}_{}", attr.name, category));
                }
            }
        }
    }
    missing.into_iter().collect()
}

/// Ensure training and holdout encodings have the same columns in the same order
pub fn check_alignment(train: &EncodedDataset, holdout: &EncodedDataset) -> Result<()> {
    if train.column_names() == holdout.column_names() {
        return Ok(());
    }

    let train_set: HashSet<&String> = train.column_names().iter().collect();
    let holdout_set: HashSet<&String> = holdout.column_names().iter().collect();

    let mut missing_in_holdout: Vec<String> = train_set
        .difference(&holdout_set)
        .map(|s| s.to_string())
        .collect();
    let mut missing_in_training: Vec<String> = holdout_set
        .difference(&train_set)
        .map(|s| s.to_string())
        .collect();
    missing_in_holdout.sort();
    missing_in_training.sort();

    Err(BankTreeError::SchemaMismatch {
        missing_in_holdout,
        missing_in_training,
    })
}

/// Training and holdout tables prepared the same way
#[derive(Debug, Clone)]
pub struct PreparedPair {
    pub train_clean: CleanDataset,
    pub holdout_clean: CleanDataset,
    pub train: EncodedDataset,
    pub holdout: EncodedDataset,
}

/// Clean and encode both datasets, then check that the encodings line up
pub fn prepare_pair(train: &Dataset, holdout: &Dataset, universe: CategoryUniverse) -> Result<PreparedPair> {
    check_schemas(train.schema(), holdout.schema())?;

    let train_clean = clean(train);
    let holdout_clean = clean(holdout);

    let (train_encoded, holdout_encoded) = match universe {
        CategoryUniverse::Observed => (encode(&train_clean)?, encode(&holdout_clean)?),
        CategoryUniverse::Declared => {
            let layout = EncodingLayout::from_schema(train_clean.schema());
            (
                encode_with_layout(&train_clean, &layout)?,
                encode_with_layout(&holdout_clean, &layout)?,
            )
        }
    };
    check_alignment(&train_encoded, &holdout_encoded)?;

    Ok(PreparedPair {
        train_clean,
        holdout_clean,
        train: train_encoded,
        holdout: holdout_encoded,
    })
}

/// Training and holdout must declare the same attributes
pub fn check_schemas(train: &Schema, holdout: &Schema) -> Result<()> {
    if train.attributes() == holdout.attributes() {
        return Ok(());
    }

    let train_names: HashSet<&str> = train.names().into_iter().collect();
    let holdout_names: HashSet<&str> = holdout.names().into_iter().collect();
    let mut missing_in_holdout: Vec<String> = train
        .iter()
        .filter(|a| holdout.get(&a.name) != Some(*a))
        .map(|a| a.name.clone())
        .collect();
    let mut missing_in_training: Vec<String> = holdout_names
        .difference(&train_names)
        .map(|s| s.to_string())
        .collect();
    missing_in_holdout.sort();
    missing_in_training.sort();

    Err(BankTreeError::SchemaMismatch {
        missing_in_holdout,
        missing_in_training,
    })
}
