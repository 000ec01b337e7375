//! Explorer session: the per-host state behind every interaction
//!
//! A session owns the raw training and holdout datasets, its config and a
//! preparation cache. Each operation derives what it needs through the cache,
//! so repeated requests reuse earlier cleaning and encoding work.

use crate::cache::{CacheStats, PreparationCache};
use crate::config::ExplorerConfig;
use crate::data::{load_arff, Dataset};
use crate::error::Result;
use crate::preprocessing::{
    check_alignment, check_schemas, CategoryUniverse, CleanDataset, EncodedDataset, EncodingLayout,
};
use crate::report::{BarChart, TrainingReport};
use crate::summary::{summarize, DistributionSummary};
use crate::training::TreeTrainer;
use polars::prelude::*;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// One attribute as listed for the user
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AttributeInfo {
    pub name: String,
    pub domain: String,
}

pub struct ExplorerSession {
    config: ExplorerConfig,
    train: Dataset,
    holdout: Dataset,
    cache: PreparationCache,
}

impl ExplorerSession {
    /// Start a session over two datasets sharing a schema
    pub fn new(train: Dataset, holdout: Dataset, config: ExplorerConfig) -> Result<Self> {
        config.validate()?;
        check_schemas(train.schema(), holdout.schema())?;
        info!(
            relation = train.relation(),
            train_rows = train.n_rows(),
            holdout_rows = holdout.n_rows(),
            attributes = train.n_columns(),
            "Session ready"
        );
        Ok(Self {
            config,
            train,
            holdout,
            cache: PreparationCache::new(),
        })
    }

    /// Load both ARFF files and start a session
    pub fn from_files(
        train_path: impl AsRef<Path>,
        holdout_path: impl AsRef<Path>,
        config: ExplorerConfig,
    ) -> Result<Self> {
        let train = load_arff(train_path)?;
        let holdout = load_arff(holdout_path)?;
        Self::new(train, holdout, config)
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn training_data(&self) -> &Dataset {
        &self.train
    }

    pub fn holdout_data(&self) -> &Dataset {
        &self.holdout
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Attributes of the cleaned training table
    pub fn attributes(&mut self) -> Vec<AttributeInfo> {
        let cleaned = self.cleaned_train();
        let attributes = cleaned
            .schema()
            .iter()
            .map(|a| AttributeInfo {
                name: a.name.clone(),
                domain: a.domain.describe(),
            })
            .collect();
        attributes
    }

    fn cleaned_train(&mut self) -> Arc<CleanDataset> {
        self.cache.clean(&self.train)
    }

    fn cleaned_holdout(&mut self) -> Arc<CleanDataset> {
        self.cache.clean(&self.holdout)
    }

    /// First rows of the one-hot encoded training table
    pub fn preview(&mut self, rows: Option<usize>) -> Result<DataFrame> {
        let (train, _) = self.encoded_pair()?;
        train.preview(rows.unwrap_or(self.config.preview_rows))
    }

    /// First rows of the training table as loaded
    pub fn preview_raw(&self, rows: Option<usize>) -> Result<DataFrame> {
        self.train.preview(rows.unwrap_or(self.config.preview_rows))
    }

    /// Positive/negative counts per bucket of `attribute` in the training table
    pub fn summarize(&mut self, attribute: &str) -> Result<DistributionSummary> {
        let cleaned = self.cleaned_train();
        summarize(&cleaned, &self.config.label_column, attribute)
    }

    pub fn distribution_chart(&mut self, attribute: &str) -> Result<BarChart> {
        Ok(BarChart::from_summary(&self.summarize(attribute)?))
    }

    /// Encoded training and holdout tables with matching columns
    pub fn encoded_pair(&mut self) -> Result<(Arc<EncodedDataset>, Arc<EncodedDataset>)> {
        let train_clean = self.cleaned_train();
        let holdout_clean = self.cleaned_holdout();

        let (train_layout, holdout_layout) = match self.config.category_universe {
            CategoryUniverse::Observed => (
                EncodingLayout::observed(&train_clean),
                EncodingLayout::observed(&holdout_clean),
            ),
            CategoryUniverse::Declared => {
                let layout = EncodingLayout::from_schema(train_clean.schema());
                (layout.clone(), layout)
            }
        };

        let train = self.cache.encode(&train_clean, &train_layout)?;
        let holdout = self.cache.encode(&holdout_clean, &holdout_layout)?;
        check_alignment(&train, &holdout)?;
        Ok((train, holdout))
    }

    /// Train on the training table and evaluate on the holdout table
    ///
    /// `max_depth` overrides the configured depth for this request only.
    pub fn train(&mut self, max_depth: Option<usize>) -> Result<TrainingReport> {
        let mut training = self.config.training();
        if let Some(depth) = max_depth {
            training = training.with_max_depth(depth);
        }
        training.validate()?;
        let depth = training.max_depth;

        let (train, holdout) = self.encoded_pair()?;
        let trained = TreeTrainer::new(training).fit(&train, &self.config.label_column)?;
        let evaluation = trained.evaluate(&holdout)?;

        TrainingReport::new(&trained, depth, &evaluation)
    }

    /// Write the encoded training table as CSV
    pub fn export_encoded(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let (train, _) = self.encoded_pair()?;
        let mut df = train.to_dataframe()?;
        let mut file = std::fs::File::create(path.as_ref())?;
        CsvWriter::new(&mut file).finish(&mut df)?;
        info!(
            path = %path.as_ref().display(),
            rows = df.height(),
            columns = df.width(),
            "Exported encoded table"
        );
        Ok(df.height())
    }
}
