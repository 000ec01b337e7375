//! bank-tree - decision-tree explorer for the bank-marketing dataset
//!
//! Loads the training and holdout ARFF files, decodes YES/NO columns, summarizes
//! attribute distributions against the PEP label, one-hot encodes both tables
//! and fits an entropy decision tree scored on the holdout table.
//!
//! # Modules
//!
//! ## Data
//! - [`data`] - ARFF loading, schema and dataset types
//! - [`preprocessing`] - YES/NO cleaning and one-hot encoding
//! - [`cache`] - Per-session memoization of preparation results
//!
//! ## Analysis
//! - [`summary`] - Attribute distribution binning
//! - [`training`] - Decision tree, training engine and metrics
//! - [`report`] - Chart primitives and training reports
//!
//! ## Host
//! - [`config`] - Explorer configuration
//! - [`session`] - Session state behind every interaction
//! - [`cli`] - Command-line interface

pub mod error;

pub mod data;
pub mod preprocessing;
pub mod cache;

pub mod summary;
pub mod training;
pub mod report;

pub mod config;
pub mod session;
pub mod cli;

pub use error::{BankTreeError, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::ExplorerConfig;
    pub use crate::data::{load_arff, parse_arff, AttributeDomain, AttributeMeta, Dataset, Schema, Value};
    pub use crate::error::{BankTreeError, Result};
    pub use crate::preprocessing::{
        check_alignment, clean, encode, encode_with_layout, prepare_pair, CategoryUniverse, CleanDataset,
        EncodedDataset, EncodingLayout,
    };
    pub use crate::report::{BarChart, TrainingReport};
    pub use crate::session::ExplorerSession;
    pub use crate::summary::{summarize, DistributionSummary};
    pub use crate::training::{Criterion, DecisionTree, TrainedTree, TrainingConfig, TreeTrainer};
}
