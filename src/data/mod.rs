//! Dataset model and loading
//!
//! - [`schema`] - attribute metadata with tagged domains
//! - [`dataset`] - records and the `Dataset` container
//! - [`arff`] - ARFF parsing

pub mod arff;
pub mod dataset;
pub mod schema;

pub use arff::{load_arff, parse_arff};
pub use dataset::{Dataset, Record, Value};
pub use schema::{AttributeDomain, AttributeMeta, Schema};
