//! Dataset preparation
//!
//! - Boolean decoding of YES/NO coded columns ([`clean`])
//! - One-hot encoding into a numeric matrix ([`encode`], [`encode_with_layout`])
//! - Training/holdout alignment checks ([`check_alignment`], [`prepare_pair`])

mod cleaner;
mod encoder;

pub use cleaner::{clean, is_yes_no_coded, CleanDataset};
pub use encoder::{
    check_alignment, check_schemas, encode, encode_with_layout, prepare_pair, CategoryUniverse,
    EncodedColumn, EncodedDataset, EncodingLayout, PreparedPair,
};
