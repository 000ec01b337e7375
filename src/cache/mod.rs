//! Memoization of preparation results
//!
//! Cleaning and encoding are deterministic, so their results are kept per
//! dataset content hash and handed out as shared references. The cache is
//! owned by one session; nothing here is global.

use crate::data::Dataset;
use crate::error::Result;
use crate::preprocessing::{clean, encode_with_layout, CleanDataset, EncodedDataset, EncodingLayout};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::debug;

/// Hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// A memoized result together with the input it was computed from
#[derive(Debug)]
struct Entry<S, T> {
    source: S,
    value: Arc<T>,
}

/// Per-session table of cleaned and encoded datasets
///
/// Keys are content hashes; a hit only counts when the stored source equals
/// the requested one, so a colliding hash recomputes instead of returning
/// another dataset's result.
#[derive(Debug, Default)]
pub struct PreparationCache {
    cleaned: HashMap<u64, Entry<Dataset, CleanDataset>>,
    encoded: HashMap<(u64, u64), Entry<(CleanDataset, EncodingLayout), EncodedDataset>>,
    hits: u64,
    misses: u64,
}

impl PreparationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cleaned form of `dataset`, computed at most once per distinct content
    pub fn clean(&mut self, dataset: &Dataset) -> Arc<CleanDataset> {
        self.clean_keyed(dataset.content_hash(), dataset)
    }

    fn clean_keyed(&mut self, key: u64, dataset: &Dataset) -> Arc<CleanDataset> {
        match self.cleaned.get(&key) {
            Some(entry) if entry.source == *dataset => {
                self.hits += 1;
                debug!(key, "Clean cache hit");
                return Arc::clone(&entry.value);
            }
            Some(_) => debug!(key, "Clean cache key collision, recomputing"),
            None => {}
        }

        self.misses += 1;
        debug!(key, rows = dataset.n_rows(), "Clean cache miss");
        let cleaned = Arc::new(clean(dataset));
        self.cleaned.insert(
            key,
            Entry {
                source: dataset.clone(),
                value: Arc::clone(&cleaned),
            },
        );
        cleaned
    }

    /// Encoded form of `data` under `layout`
    pub fn encode(&mut self, data: &CleanDataset, layout: &EncodingLayout) -> Result<Arc<EncodedDataset>> {
        self.encode_keyed((data.content_hash(), layout_hash(layout)), data, layout)
    }

    fn encode_keyed(
        &mut self,
        key: (u64, u64),
        data: &CleanDataset,
        layout: &EncodingLayout,
    ) -> Result<Arc<EncodedDataset>> {
        match self.encoded.get(&key) {
            Some(entry) if entry.source.0 == *data && entry.source.1 == *layout => {
                self.hits += 1;
                debug!(key = ?key, "Encode cache hit");
                return Ok(Arc::clone(&entry.value));
            }
            Some(_) => debug!(key = ?key, "Encode cache key collision, recomputing"),
            None => {}
        }

        self.misses += 1;
        let encoded = Arc::new(encode_with_layout(data, layout)?);
        self.encoded.insert(
            key,
            Entry {
                source: (data.clone(), layout.clone()),
                value: Arc::clone(&encoded),
            },
        );
        Ok(encoded)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.cleaned.len() + self.encoded.len(),
        }
    }

    pub fn clear(&mut self) {
        self.cleaned.clear();
        self.encoded.clear();
    }
}

fn layout_hash(layout: &EncodingLayout) -> u64 {
    let mut hasher = DefaultHasher::new();
    layout.hash(&mut hasher);
    hasher.finish()
}
