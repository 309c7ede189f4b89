//! Construction-time configuration for a [`ReduceTable`](crate::ReduceTable).
//!
//! A [`TableConfig`] can be built in code with the `with_*` methods or loaded
//! from JSON. Fields missing from the JSON document take their default value.
//!
//! ```
//! use spillreduce::TableConfig;
//!
//! let cfg = TableConfig::default()
//!     .with_partition_count(4)
//!     .with_spill_threshold(1_000);
//! assert_eq!(cfg.buckets_per_partition(), 25);
//! assert!(cfg.validate().is_ok());
//! ```

use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default number of chain slots in a table.
pub const DEFAULT_BUCKET_CAPACITY: usize = 100;

/// Default number of resident items tolerated before the largest partition spills.
pub const DEFAULT_SPILL_THRESHOLD: usize = 3;

/// Options recognized when constructing a table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Number of logical partitions. Must satisfy `1 <= partition_count <= bucket_capacity`.
    pub partition_count: usize,
    /// Resident-item count above which the largest partition is evicted.
    pub spill_threshold: usize,
    /// Total number of chain slots, fixed for the table's lifetime.
    pub bucket_capacity: usize,
    /// Emit per-entry `trace` events. Can be flipped later with
    /// [`ReduceTable::set_trace`](crate::ReduceTable::set_trace).
    pub trace: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            partition_count: 1,
            spill_threshold: DEFAULT_SPILL_THRESHOLD,
            bucket_capacity: DEFAULT_BUCKET_CAPACITY,
            trace: false,
        }
    }
}

impl TableConfig {
    /// Config with `partition_count` partitions and defaults elsewhere.
    #[must_use]
    pub fn new(partition_count: usize) -> Self {
        Self {
            partition_count,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_partition_count(mut self, partition_count: usize) -> Self {
        self.partition_count = partition_count;
        self
    }

    #[must_use]
    pub fn with_spill_threshold(mut self, spill_threshold: usize) -> Self {
        self.spill_threshold = spill_threshold;
        self
    }

    #[must_use]
    pub fn with_bucket_capacity(mut self, bucket_capacity: usize) -> Self {
        self.bucket_capacity = bucket_capacity;
        self
    }

    #[must_use]
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Check the partition/bucket relationship.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BucketCapacity`] for a zero capacity and
    /// [`ConfigError::PartitionCount`] when the partition count is zero or
    /// exceeds the capacity. One bucket per partition is allowed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket_capacity == 0 {
            return Err(ConfigError::BucketCapacity);
        }
        if self.partition_count == 0 || self.partition_count > self.bucket_capacity {
            return Err(ConfigError::PartitionCount {
                partition_count: self.partition_count,
                bucket_capacity: self.bucket_capacity,
            });
        }
        Ok(())
    }

    /// Number of buckets owned by each partition.
    ///
    /// Any remainder of `bucket_capacity / partition_count` is left unused.
    /// Returns 0 for a configuration with no partitions.
    #[must_use]
    pub fn buckets_per_partition(&self) -> usize {
        self.bucket_capacity.checked_div(self.partition_count).unwrap_or(0)
    }

    /// Parse a config from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or describes an invalid config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json).context("parsing table config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load a config from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its contents are invalid.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading table config {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("loading {}", path.display()))
    }

    /// Serialize this config as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
