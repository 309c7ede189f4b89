//! Error types for table construction.
//!
//! Steady-state operations (`insert`, `flush`, spilling) never fail: key
//! collisions are folded and budget overflow triggers a spill. The only
//! caller-visible failure is an invalid [`TableConfig`](crate::TableConfig),
//! reported before any bucket storage is allocated.

use thiserror::Error;

/// Reasons a [`TableConfig`](crate::TableConfig) is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The partition count is zero or larger than the bucket capacity.
    #[error("partition count must be between 1 and {bucket_capacity} (the bucket capacity), got {partition_count}")]
    PartitionCount {
        partition_count: usize,
        bucket_capacity: usize,
    },

    /// The table must have at least one bucket.
    #[error("bucket capacity must be at least 1")]
    BucketCapacity,
}
