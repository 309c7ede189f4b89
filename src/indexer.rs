//! Two-level key routing.
//!
//! A key is hashed once. The hash picks an offset inside a partition's bucket
//! range, and that offset in turn picks the partition:
//!
//! ```text
//! partition_offset = hash(key) % buckets_per_partition
//! partition_id     = partition_offset % partition_count
//! global_index     = partition_offset + partition_id * buckets_per_partition
//! ```
//!
//! Partition and offset are therefore correlated rather than independently
//! uniform. The mapping is kept as-is so routing stays compatible with other
//! workers using the same `(bucket_capacity, partition_count)`.

use crate::config::TableConfig;
use std::collections::hash_map::DefaultHasher;
use std::hash::{BuildHasher, BuildHasherDefault, Hash};

/// Deterministic hasher used when none is supplied.
///
/// `DefaultHasher::new()` is unseeded, so separate tables (and separate
/// processes built with the same toolchain) route a key identically.
pub type DefaultRouteHasher = BuildHasherDefault<DefaultHasher>;

/// Where a key lives in the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BucketLocation {
    /// Partition the key belongs to.
    pub partition_id: usize,
    /// Index within the partition's bucket range.
    pub partition_offset: usize,
    /// Index within the whole bucket array.
    pub global_index: usize,
}

/// Maps keys to [`BucketLocation`]s for a fixed partitioning.
#[derive(Clone, Debug)]
pub struct PartitionIndexer<S = DefaultRouteHasher> {
    partition_count: usize,
    buckets_per_partition: usize,
    hasher: S,
}

impl PartitionIndexer<DefaultRouteHasher> {
    /// Indexer for a validated config using the default hasher.
    #[must_use]
    pub fn new(config: &TableConfig) -> Self {
        Self::with_hasher(config, DefaultRouteHasher::default())
    }
}

impl<S: BuildHasher> PartitionIndexer<S> {
    /// Indexer for a validated config using `hasher`.
    ///
    /// The config must have passed [`TableConfig::validate`]; routing with zero
    /// partitions is undefined.
    #[must_use]
    pub fn with_hasher(config: &TableConfig, hasher: S) -> Self {
        Self {
            partition_count: config.partition_count,
            buckets_per_partition: config.buckets_per_partition(),
            hasher,
        }
    }

    #[must_use]
    pub fn partition_count(&self) -> usize {
        self.partition_count
    }

    #[must_use]
    pub fn buckets_per_partition(&self) -> usize {
        self.buckets_per_partition
    }

    /// Global bucket indices owned by `partition_id`.
    #[must_use]
    pub fn partition_range(&self, partition_id: usize) -> std::ops::Range<usize> {
        let start = partition_id * self.buckets_per_partition;
        start..start + self.buckets_per_partition
    }

    /// Route `key` to its bucket.
    pub fn locate<K: Hash + ?Sized>(&self, key: &K) -> BucketLocation {
        // Truncation on 32-bit targets only narrows the hash; routing stays deterministic.
        #[allow(clippy::cast_possible_truncation)]
        let hashed = self.hasher.hash_one(key) as usize;
        Self::route(hashed, self.buckets_per_partition, self.partition_count)
    }

    fn route(
        hashed: usize,
        buckets_per_partition: usize,
        partition_count: usize,
    ) -> BucketLocation {
        let partition_offset = hashed % buckets_per_partition;
        let partition_id = partition_offset % partition_count;
        BucketLocation {
            partition_id,
            partition_offset,
            global_index: partition_offset + partition_id * buckets_per_partition,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_derives_partition_from_offset() {
        // 100 buckets, 2 partitions → 50 per partition.
        let loc = PartitionIndexer::<DefaultRouteHasher>::route(173, 50, 2);
        assert_eq!(loc.partition_offset, 23);
        assert_eq!(loc.partition_id, 1);
        assert_eq!(loc.global_index, 73);

        let loc = PartitionIndexer::<DefaultRouteHasher>::route(40, 50, 2);
        assert_eq!(loc.partition_offset, 40);
        assert_eq!(loc.partition_id, 0);
        assert_eq!(loc.global_index, 40);
    }

    #[test]
    fn single_bucket_partitions_always_land_in_partition_zero() {
        // With one bucket per partition the offset is always 0, so is the partition.
        let idx = PartitionIndexer::new(&TableConfig::new(100));
        for k in 0..500u32 {
            let loc = idx.locate(&k);
            assert_eq!(loc.partition_offset, 0);
            assert_eq!(loc.partition_id, 0);
            assert_eq!(loc.global_index, 0);
        }
    }

    #[test]
    fn global_index_stays_inside_partition_range() {
        for p in [1, 2, 3, 7, 10, 50] {
            let idx = PartitionIndexer::new(&TableConfig::new(p));
            for k in 0..1_000u64 {
                let loc = idx.locate(&k);
                assert!(loc.partition_id < p);
                assert!(idx.partition_range(loc.partition_id).contains(&loc.global_index));
            }
        }
    }
}
