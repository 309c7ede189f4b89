//! The partitioned reduce-by-key table.
//!
//! [`ReduceTable`] folds values that share a key as they are inserted and
//! keeps the number of resident entries near a fixed budget. When an insert
//! pushes the resident count above [`TableConfig::spill_threshold`], the
//! partition holding the most entries is drained to the sink in one go.
//!
//! ```
//! use spillreduce::{ReduceTable, TableConfig, PairKey, Sum};
//!
//! # fn main() -> anyhow::Result<()> {
//! let cfg = TableConfig::new(4).with_spill_threshold(1_000);
//! let mut table = ReduceTable::new(cfg, PairKey, Sum::<u64>::new(), Vec::new())?;
//!
//! for word in "the cat and the hat".split_whitespace() {
//!     table.insert((word.to_string(), 1));
//! }
//! assert_eq!(table.size(), 4);
//!
//! table.flush();
//! let mut counts = table.into_sink();
//! counts.sort();
//! assert_eq!(counts[3], ("the".to_string(), 2));
//! # Ok(())
//! # }
//! ```
//!
//! Emission order is deterministic: partitions in increasing index, buckets in
//! increasing global index, and each chain from its newest entry to its oldest.
//!
//! Dropping a table releases its resident entries without emitting them; call
//! [`ReduceTable::flush`] first to hand them to the sink.

use crate::bucket::{BucketStore, Entry};
use crate::config::TableConfig;
use crate::error::ConfigError;
use crate::functions::{KeyExtractor, ReduceFunction};
use crate::indexer::{BucketLocation, DefaultRouteHasher, PartitionIndexer};
use crate::sink::Sink;
use crate::spill::{LargestPartition, SpillPolicy, SpillReport};
use serde::Serialize;
use std::fmt::Debug;
use std::hash::{BuildHasher, Hash};
use tracing::{debug, trace, warn};

/// Running counters kept by every table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TableStats {
    /// Calls to `insert`.
    pub inserts: u64,
    /// Inserts that were folded into an existing entry.
    pub folds: u64,
    /// Inserts that created a new entry.
    pub new_entries: u64,
    /// Spills that selected a partition.
    pub spills: u64,
    /// Values emitted by spills.
    pub spilled_items: u64,
    /// Calls to `flush`.
    pub flushes: u64,
    /// Values emitted by flushes.
    pub flushed_items: u64,
    /// Largest resident count observed.
    pub peak_resident: usize,
}

/// Bounded-memory reduce-by-key table.
///
/// Type parameters: key `K`, value `V`, key extractor `E`, reduce function
/// `R`, sink `S`, routing hasher `H`, spill policy `P`.
pub struct ReduceTable<K, V, E, R, S, H = DefaultRouteHasher, P = LargestPartition> {
    config: TableConfig,
    indexer: PartitionIndexer<H>,
    store: BucketStore<K, V>,
    partition_sizes: Vec<usize>,
    total: usize,
    key_extractor: E,
    reduce_fn: R,
    sink: S,
    policy: P,
    stats: TableStats,
}

impl<K, V, E, R, S> ReduceTable<K, V, E, R, S>
where
    K: Hash + Eq,
    E: KeyExtractor<V, K>,
    R: ReduceFunction<V>,
    S: Sink<V>,
{
    /// Build a table routing keys with the default deterministic hasher.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `config` fails [`TableConfig::validate`].
    /// Nothing is allocated in that case.
    pub fn new(
        config: TableConfig,
        key_extractor: E,
        reduce_fn: R,
        sink: S,
    ) -> Result<Self, ConfigError> {
        Self::with_hasher(
            config,
            key_extractor,
            reduce_fn,
            sink,
            DefaultRouteHasher::default(),
        )
    }
}

impl<K, V, E, R, S, H> ReduceTable<K, V, E, R, S, H>
where
    K: Hash + Eq,
    E: KeyExtractor<V, K>,
    R: ReduceFunction<V>,
    S: Sink<V>,
    H: BuildHasher,
{
    /// Build a table routing keys with `hasher`.
    ///
    /// Tables that must agree on routing (for example, workers exchanging
    /// partitions) need the same config and an equivalent hasher.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `config` fails [`TableConfig::validate`].
    pub fn with_hasher(
        config: TableConfig,
        key_extractor: E,
        reduce_fn: R,
        sink: S,
        hasher: H,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        debug!(
            partitions = config.partition_count,
            buckets = config.bucket_capacity,
            buckets_per_partition = config.buckets_per_partition(),
            spill_threshold = config.spill_threshold,
            "created reduce table",
        );
        Ok(Self {
            indexer: PartitionIndexer::with_hasher(&config, hasher),
            store: BucketStore::new(config.bucket_capacity),
            partition_sizes: vec![0; config.partition_count],
            total: 0,
            key_extractor,
            reduce_fn,
            sink,
            policy: LargestPartition,
            stats: TableStats::default(),
            config,
        })
    }
}

impl<K, V, E, R, S, H, P> ReduceTable<K, V, E, R, S, H, P> {
    /// Swap the spill policy.
    #[must_use]
    pub fn with_spill_policy<P2: SpillPolicy>(
        self,
        policy: P2,
    ) -> ReduceTable<K, V, E, R, S, H, P2> {
        ReduceTable {
            config: self.config,
            indexer: self.indexer,
            store: self.store,
            partition_sizes: self.partition_sizes,
            total: self.total,
            key_extractor: self.key_extractor,
            reduce_fn: self.reduce_fn,
            sink: self.sink,
            policy,
            stats: self.stats,
        }
    }

    /// Number of resident entries. O(1).
    #[must_use]
    pub fn size(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Resident entries per partition, indexed by partition id.
    #[must_use]
    pub fn partition_sizes(&self) -> &[usize] {
        &self.partition_sizes
    }

    /// Resident entries in one partition; 0 for an unknown partition id.
    #[must_use]
    pub fn partition_size(&self, partition_id: usize) -> usize {
        self.partition_sizes.get(partition_id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    #[must_use]
    pub fn indexer(&self) -> &PartitionIndexer<H> {
        &self.indexer
    }

    #[must_use]
    pub fn stats(&self) -> &TableStats {
        &self.stats
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consume the table and return its sink. Resident entries are dropped.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Toggle per-entry `trace` events.
    pub fn set_trace(&mut self, enabled: bool) {
        self.config.trace = enabled;
    }

    #[must_use]
    pub fn trace_enabled(&self) -> bool {
        self.config.trace
    }

    /// Resident entries in emission order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry<K, V>> {
        (0..self.store.capacity()).flat_map(|i| self.store.chain(i).iter())
    }

    /// Rehash into a new partitioning while keeping each key on the same
    /// worker. Not implemented: the table is left untouched.
    pub fn resize(&mut self) {
        debug!("resize requested; not implemented, table unchanged");
    }
}

impl<K, V, E, R, S, H, P> ReduceTable<K, V, E, R, S, H, P>
where
    K: Hash + Eq,
    E: KeyExtractor<V, K>,
    R: ReduceFunction<V>,
    S: Sink<V>,
    H: BuildHasher,
    P: SpillPolicy,
{
    /// Insert `value`, folding it into the resident entry for its key if one
    /// exists. May spill one partition afterwards.
    pub fn insert(&mut self, value: V) {
        let key = self.key_extractor.key(&value);
        let loc = self.indexer.locate(&key);
        self.stats.inserts += 1;

        if let Some(entry) = self.store.find_mut(loc.global_index, &key) {
            entry.value = self.reduce_fn.reduce(&entry.value, &value);
            self.stats.folds += 1;
            if self.config.trace {
                trace!(
                    partition = loc.partition_id,
                    bucket = loc.global_index,
                    "folded into resident entry",
                );
            }
        } else {
            self.store.push_front(loc.global_index, key, value);
            self.partition_sizes[loc.partition_id] += 1;
            self.total += 1;
            self.stats.new_entries += 1;
            self.stats.peak_resident = self.stats.peak_resident.max(self.total);
            if self.config.trace {
                trace!(
                    partition = loc.partition_id,
                    bucket = loc.global_index,
                    chain_len = self.store.len(loc.global_index),
                    resident = self.total,
                    "inserted new entry",
                );
            }
        }

        // Checked once; the next largest partition may still keep us over budget.
        if self.total > self.config.spill_threshold {
            self.spill_largest();
        }
    }

    /// Insert every value from `values`.
    pub fn insert_all<I: IntoIterator<Item = V>>(&mut self, values: I) {
        for v in values {
            self.insert(v);
        }
    }

    /// Where `key` is (or would be) stored.
    pub fn locate(&self, key: &K) -> BucketLocation {
        self.indexer.locate(key)
    }

    /// Resident value for `key`, if any.
    pub fn get(&self, key: &K) -> Option<&V> {
        let loc = self.indexer.locate(key);
        self.store.chain(loc.global_index).find(key).map(|e| &e.value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Drain the partition chosen by the spill policy into the sink.
    ///
    /// Returns `None` when the policy selects nothing (an empty table with
    /// the default policy).
    pub fn spill_largest(&mut self) -> Option<SpillReport> {
        let partition_id = self.policy.select(&self.partition_sizes)?;
        if partition_id >= self.partition_sizes.len() {
            warn!(
                partition_id,
                partitions = self.partition_sizes.len(),
                "spill policy selected unknown partition",
            );
            return None;
        }

        let before = self.total;
        let items = self.drain_partition(partition_id);
        self.stats.spills += 1;
        self.stats.spilled_items += items as u64;
        debug!(
            partition = partition_id,
            items,
            resident_before = before,
            resident_after = self.total,
            "spilled partition",
        );
        Some(SpillReport { partition_id, items })
    }

    /// Emit every resident value and reset the table. Returns the number of
    /// values emitted.
    pub fn flush(&mut self) -> usize {
        let mut emitted = 0;
        for partition_id in 0..self.partition_sizes.len() {
            emitted += self.drain_partition(partition_id);
        }
        debug_assert_eq!(self.total, 0);
        self.stats.flushes += 1;
        self.stats.flushed_items += emitted as u64;
        debug!(items = emitted, "flushed reduce table");
        emitted
    }

    /// Push every entry of `partition_id` to the sink, bucket by bucket.
    ///
    /// Counters drop as each entry is handed over, so a sink that panics part
    /// way through leaves the table consistent: emitted entries are gone and
    /// the rest are still resident and counted.
    fn drain_partition(&mut self, partition_id: usize) -> usize {
        let mut emitted = 0;
        for global_index in self.indexer.partition_range(partition_id) {
            for entry in self.store.drain(global_index) {
                self.partition_sizes[partition_id] -= 1;
                self.total -= 1;
                self.sink.push(entry.value);
                emitted += 1;
            }
        }
        debug_assert_eq!(self.partition_sizes[partition_id], 0);
        emitted
    }
}

impl<K, V, E, R, S, H, P> ReduceTable<K, V, E, R, S, H, P>
where
    K: Debug,
    V: Debug,
{
    /// Dump every bucket at `trace` level.
    pub fn log_contents(&self) {
        for i in 0..self.store.capacity() {
            let chain = self.store.chain(i);
            if chain.is_empty() {
                trace!(bucket = i, "bucket empty");
            } else {
                let entries: Vec<_> = chain.iter().map(|e| (&e.key, &e.value)).collect();
                trace!(bucket = i, ?entries, "bucket contents");
            }
        }
    }
}
