//! # spillreduce
//!
//! A **bounded-memory reduce-by-key table** for the reduce phase of a
//! distributed data-processing engine. Values are folded per key as they are
//! inserted; when too many entries are resident, the partition holding the
//! most entries is spilled to a [`Sink`] so memory stays bounded.
//!
//! ## Key Features
//!
//! - **Fold-on-insert** - a repeated key is merged with a [`ReduceFunction`]
//!   instead of being stored twice
//! - **Two-level routing** - a key maps to a partition and a bucket inside it
//!   ([`PartitionIndexer`])
//! - **Partition spilling** - the largest partition is drained when the spill
//!   threshold is exceeded ([`SpillPolicy`])
//! - **Deterministic output order** - partition, then bucket, then newest to
//!   oldest within a bucket
//! - **Validated configuration** - bad partition counts are rejected up front
//!   with a [`ConfigError`]
//!
//! ## Quick Start
//!
//! ```
//! use spillreduce::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let cfg = TableConfig::new(2).with_spill_threshold(1);
//! let mut table = ReduceTable::new(cfg, PairKey, Sum::<u64>::new(), Vec::new())?;
//!
//! table.insert(("x".to_string(), 1));
//! table.insert(("x".to_string(), 4));
//! assert_eq!(table.size(), 1);
//! assert_eq!(table.get(&"x".to_string()), Some(&("x".to_string(), 5)));
//!
//! table.flush();
//! assert!(table.is_empty());
//! assert_eq!(table.sink(), &vec![("x".to_string(), 5)]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Partitions and buckets
//!
//! The table owns `bucket_capacity` chains split into `partition_count`
//! contiguous runs. Each partition tracks how many entries it holds; the sum
//! over all partitions is [`ReduceTable::size`].
//!
//! ### Spilling
//!
//! After each insert the table checks `size() > spill_threshold` once. If it
//! is exceeded, one partition is drained to the sink and its counter reset.
//! A key that is spilled and later inserted again starts a fresh entry, so the
//! sink may receive several partial results for the same key; downstream
//! consumers are expected to reduce them again.
//!
//! ### Collaborators
//!
//! - [`KeyExtractor`] - `Fn(&V) -> K`
//! - [`ReduceFunction`] - `Fn(&V, &V) -> V`, called as `(resident, incoming)`
//! - [`Sink`] - receives emitted values; `Vec<V>`, [`FnSink`] and bounded
//!   channels are provided
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events and never installs a subscriber.
//! Spills and flushes are logged at `debug`. Per-entry `trace` events are off
//! by default and toggled per table with [`TableConfig::trace`] or
//! [`ReduceTable::set_trace`].
//!
//! ## Feature Flags
//!
//! - `metrics` (default) - the [`metrics`] module for publishing
//!   [`TableStats`] to a shared collector
//!
//! ## Module Overview
//!
//! - [`table`] - the [`ReduceTable`]
//! - [`indexer`] - key → partition/bucket routing
//! - [`bucket`] - chain storage
//! - [`spill`] - spill policies
//! - [`sink`] - output sinks
//! - [`functions`] - key extractors and reduce functions
//! - [`config`] - [`TableConfig`] and JSON loading
//! - [`testing`] - helpers for tests

pub mod bucket;
pub mod config;
pub mod error;
pub mod functions;
pub mod indexer;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod sink;
pub mod spill;
pub mod table;
pub mod testing;

// General re-exports
pub use bucket::{BucketStore, Chain, Entry};
pub use config::{TableConfig, DEFAULT_BUCKET_CAPACITY, DEFAULT_SPILL_THRESHOLD};
pub use error::ConfigError;
pub use functions::{KeyExtractor, Max, Min, PairKey, ReduceFunction, Sum};
pub use indexer::{BucketLocation, DefaultRouteHasher, PartitionIndexer};
pub use sink::{FnSink, Sink};
pub use spill::{LargestPartition, SpillPolicy, SpillReport};
pub use table::{ReduceTable, TableStats};
