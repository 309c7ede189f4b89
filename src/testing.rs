//! Testing utilities for reduce tables.
//!
//! - **Assertions**: compare emitted values with expected results
//! - **Sinks**: a cloneable recording sink and a sink that panics on demand
//! - **Drop tracking**: values that count how many instances are alive, to
//!   check that drained entries are really released
//!
//! # Quick Start
//!
//! ```
//! use spillreduce::testing::*;
//! use spillreduce::{PairKey, ReduceTable, Sum, TableConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let sink = SharedSink::new();
//! let cfg = TableConfig::new(2).with_spill_threshold(100);
//! let mut table = ReduceTable::new(cfg, PairKey, Sum::<u32>::new(), sink.clone())?;
//! table.insert(("a", 1));
//! table.insert(("a", 2));
//! table.flush();
//!
//! assert_kv_collections_equal(sink.take(), vec![("a", 3)]);
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod sinks;

pub use assertions::*;
pub use sinks::*;
