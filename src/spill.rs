//! Choosing which partition to evict.

/// Picks the partition to drain when a table exceeds its spill threshold.
pub trait SpillPolicy {
    /// Return the partition to spill given per-partition resident counts, or
    /// `None` if nothing should be spilled.
    fn select(&self, partition_sizes: &[usize]) -> Option<usize>;
}

/// Evicts the partition holding the most resident items.
///
/// Ties go to the lowest partition index. An all-empty table selects nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct LargestPartition;

impl SpillPolicy for LargestPartition {
    fn select(&self, partition_sizes: &[usize]) -> Option<usize> {
        let mut max = 0;
        let mut idx = 0;
        for (i, &n) in partition_sizes.iter().enumerate() {
            // strict: first-seen maximum wins
            if n > max {
                max = n;
                idx = i;
            }
        }
        (max > 0).then_some(idx)
    }
}

/// Outcome of a single spill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpillReport {
    pub partition_id: usize,
    /// Number of values pushed to the sink.
    pub items: usize,
}
