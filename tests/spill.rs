use anyhow::Result;
use spillreduce::testing::{assert_unique_keys, PanicAfter, SharedSink};
use spillreduce::{PairKey, ReduceTable, SpillPolicy, SpillReport, Sum, TableConfig};
use std::cell::Cell;
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

mod common;
use common::{keys_in_partition, ones};

#[test]
fn tie_spills_lower_partition_and_keeps_the_other() -> Result<()> {
    // 100 buckets, 2 partitions, spill once more than one item is resident.
    let cfg = TableConfig::new(2).with_spill_threshold(1);
    let x = keys_in_partition(&cfg, 0, 1)[0];
    let y = keys_in_partition(&cfg, 1, 1)[0];
    let sink = SharedSink::new();
    let mut table = ReduceTable::new(cfg, PairKey, Sum::<u64>::new(), sink.clone())?;

    table.insert((x, 10));
    assert_eq!(table.size(), 1);
    assert!(sink.is_empty());

    table.insert((y, 20));
    assert_eq!(table.size(), 1);
    assert_eq!(sink.take(), vec![(x, 10)]);
    assert_eq!(table.partition_sizes(), &[0, 1]);
    assert!(!table.contains_key(&x));
    assert_eq!(table.get(&y), Some(&(y, 20)));
    Ok(())
}

#[test]
fn spill_empties_exactly_the_largest_partition() -> Result<()> {
    let cfg = TableConfig::new(4).with_spill_threshold(1_000);
    let p0 = keys_in_partition(&cfg, 0, 3);
    let p2 = keys_in_partition(&cfg, 2, 5);
    let p3 = keys_in_partition(&cfg, 3, 5);
    let sink = SharedSink::new();
    let mut table = ReduceTable::new(cfg, PairKey, Sum::<u64>::new(), sink.clone())?;

    table.insert_all(ones(&p0));
    table.insert_all(ones(&p3));
    table.insert_all(ones(&p2));
    assert_eq!(table.partition_sizes(), &[3, 0, 5, 5]);

    let report = table.spill_largest();
    assert_eq!(report, Some(SpillReport { partition_id: 2, items: 5 }));
    assert_eq!(table.partition_sizes(), &[3, 0, 0, 5]);
    assert_eq!(table.size(), 8);

    let spilled = sink.take();
    assert_unique_keys(spilled.iter().map(|(k, _)| k));
    let spilled_keys: HashSet<u64> = spilled.iter().map(|(k, _)| *k).collect();
    assert_eq!(spilled_keys, p2.iter().copied().collect());
    for k in p0.iter().chain(&p3) {
        assert_eq!(table.get(k), Some(&(*k, 1)));
    }
    Ok(())
}

#[test]
fn spill_on_empty_table_is_a_no_op() -> Result<()> {
    let mut table = ReduceTable::new(
        TableConfig::new(3),
        PairKey,
        Sum::<u64>::new(),
        Vec::<(u64, u64)>::new(),
    )?;
    assert_eq!(table.spill_largest(), None);
    assert_eq!(table.stats().spills, 0);
    Ok(())
}

#[test]
fn spill_drains_buckets_in_index_order_newest_first() -> Result<()> {
    let cfg = TableConfig::new(2).with_spill_threshold(1_000);
    let keys = keys_in_partition(&cfg, 1, 40);
    let mut table = ReduceTable::new(cfg, PairKey, Sum::<u64>::new(), Vec::new())?;
    table.insert_all(ones(&keys));

    let mut expected: Vec<(usize, usize, u64)> = keys
        .iter()
        .enumerate()
        .map(|(i, k)| (table.locate(k).global_index, i, *k))
        .collect();
    expected.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
    let expected: Vec<(u64, u64)> = expected.into_iter().map(|(_, _, k)| (k, 1)).collect();

    table.spill_largest();
    assert_eq!(table.sink(), &expected);
    Ok(())
}

#[test]
fn budget_is_enforced_while_streaming() -> Result<()> {
    let cfg = TableConfig::new(4).with_spill_threshold(10);
    let mut table = ReduceTable::new(cfg, PairKey, Sum::<u64>::new(), Vec::new())?;

    for i in 0..1_000u64 {
        table.insert((i % 97, 1));
        assert!(table.size() <= 10);
    }
    assert!(table.stats().spills > 0);
    assert_eq!(table.stats().peak_resident, 11);
    Ok(())
}

/// Never selects anything and counts how often it is asked.
struct NeverSpill(Rc<Cell<usize>>);

impl SpillPolicy for NeverSpill {
    fn select(&self, _: &[usize]) -> Option<usize> {
        self.0.set(self.0.get() + 1);
        None
    }
}

#[test]
fn threshold_is_checked_once_per_insert() -> Result<()> {
    let calls = Rc::new(Cell::new(0));
    let cfg = TableConfig::new(2).with_spill_threshold(2);
    let mut table = ReduceTable::new(cfg, PairKey, Sum::<u64>::new(), Vec::new())?
        .with_spill_policy(NeverSpill(Rc::clone(&calls)));

    table.insert_all(ones(&[1, 2]));
    assert_eq!(calls.get(), 0);

    table.insert_all(ones(&[3, 4, 5]));
    assert_eq!(calls.get(), 3);
    assert_eq!(table.size(), 5);

    // A fold does not grow the table but still checks the budget.
    table.insert((5, 1));
    assert_eq!(calls.get(), 4);
    Ok(())
}

struct Fixed(usize);

impl SpillPolicy for Fixed {
    fn select(&self, _: &[usize]) -> Option<usize> {
        Some(self.0)
    }
}

#[test]
fn custom_policy_picks_the_partition() -> Result<()> {
    let cfg = TableConfig::new(2).with_spill_threshold(1_000);
    let small = keys_in_partition(&cfg, 1, 1);
    let large = keys_in_partition(&cfg, 0, 4);
    let mut table = ReduceTable::new(cfg, PairKey, Sum::<u64>::new(), Vec::new())?
        .with_spill_policy(Fixed(1));
    table.insert_all(ones(&large));
    table.insert_all(ones(&small));

    assert_eq!(table.spill_largest(), Some(SpillReport { partition_id: 1, items: 1 }));
    assert_eq!(table.partition_sizes(), &[4, 0]);

    let mut bad = table.with_spill_policy(Fixed(9));
    assert_eq!(bad.spill_largest(), None);
    assert_eq!(bad.size(), 4);
    Ok(())
}

#[test]
fn failing_sink_leaves_table_consistent() -> Result<()> {
    let cfg = TableConfig::new(1).with_spill_threshold(1_000);
    let mut table = ReduceTable::new(cfg, PairKey, Sum::<u64>::new(), PanicAfter::new(2))?;
    table.insert_all(ones(&[1, 2, 3, 4, 5]));

    let result = catch_unwind(AssertUnwindSafe(|| table.flush()));
    assert!(result.is_err());

    // Two values delivered, the third was consumed by the failing push.
    assert_eq!(table.sink().received.len(), 2);
    assert_eq!(table.size(), 2);
    assert_eq!(table.partition_sizes(), &[2]);
    assert_eq!(table.iter().count(), 2);

    let emitted: HashSet<u64> = table.sink().received.iter().map(|(k, _)| *k).collect();
    for e in table.iter() {
        assert!(!emitted.contains(&e.key));
    }
    Ok(())
}
