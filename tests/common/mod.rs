//! Shared helpers for integration tests.
#![allow(dead_code)]

use spillreduce::{PartitionIndexer, TableConfig};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// First `n` non-negative integer keys that route to `partition_id`.
pub fn keys_in_partition(cfg: &TableConfig, partition_id: usize, n: usize) -> Vec<u64> {
    let idx = PartitionIndexer::new(cfg);
    (0u64..)
        .filter(|k| idx.locate(k).partition_id == partition_id)
        .take(n)
        .collect()
}

/// First `n` keys that share the bucket of `seed`.
pub fn keys_in_same_bucket(cfg: &TableConfig, seed: u64, n: usize) -> Vec<u64> {
    let idx = PartitionIndexer::new(cfg);
    let target = idx.locate(&seed).global_index;
    (seed..)
        .filter(|k| idx.locate(k).global_index == target)
        .take(n)
        .collect()
}

/// `(key, 1)` for every key.
pub fn ones(keys: &[u64]) -> Vec<(u64, u64)> {
    keys.iter().map(|k| (*k, 1)).collect()
}

/// Layer counting events by level and message.
#[derive(Clone, Default)]
pub struct EventCounter {
    counts: Arc<Mutex<HashMap<(Level, String), usize>>>,
}

impl EventCounter {
    pub fn count(&self, level: Level, message: &str) -> usize {
        let counts = self.counts.lock().unwrap();
        counts.get(&(level, message.to_string())).copied().unwrap_or(0)
    }

    pub fn count_level(&self, level: Level) -> usize {
        let counts = self.counts.lock().unwrap();
        counts.iter().filter(|((l, _), _)| *l == level).map(|(_, n)| n).sum()
    }
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S: Subscriber> Layer<S> for EventCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut message = MessageVisitor(String::new());
        event.record(&mut message);
        let level = *event.metadata().level();
        *self.counts.lock().unwrap().entry((level, message.0)).or_default() += 1;
    }
}
