//! Metrics collection and reporting for reduce tables.
//!
//! Every [`ReduceTable`](crate::ReduceTable) keeps a [`TableStats`] record.
//! The types here publish those numbers (and any custom metrics) to a shared
//! [`MetricsCollector`] that can be printed or saved as JSON.
//!
//! # Example
//!
//! ```
//! use spillreduce::metrics::MetricsCollector;
//! use spillreduce::{ReduceTable, TableConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let cfg = TableConfig::new(2).with_spill_threshold(10);
//! let mut table = ReduceTable::new(cfg, |v: &u32| *v, |a: &u32, _: &u32| *a, Vec::new())?;
//! table.insert(1);
//! table.insert(1);
//!
//! let metrics = MetricsCollector::new();
//! table.stats().record_into(&metrics);
//! assert_eq!(metrics.snapshot()["table_inserts"], serde_json::json!(2));
//! # Ok(())
//! # }
//! ```

use crate::table::TableStats;
use anyhow::Result;
use serde_json::{json, Value};
use std::any::Any;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Trait for custom metrics.
pub trait Metric: Send + Sync + Any {
    /// The name of this metric (e.g., `table_spills`).
    fn name(&self) -> &str;

    /// The current value of this metric as a JSON value.
    fn value(&self) -> Value;

    /// Optional description of what this metric measures.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Cast to Any for downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// Thread-safe container for collected metrics.
///
/// Clones share the same underlying set, so several tables (one per worker
/// thread) can report into one collector.
#[derive(Clone, Default)]
pub struct MetricsCollector {
    inner: Arc<Mutex<HashMap<String, Box<dyn Metric>>>>,
}

impl MetricsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Box<dyn Metric>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a custom metric, replacing any metric with the same name.
    pub fn register(&self, metric: Box<dyn Metric>) {
        self.lock().insert(metric.name().to_string(), metric);
    }

    /// Register multiple metrics at once.
    pub fn register_all(&self, metrics: Vec<Box<dyn Metric>>) {
        for metric in metrics {
            self.register(metric);
        }
    }

    /// Add `value` to a counter, creating it if missing.
    ///
    /// A non-counter metric under `name` is replaced by a fresh counter.
    pub fn increment_counter(&self, name: &str, value: u64) {
        let mut inner = self.lock();
        let current = inner
            .get(name)
            .and_then(|m| m.as_any().downcast_ref::<CounterMetric>())
            .map_or(0, |c| c.count);
        inner.insert(
            name.to_string(),
            Box::new(CounterMetric::with_value(name, current + value)),
        );
    }

    /// Set a counter metric to a specific value.
    pub fn set_counter(&self, name: &str, value: u64) {
        self.lock()
            .insert(name.to_string(), Box::new(CounterMetric::with_value(name, value)));
    }

    /// Register `gauge` unless a gauge with the same name already holds a
    /// larger value. The comparison and the write happen under one lock.
    pub fn max_gauge(&self, gauge: GaugeMetric) {
        let mut inner = self.lock();
        let current = inner
            .get(gauge.name())
            .and_then(|m| m.as_any().downcast_ref::<GaugeMetric>())
            .map(|g| g.value);
        if current.is_none_or(|v| gauge.value > v) {
            inner.insert(gauge.name.clone(), Box::new(gauge));
        }
    }

    /// Get all metrics as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let inner = self.lock();
        let mut metrics_json = serde_json::Map::new();
        for (name, metric) in inner.iter() {
            let mut metric_obj = serde_json::Map::new();
            metric_obj.insert("value".to_string(), metric.value());
            if let Some(desc) = metric.description() {
                metric_obj.insert("description".to_string(), json!(desc));
            }
            metrics_json.insert(name.clone(), Value::Object(metric_obj));
        }
        Value::Object(metrics_json)
    }

    /// Print all metrics to stdout, sorted by name.
    pub fn print(&self) {
        println!("\n========== Reduce Table Metrics ==========");
        let inner = self.lock();
        let mut sorted: Vec<_> = inner.iter().collect();
        sorted.sort_by_key(|(name, _)| *name);
        for (name, metric) in sorted {
            if let Some(desc) = metric.description() {
                println!("{}: {} ({})", name, metric.value(), desc);
            } else {
                println!("{}: {}", name, metric.value());
            }
        }
        drop(inner);
        println!("==========================================\n");
    }

    /// Save all metrics to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written to.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let formatted = serde_json::to_string_pretty(&self.to_json())?;
        let mut file = File::create(path)?;
        file.write_all(formatted.as_bytes())?;
        Ok(())
    }

    /// Snapshot of all metric names and values.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.lock()
            .iter()
            .map(|(name, metric)| (name.clone(), metric.value()))
            .collect()
    }
}

// ========== Built-in Metrics ==========

/// A simple counter metric.
pub struct CounterMetric {
    name: String,
    count: u64,
}

impl CounterMetric {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_value(name, 0)
    }

    pub fn with_value(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Metric for CounterMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Value {
        json!(self.count)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A gauge metric that holds a single numeric value.
pub struct GaugeMetric {
    name: String,
    value: f64,
    description: Option<String>,
}

impl GaugeMetric {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Metric for GaugeMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Value {
        json!(self.value)
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl TableStats {
    /// Add these counters to `collector` under `table_*` names.
    ///
    /// Counters accumulate across calls, so several tables can report into
    /// one collector. `table_peak_resident` is a gauge and keeps the largest
    /// value reported.
    pub fn record_into(&self, collector: &MetricsCollector) {
        collector.increment_counter("table_inserts", self.inserts);
        collector.increment_counter("table_folds", self.folds);
        collector.increment_counter("table_new_entries", self.new_entries);
        collector.increment_counter("table_spills", self.spills);
        collector.increment_counter("table_spilled_items", self.spilled_items);
        collector.increment_counter("table_flushes", self.flushes);
        collector.increment_counter("table_flushed_items", self.flushed_items);

        #[allow(clippy::cast_precision_loss)]
        let peak = self.peak_resident as f64;
        collector.max_gauge(
            GaugeMetric::new("table_peak_resident", peak)
                .with_description("Largest resident item count observed"),
        );
    }
}
