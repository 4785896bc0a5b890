//! Merge counters and timings.
//!
//! A [`MetricsCollector`] is a cheap, clonable handle. The reducer clones it
//! into every worker and the counters add up across threads. Besides the
//! built-in counters below, callers may register their own [`Metric`]s, which
//! are reported alongside.
//!
//! # Example
//!
//! ```
//! use ironselect::metrics::{MetricsCollector, BLOCKS_MERGED};
//!
//! let metrics = MetricsCollector::new();
//! metrics.record_start();
//! metrics.increment_counter(BLOCKS_MERGED, 2);
//! metrics.record_end();
//!
//! assert_eq!(metrics.counter(BLOCKS_MERGED), 2);
//! assert!(metrics.elapsed().is_some());
//! ```

use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Blocks folded into the accumulator, empty ones excluded.
pub const BLOCKS_MERGED: &str = "blocks_merged";
/// Rows offered to the accumulator.
pub const ROWS_MERGED: &str = "rows_merged";
/// Rows rejected or evicted by the row bound.
pub const ROWS_DISCARDED: &str = "rows_discarded";
/// Merges that widened the accumulator schema.
pub const SCHEMA_UPGRADES: &str = "schema_upgrades";
/// Segment producers that returned an error.
pub const SEGMENTS_FAILED: &str = "segments_failed";

/// A caller-defined metric reported next to the built-in counters.
pub trait Metric: Send + Sync + Any {
    fn name(&self) -> &str;

    fn value(&self) -> Value;

    fn description(&self) -> Option<&str> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    counters: BTreeMap<String, u64>,
    custom: HashMap<String, Box<dyn Metric>>,
    start: Option<Instant>,
    end: Option<Instant>,
}

impl MetricsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    // a poisoned lock still holds valid counters
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a custom metric, replacing any metric with the same name.
    pub fn register(&self, metric: Box<dyn Metric>) {
        self.lock().custom.insert(metric.name().to_string(), metric);
    }

    /// Clear counters and timing. Registered custom metrics stay.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.counters.clear();
        inner.start = None;
        inner.end = None;
    }

    pub fn record_start(&self) {
        let mut inner = self.lock();
        inner.start = Some(Instant::now());
        inner.end = None;
    }

    pub fn record_end(&self) {
        self.lock().end = Some(Instant::now());
    }

    /// Time between [`record_start`](Self::record_start) and
    /// [`record_end`](Self::record_end).
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        let inner = self.lock();
        match (inner.start, inner.end) {
            (Some(start), Some(end)) => Some(end.duration_since(start)),
            _ => None,
        }
    }

    /// Add `by` to a counter, creating it at zero first.
    pub fn increment_counter(&self, name: &str, by: u64) {
        let mut inner = self.lock();
        let counter = inner.counters.entry(name.to_string()).or_insert(0);
        *counter = counter.saturating_add(by);
    }

    pub fn set_counter(&self, name: &str, value: u64) {
        self.lock().counters.insert(name.to_string(), value);
    }

    /// Current counter value, zero if never touched.
    #[must_use]
    pub fn counter(&self, name: &str) -> u64 {
        self.lock().counters.get(name).copied().unwrap_or(0)
    }

    /// Every counter and custom metric by name.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, Value> {
        let inner = self.lock();
        inner
            .counters
            .iter()
            .map(|(name, count)| (name.clone(), json!(count)))
            .chain(
                inner
                    .custom
                    .iter()
                    .map(|(name, metric)| (name.clone(), metric.value())),
            )
            .collect()
    }

    /// A JSON object keyed by metric name, each entry holding `value` and,
    /// where known, `description`. Includes `elapsed_ms` once timing is
    /// complete.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let elapsed = self.elapsed();
        let inner = self.lock();
        let mut out = serde_json::Map::new();
        for (name, count) in &inner.counters {
            out.insert(name.clone(), json!({ "value": count }));
        }
        for (name, metric) in &inner.custom {
            let mut entry = serde_json::Map::new();
            entry.insert("value".to_string(), metric.value());
            if let Some(desc) = metric.description() {
                entry.insert("description".to_string(), json!(desc));
            }
            out.insert(name.clone(), Value::Object(entry));
        }
        drop(inner);
        if let Some(elapsed) = elapsed {
            out.insert(
                "elapsed_ms".to_string(),
                json!({
                    "value": elapsed.as_millis(),
                    "description": "Wall time of the reduction in milliseconds",
                }),
            );
        }
        Value::Object(out)
    }

    /// Write [`to_json`](Self::to_json) to `path`, pretty-printed.
    ///
    /// # Errors
    /// Fails if the file cannot be written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(&self.to_json())?;
        std::fs::write(path, text)
            .with_context(|| format!("writing metrics to {}", path.display()))
    }

    /// Emit every counter as one `tracing` event.
    pub fn log(&self) {
        let inner = self.lock();
        tracing::info!(
            blocks_merged = inner.counters.get(BLOCKS_MERGED).copied().unwrap_or(0),
            rows_merged = inner.counters.get(ROWS_MERGED).copied().unwrap_or(0),
            rows_discarded = inner.counters.get(ROWS_DISCARDED).copied().unwrap_or(0),
            schema_upgrades = inner.counters.get(SCHEMA_UPGRADES).copied().unwrap_or(0),
            segments_failed = inner.counters.get(SEGMENTS_FAILED).copied().unwrap_or(0),
            "merge metrics"
        );
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsCollector")
            .field("counters", &self.lock().counters)
            .finish_non_exhaustive()
    }
}

/* ===== Ready-made metrics ===== */

/// A fixed count, for values known before registration.
pub struct CounterMetric {
    name: String,
    count: u64,
}

impl CounterMetric {
    #[must_use]
    pub fn new(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            count,
        }
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

/// A floating-point reading with an optional description.
pub struct GaugeMetric {
    name: String,
    value: f64,
    description: Option<String>,
}

impl GaugeMetric {
    #[must_use]
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
