use super::{BuildMetricsSink, MetricsSink};
use serde::{Deserialize, Serialize};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A scalar value recorded by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarRecord {
    pub tag: String,
    pub value: f64,
    pub step: usize,
}

/// Sink that keeps every value in memory.
///
/// Clones share the same storage so a handle kept by the caller sees everything written through
/// sinks built from it.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    inner: Arc<Mutex<Recorded>>,
}

#[derive(Debug, Default)]
struct Recorded {
    records: Vec<ScalarRecord>,
    flushes: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records so far, in the order they were added.
    pub fn records(&self) -> Vec<ScalarRecord> {
        self.lock().records.clone()
    }

    /// Records with the given tag.
    pub fn records_with_tag(&self, tag: &str) -> Vec<ScalarRecord> {
        self.lock()
            .records
            .iter()
            .filter(|r| r.tag == tag)
            .cloned()
            .collect()
    }

    /// Number of times the sink has been flushed.
    pub fn num_flushes(&self) -> usize {
        self.lock().flushes
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        // Records are append-only so a panic while holding the lock cannot leave them invalid.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MetricsSink for RecordingSink {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) {
        self.lock().records.push(ScalarRecord {
            tag: tag.into(),
            value,
            step,
        });
    }

    fn flush(&mut self) {
        self.lock().flushes += 1;
    }
}

impl BuildMetricsSink for RecordingSink {
    type Sink = Self;

    fn build_sink(&self) -> io::Result<Self::Sink> {
        Ok(self.clone())
    }
}
