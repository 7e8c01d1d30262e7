//! Metrics definitions for the watcher.
//!
//! This module defines all metrics used throughout the watcher.
//! Metrics are collected using the `metrics` crate and can be exported
//! to Prometheus via `metrics-exporter-prometheus`.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

/// Initialize all metric descriptions.
/// Call this once at startup before any metrics are recorded.
pub fn init_metrics() {
    describe_counter!(
        "blocks_ingested_total",
        "Total number of blocks whose transactions were fully recorded"
    );
    describe_counter!(
        "transactions_recorded_total",
        "Total number of transactions recorded into per-address queues"
    );
    describe_counter!(
        "passes_completed_total",
        "Total number of ingestion passes that reached the chain head"
    );
    describe_counter!(
        "pass_errors_total",
        "Total number of ingestion passes aborted by an error"
    );
    describe_histogram!(
        "pass_duration_seconds",
        "Time taken by an ingestion pass in seconds"
    );
}

/// Record a fully ingested block.
pub fn record_block_ingested() {
    counter!("blocks_ingested_total").increment(1);
}

/// Record transactions inserted into per-address queues.
pub fn record_transactions_recorded(count: u64) {
    counter!("transactions_recorded_total").increment(count);
}

/// Record a completed ingestion pass.
pub fn record_pass_completed() {
    counter!("passes_completed_total").increment(1);
}

/// Record an aborted ingestion pass.
pub fn record_pass_error() {
    counter!("pass_errors_total").increment(1);
}

/// Record ingestion pass duration.
pub fn record_pass_duration(duration_secs: f64) {
    histogram!("pass_duration_seconds").record(duration_secs);
}

/// A timer that automatically records pass duration when dropped.
pub struct PassTimer {
    start: Instant,
}

impl PassTimer {
    /// Start a new pass timer.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for PassTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PassTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        record_pass_duration(duration);
    }
}
