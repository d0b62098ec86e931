//! Dispatcher and client metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Outcome of a single write call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Metrics looked at (including the one that aborted the batch)
    pub metrics_seen: usize,
    /// Items handed to the client
    pub items_submitted: usize,
    /// Fields skipped as non-numeric
    pub fields_rejected: usize,
    /// Aggregate metrics refused
    pub aggregates_skipped: usize,
    /// Metrics left untouched after an aborting aggregate
    pub metrics_abandoned: usize,
}

/// Cumulative counters across write calls of one dispatcher
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    write_calls: AtomicU64,
    items_submitted: AtomicU64,
    fields_rejected: AtomicU64,
    aggregates_skipped: AtomicU64,
    metrics_abandoned: AtomicU64,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one write report into the totals
    pub fn record(&self, report: &WriteReport) {
        self.write_calls.fetch_add(1, Ordering::Relaxed);
        self.items_submitted
            .fetch_add(report.items_submitted as u64, Ordering::Relaxed);
        self.fields_rejected
            .fetch_add(report.fields_rejected as u64, Ordering::Relaxed);
        self.aggregates_skipped
            .fetch_add(report.aggregates_skipped as u64, Ordering::Relaxed);
        self.metrics_abandoned
            .fetch_add(report.metrics_abandoned as u64, Ordering::Relaxed);
    }

    pub fn write_calls(&self) -> u64 {
        self.write_calls.load(Ordering::Relaxed)
    }

    pub fn items_submitted(&self) -> u64 {
        self.items_submitted.load(Ordering::Relaxed)
    }

    pub fn fields_rejected(&self) -> u64 {
        self.fields_rejected.load(Ordering::Relaxed)
    }

    pub fn aggregates_skipped(&self) -> u64 {
        self.aggregates_skipped.load(Ordering::Relaxed)
    }

    pub fn metrics_abandoned(&self) -> u64 {
        self.metrics_abandoned.load(Ordering::Relaxed)
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> DispatchSnapshot {
        DispatchSnapshot {
            write_calls: self.write_calls(),
            items_submitted: self.items_submitted(),
            fields_rejected: self.fields_rejected(),
            aggregates_skipped: self.aggregates_skipped(),
            metrics_abandoned: self.metrics_abandoned(),
        }
    }
}

/// Snapshot of dispatcher metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSnapshot {
    pub write_calls: u64,
    pub items_submitted: u64,
    pub fields_rejected: u64,
    pub aggregates_skipped: u64,
    pub metrics_abandoned: u64,
}

/// Metrics for a buffered telemetry client
#[derive(Debug, Default)]
pub struct ClientMetrics {
    /// Current queue length
    queue_len: AtomicUsize,
    /// Items delivered in successful batches
    sent_count: AtomicU64,
    /// Batches the transport failed to deliver
    failed_batches: AtomicU64,
    /// Items dropped (full queue, closed client, failed batch)
    dropped_count: AtomicU64,
}

impl ClientMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn sent_count(&self) -> u64 {
        self.sent_count.load(Ordering::Relaxed)
    }

    pub fn add_sent(&self, items: usize) {
        self.sent_count.fetch_add(items as u64, Ordering::Relaxed);
    }

    pub fn failed_batches(&self) -> u64 {
        self.failed_batches.load(Ordering::Relaxed)
    }

    pub fn inc_failed_batches(&self) {
        self.failed_batches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    pub fn add_dropped(&self, items: usize) {
        self.dropped_count.fetch_add(items as u64, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> ClientSnapshot {
        ClientSnapshot {
            queue_len: self.queue_len(),
            sent_count: self.sent_count(),
            failed_batches: self.failed_batches(),
            dropped_count: self.dropped_count(),
        }
    }
}

/// Snapshot of client metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientSnapshot {
    pub queue_len: usize,
    pub sent_count: u64,
    pub failed_batches: u64,
    pub dropped_count: u64,
}
