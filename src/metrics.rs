use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing summarization traffic.
#[derive(Default)]
pub struct PipelineMetrics {
    documents_received: AtomicU64,
    bytes_received: AtomicU64,
    summaries_generated: AtomicU64,
    failures: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a document that made it into transient storage.
    pub fn record_document(&self, bytes: u64) {
        self.documents_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a summary returned to a caller.
    pub fn record_summary(&self) {
        self.summaries_generated.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request that ended in the generic failure response.
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_received: self.documents_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            summaries_generated: self.summaries_generated.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of the pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Documents stored since startup.
    pub documents_received: u64,
    /// Total bytes across all stored documents.
    pub bytes_received: u64,
    /// Summaries successfully returned.
    pub summaries_generated: u64,
    /// Requests answered with the generic failure response.
    pub failures: u64,
}
