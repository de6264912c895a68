//! Process-wide counters for the ingest/worker pipeline

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    submissions_accepted: AtomicU64,
    submissions_rejected: AtomicU64,
    clips_stored: AtomicU64,
    clips_failed: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submission_accepted(&self) {
        self.submissions_accepted.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "submissions_accepted", "Metric incremented");
    }

    pub fn submission_rejected(&self) {
        self.submissions_rejected.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "submissions_rejected", "Metric incremented");
    }

    pub fn clip_stored(&self) {
        self.clips_stored.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "clips_stored", "Metric incremented");
    }

    pub fn clip_failed(&self) {
        self.clips_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "clips_failed", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            submissions_accepted: self.submissions_accepted.load(Ordering::Relaxed),
            submissions_rejected: self.submissions_rejected.load(Ordering::Relaxed),
            clips_stored: self.clips_stored.load(Ordering::Relaxed),
            clips_failed: self.clips_failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub submissions_accepted: u64,
    pub submissions_rejected: u64,
    pub clips_stored: u64,
    pub clips_failed: u64,
}
