//! Cumulative writer counters.
//!
//! [`WriterMetrics`] is a point-in-time copy of the counters the writer
//! and flush worker update with relaxed atomics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of a writer's counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriterMetrics {
    /// Records copied into the ring buffer.
    pub records_accepted: u64,
    /// Records dropped (overflow, oversize, or after shutdown).
    pub records_skipped: u64,
    /// Number of `Normal -> Skipping` transitions.
    pub skip_transitions: u64,
    /// Bytes successfully written to a destination.
    pub bytes_flushed: u64,
    /// Write calls issued to a destination, successful or not.
    pub flushes: u64,
    /// Failed writes or flushes reported to the error handler.
    pub sink_errors: u64,
    /// Completed destination swaps.
    pub resets: u64,
    /// Bytes currently held in the ring buffer.
    pub buffered_bytes: usize,
    /// Whether records are currently being dropped.
    pub skipping: bool,
}

#[derive(Default)]
pub(crate) struct Counters {
    pub records_accepted: AtomicU64,
    pub records_skipped: AtomicU64,
    pub skip_transitions: AtomicU64,
    pub bytes_flushed: AtomicU64,
    pub flushes: AtomicU64,
    pub sink_errors: AtomicU64,
    pub resets: AtomicU64,
}

impl Counters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self, buffered_bytes: usize, skipping: bool) -> WriterMetrics {
        WriterMetrics {
            records_accepted: self.records_accepted.load(Ordering::Relaxed),
            records_skipped: self.records_skipped.load(Ordering::Relaxed),
            skip_transitions: self.skip_transitions.load(Ordering::Relaxed),
            bytes_flushed: self.bytes_flushed.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            sink_errors: self.sink_errors.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
            buffered_bytes,
            skipping,
        }
    }
}
