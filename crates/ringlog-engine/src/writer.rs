//! User-facing [`LogWriter`] API, reset barrier, and shutdown.
//!
//! # Architecture
//!
//! ```text
//! Producer Thread(s)                              Flush Thread
//!     |                                               |
//!     |--write_record()                               |
//!     |   lock input                                  |
//!     |   lock ring: allocate(len, queue.len())       |
//!     |   copy record into span(s)                    |
//!     |   queue.send(Span) ------------------------->| select! { queue, tick }
//!     |   [bounded(max_segments + 1)]                 | coalesce, write to sink
//!     |                                               | lock ring: release(len)
//!     |--reset(new_sink)                              |
//!     |   lock input, lock ring: reset()              |
//!     |   queue.send(Reset) ------------------------->| drain old gen -> old sink
//!     |<-- old sink via reply ------------------------| adopt new gen + sink
//! ```
//!
//! Lock order is always `input` then `ring`. The flush worker only ever
//! takes `ring`, and never while calling the destination.

use std::error::Error;
use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use ringlog_arena::{Admission, RingArena};
use ringlog_core::SkipHandler;

use crate::config::{ConfigError, Handlers, WriterConfig};
use crate::flush::FlushWorker;
use crate::metrics::{Counters, WriterMetrics};
use crate::queue::{segment_queue, QueueEntry};

/// State shared between producers and the flush worker.
pub(crate) struct Shared {
    pub ring: Mutex<RingArena>,
    pub counters: Counters,
}

/// Every mutex here guards state that is consistent between statements,
/// so a poisoned lock is still safe to use.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Error types ──────────────────────────────────────────────────

/// Error swapping the destination.
pub enum ResetError<W> {
    /// The writer has been shut down. The rejected destination is
    /// handed back untouched.
    Shutdown(W),
    /// The flush worker terminated before confirming the drain. Carries
    /// the rejected destination if it never reached the worker.
    WorkerLost(Option<W>),
}

impl<W> ResetError<W> {
    /// Recover the destination that was passed to `reset`, if it was not
    /// consumed.
    pub fn into_sink(self) -> Option<W> {
        match self {
            Self::Shutdown(sink) => Some(sink),
            Self::WorkerLost(sink) => sink,
        }
    }
}

impl<W> fmt::Debug for ResetError<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shutdown(_) => f.write_str("Shutdown(..)"),
            Self::WorkerLost(_) => f.write_str("WorkerLost(..)"),
        }
    }
}

impl<W> fmt::Display for ResetError<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shutdown(_) => write!(f, "writer has shut down"),
            Self::WorkerLost(_) => write!(f, "flush worker terminated during reset"),
        }
    }
}

impl<W> Error for ResetError<W> {}

/// What `admit` did with one record.
enum Outcome {
    Accepted,
    Dropped,
    /// Dropped, and this record moved the arena into `Skipping`.
    Overflowed { buffered_bytes: usize, queued: usize },
    /// Dropped because the flush worker is gone.
    WorkerLost,
}

// ── ShutdownReport ───────────────────────────────────────────────

/// Report from [`LogWriter::shutdown`].
#[derive(Debug)]
pub struct ShutdownReport {
    /// Total time spent draining and joining the flush worker.
    pub total_ms: u64,
    /// Whether the flush worker was joined and its destination recovered.
    pub worker_joined: bool,
    /// Whether the writer had already been shut down.
    pub already_stopped: bool,
    /// Counters at the end of the shutdown.
    pub metrics: WriterMetrics,
}

// ── LogWriter ────────────────────────────────────────────────────

/// Non-blocking, backpressure-aware buffered writer.
///
/// Records are copied into a fixed-capacity ring buffer and written to
/// the destination `W` by a single background thread. Writing never
/// blocks on the destination and never fails: when the buffer or the
/// segment queue is full the record is dropped and the skip handler is
/// called instead.
///
/// `LogWriter` is `Send + Sync`; share it across producer threads with an
/// `Arc`, or write through `&LogWriter` directly since `&LogWriter`
/// implements [`Write`].
pub struct LogWriter<W: Write + Send + 'static> {
    shared: Arc<Shared>,
    /// The input lock. Serialises allocate, copy and enqueue so that the
    /// spans of two wrapped records never interleave. `None` after shutdown.
    input: Mutex<Option<Sender<QueueEntry<W>>>>,
    on_skip: Option<SkipHandler>,
    worker: Mutex<Option<JoinHandle<W>>>,
    /// Recovered from the flush worker on shutdown.
    recovered_sink: Mutex<Option<W>>,
    /// Set once a lost flush worker has been logged.
    worker_lost: AtomicBool,
    config: WriterConfig,
}

// Compile-time assertion: LogWriter must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<LogWriter<Vec<u8>>>();
};

impl<W: Write + Send + 'static> LogWriter<W> {
    /// Create a writer relaying to `sink` and spawn its flush worker.
    pub fn new(sink: W, config: WriterConfig, handlers: Handlers<W>) -> Result<Self, ConfigError> {
        config.validate()?;

        let ring = RingArena::new(&config.arena)?;
        let generation = Arc::clone(ring.generation());
        let shared = Arc::new(Shared {
            ring: Mutex::new(ring),
            counters: Counters::default(),
        });

        let (tx, rx) = segment_queue(config.arena.queue_bound());
        let worker = FlushWorker::new(
            Arc::clone(&shared),
            generation,
            sink,
            handlers.on_write_error,
            config.flush_period,
        );
        let handle = thread::Builder::new()
            .name("ringlog-flush".into())
            .spawn(move || worker.run(rx))
            .map_err(|e| ConfigError::ThreadSpawnFailed {
                reason: format!("flush worker: {e}"),
            })?;

        Ok(Self {
            shared,
            input: Mutex::new(Some(tx)),
            on_skip: handlers.on_skip,
            worker: Mutex::new(Some(handle)),
            recovered_sink: Mutex::new(None),
            worker_lost: AtomicBool::new(false),
            config,
        })
    }

    /// Create a writer with the default configuration and no handlers.
    pub fn with_defaults(sink: W) -> Result<Self, ConfigError> {
        Self::new(sink, WriterConfig::default(), Handlers::default())
    }

    /// Buffer one record.
    ///
    /// Always returns `record.len()`, whether the record was buffered or
    /// dropped. A zero-length record is a no-op and returns 0. Records
    /// written after [`shutdown`](Self::shutdown) are dropped.
    ///
    /// Events are only emitted once the input lock is released: a
    /// subscriber may write them back into this same writer.
    pub fn write_record(&self, record: &[u8]) -> usize {
        if record.is_empty() {
            return 0;
        }
        let counters = &self.shared.counters;
        match self.admit(record) {
            Outcome::Accepted => {
                Counters::bump(&counters.records_accepted);
                return record.len();
            }
            Outcome::Dropped => {}
            Outcome::Overflowed {
                buffered_bytes,
                queued,
            } => {
                Counters::bump(&counters.skip_transitions);
                tracing::warn!(
                    buffered_bytes,
                    queued,
                    record_len = record.len(),
                    "ring buffer full, dropping records"
                );
            }
            Outcome::WorkerLost => {
                if !self.worker_lost.swap(true, Ordering::Relaxed) {
                    tracing::error!("flush worker is gone, dropping records");
                }
            }
        }

        Counters::bump(&counters.records_skipped);
        if let Some(on_skip) = &self.on_skip {
            on_skip(1);
        }
        record.len()
    }

    /// Allocate, copy and enqueue under the input lock.
    fn admit(&self, record: &[u8]) -> Outcome {
        let input = lock(&self.input);
        let Some(tx) = input.as_ref() else {
            return Outcome::Dropped;
        };

        let (admission, buffered_bytes) = {
            let mut ring = lock(&self.shared.ring);
            let admission = ring.allocate(record.len(), tx.len());
            (admission, ring.used_bytes())
        };

        let spans = match admission {
            Admission::Admitted(spans) => spans,
            Admission::Rejected {
                entered_skipping: true,
            } => {
                return Outcome::Overflowed {
                    buffered_bytes,
                    queued: tx.len(),
                }
            }
            Admission::Rejected { .. } => return Outcome::Dropped,
        };

        // Bytes land in the arena before the span is visible to the worker.
        let mut rest = record;
        for span in spans {
            let (head, tail) = rest.split_at(span.len());
            span.fill(head);
            rest = tail;
            // Cannot block: depth was checked against max_segments under
            // the ring lock and only input-lock holders send.
            if tx.send(QueueEntry::Span(span)).is_err() {
                return Outcome::WorkerLost;
            }
        }
        Outcome::Accepted
    }

    /// Swap the destination.
    ///
    /// Records buffered before this call are written to the old
    /// destination; records written after it returns go only to `sink`.
    /// Blocks until the flush worker has drained the previous generation,
    /// then returns the old destination, which the caller may now close.
    ///
    /// The new generation starts empty and clears any `Skipping` state.
    pub fn reset(&self, sink: W) -> Result<W, ResetError<W>> {
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        loop {
            let input = lock(&self.input);
            let Some(tx) = input.as_ref() else {
                return Err(ResetError::Shutdown(sink));
            };
            // Never wait on the worker while holding the input lock: the
            // worker's own log events may be routed into this writer.
            if tx.is_full() {
                if self.worker_finished() {
                    return Err(ResetError::WorkerLost(Some(sink)));
                }
                drop(input);
                thread::sleep(Duration::from_millis(1));
                continue;
            }

            let generation = lock(&self.shared.ring).reset();
            // Sent under the input lock so no span of the new generation
            // can precede the sentinel. Only input-lock holders send, so
            // the queue still has room.
            let entry = QueueEntry::Reset {
                generation,
                sink,
                reply: reply_tx,
            };
            match tx.try_send(entry) {
                Ok(()) => break,
                Err(err) => {
                    return match err.into_inner() {
                        QueueEntry::Reset { sink, .. } => Err(ResetError::WorkerLost(Some(sink))),
                        QueueEntry::Span(_) => Err(ResetError::WorkerLost(None)),
                    };
                }
            }
        }

        let old = reply_rx.recv().map_err(|_| ResetError::WorkerLost(None))?;
        Counters::bump(&self.shared.counters.resets);
        Ok(old)
    }

    fn worker_finished(&self) -> bool {
        lock(&self.worker)
            .as_ref()
            .map_or(true, JoinHandle::is_finished)
    }

    /// Stop accepting records, drain everything already buffered to the
    /// current destination, and join the flush worker.
    ///
    /// Blocks for as long as the destination takes to absorb the backlog.
    /// Idempotent; called automatically on drop. The final destination can
    /// then be taken with [`recover_sink`](Self::recover_sink).
    pub fn shutdown(&self) -> ShutdownReport {
        let start = Instant::now();

        // Dropping the only sender disconnects the queue once the worker
        // has consumed what is already in it.
        let sender = lock(&self.input).take();
        let already_stopped = sender.is_none();
        drop(sender);

        let handle = lock(&self.worker).take();
        let worker_joined = match handle {
            Some(handle) => match handle.join() {
                Ok(sink) => {
                    *lock(&self.recovered_sink) = Some(sink);
                    true
                }
                Err(_) => {
                    tracing::warn!("flush worker panicked; destination lost");
                    false
                }
            },
            None => false,
        };

        let report = ShutdownReport {
            total_ms: start.elapsed().as_millis() as u64,
            worker_joined,
            already_stopped,
            metrics: self.metrics(),
        };
        if !already_stopped {
            tracing::debug!(
                total_ms = report.total_ms,
                worker_joined,
                bytes_flushed = report.metrics.bytes_flushed,
                records_skipped = report.metrics.records_skipped,
                "writer shut down"
            );
        }
        report
    }

    /// Take the destination recovered by [`shutdown`](Self::shutdown).
    pub fn recover_sink(&self) -> Option<W> {
        lock(&self.recovered_sink).take()
    }

    /// Snapshot of the writer's counters.
    pub fn metrics(&self) -> WriterMetrics {
        let (buffered_bytes, skipping) = {
            let ring = lock(&self.shared.ring);
            (ring.used_bytes(), ring.is_skipping())
        };
        self.shared.counters.snapshot(buffered_bytes, skipping)
    }

    /// Whether records are currently being dropped.
    pub fn is_skipping(&self) -> bool {
        lock(&self.shared.ring).is_skipping()
    }

    /// Bytes currently held in the ring buffer.
    pub fn buffered_bytes(&self) -> usize {
        lock(&self.shared.ring).used_bytes()
    }

    /// The configuration this writer was built with.
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }
}

impl<W: Write + Send + 'static> Drop for LogWriter<W> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<W: Write + Send + 'static> Write for &LogWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_record(buf))
    }

    /// No-op: the flush worker decides when bytes reach the destination.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<W: Write + Send + 'static> Write for LogWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_record(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<W: Write + Send + 'static> fmt::Debug for LogWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogWriter")
            .field("config", &self.config)
            .field("metrics", &self.metrics())
            .finish()
    }
}
