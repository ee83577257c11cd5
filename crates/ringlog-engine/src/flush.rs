//! The flush worker: sole consumer of the segment queue and sole writer
//! to the destination.
//!
//! The worker owns the destination exclusively (moved in via
//! `thread::spawn`) and hands it back through its `JoinHandle` on exit.
//! Per dequeued span it extends a *pending region*; the region is written
//! once it reaches [`COALESCE_THRESHOLD`] bytes, when the next span does
//! not continue it, or when the flush timer fires. Every write returns the
//! region's bytes to the arena.

use std::io::Write;
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use crossbeam_channel::{select, Receiver, Sender};
use ringlog_arena::{Generation, Span};
use ringlog_core::{SinkError, WriteErrorHandler};

use crate::config::COALESCE_THRESHOLD;
use crate::guard;
use crate::metrics::Counters;
use crate::queue::QueueEntry;
use crate::writer::Shared;

/// Bytes `[start, end)` of the current generation that were dequeued but
/// not yet written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingRegion {
    start: usize,
    end: usize,
}

impl PendingRegion {
    fn at(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    fn len(&self) -> usize {
        self.end - self.start
    }

    fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Staging capacity kept between writes. A larger region grows the
/// buffer for one write only.
const SCRATCH_RETAINED: usize = COALESCE_THRESHOLD * 2;

/// Outcome of writing the pending region.
#[derive(Clone, Copy, Debug)]
struct Drained {
    bytes: usize,
    ok: bool,
}

/// State owned by the flush worker thread.
pub(crate) struct FlushWorker<W: Write> {
    shared: Arc<Shared>,
    generation: Arc<Generation>,
    sink: W,
    pending: PendingRegion,
    /// Reused staging copy so the region lock is never held across I/O.
    scratch: Vec<u8>,
    on_write_error: Option<WriteErrorHandler<W>>,
    flush_period: Duration,
}

impl<W: Write> FlushWorker<W> {
    pub fn new(
        shared: Arc<Shared>,
        generation: Arc<Generation>,
        sink: W,
        on_write_error: Option<WriteErrorHandler<W>>,
        flush_period: Duration,
    ) -> Self {
        Self {
            shared,
            generation,
            sink,
            pending: PendingRegion::at(0),
            scratch: Vec::with_capacity(SCRATCH_RETAINED),
            on_write_error,
            flush_period,
        }
    }

    /// Main loop. Runs until every producer handle to the queue is gone
    /// and the queue is empty, then flushes and returns the destination.
    pub fn run(mut self, rx: Receiver<QueueEntry<W>>) -> W {
        tracing::debug!(generation = %self.generation.id(), "flush worker started");
        let ticker = crossbeam_channel::tick(self.flush_period);

        loop {
            select! {
                recv(rx) -> entry => match entry {
                    Ok(entry) => self.handle(entry, rx.len()),
                    Err(_) => break,
                },
                recv(ticker) -> _ => {
                    self.flush_pending(rx.len());
                }
            }
        }

        if self.flush_pending(0) {
            self.flush_sink();
        }
        tracing::debug!(generation = %self.generation.id(), "flush worker stopped");
        self.sink
    }

    /// Process one dequeued entry. `queued` is the queue depth after the
    /// dequeue, used for the arena's resume check.
    fn handle(&mut self, entry: QueueEntry<W>, queued: usize) {
        match entry {
            QueueEntry::Span(span) => self.absorb(span, queued),
            QueueEntry::Reset {
                generation,
                sink,
                reply,
            } => self.switch(generation, sink, reply),
        }
    }

    fn absorb(&mut self, span: Span, queued: usize) {
        if span.generation().id() != self.generation.id() {
            tracing::debug!(
                span_generation = %span.generation().id(),
                current = %self.generation.id(),
                "discarding span from retired generation"
            );
            return;
        }

        if self.pending.end != span.start() {
            self.flush_pending(queued);
            self.pending = PendingRegion::at(span.start());
        }

        self.pending.end = span.end();
        if self.pending.len() >= COALESCE_THRESHOLD {
            self.flush_pending(queued);
        }
    }

    /// Drain the old generation into the old destination, adopt the new
    /// pair, and hand the old destination back to the resetting caller.
    fn switch(&mut self, generation: Arc<Generation>, sink: W, reply: Sender<W>) {
        // The old generation is already retired in the arena, so its bytes
        // are written without a release.
        let drained = self.drain_pending();
        if drained.ok {
            self.flush_sink();
        }

        let old_generation = self.generation.id();
        let old_sink = std::mem::replace(&mut self.sink, sink);
        self.generation = generation;
        self.pending = PendingRegion::at(0);

        tracing::debug!(
            from = %old_generation,
            to = %self.generation.id(),
            drained_bytes = drained.bytes,
            "destination switched"
        );
        // The caller may have given up waiting; the old sink is then dropped here.
        let _ = reply.send(old_sink);
    }

    /// Write the pending region and return its bytes to the arena.
    /// Returns `false` if the write failed.
    fn flush_pending(&mut self, queued: usize) -> bool {
        let drained = self.drain_pending();
        if drained.bytes == 0 {
            return drained.ok;
        }
        let resumed = self
            .shared
            .ring
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .release(self.generation.id(), drained.bytes, queued);
        if resumed {
            tracing::info!(queued, "ring buffer drained below half, accepting records again");
        }
        drained.ok
    }

    /// `Write::flush` the destination. Only called after a clean drain, so
    /// one failed attempt is reported once.
    fn flush_sink(&mut self) {
        let result = guard::flush_guarded(&mut self.sink);
        self.report(result);
    }

    /// Write the pending region to the destination without releasing it.
    fn drain_pending(&mut self) -> Drained {
        if self.pending.is_empty() {
            return Drained { bytes: 0, ok: true };
        }
        let PendingRegion { start, end } = self.pending;
        self.generation.copy_out(start, end, &mut self.scratch);
        self.pending = PendingRegion::at(end);

        Counters::bump(&self.shared.counters.flushes);
        let result = guard::write_guarded(&mut self.sink, &self.scratch);
        if self.scratch.capacity() > SCRATCH_RETAINED {
            self.scratch.clear();
            self.scratch.shrink_to(SCRATCH_RETAINED);
        }
        let ok = result.is_ok();
        if ok {
            Counters::add(&self.shared.counters.bytes_flushed, (end - start) as u64);
        }
        self.report(result);
        Drained {
            bytes: end - start,
            ok,
        }
    }

    fn report(&mut self, result: Result<(), SinkError>) {
        let Err(err) = result else {
            return;
        };
        Counters::bump(&self.shared.counters.sink_errors);
        tracing::warn!(error = %err, generation = %self.generation.id(), "destination failed");
        if let Some(handler) = self.on_write_error.as_mut() {
            if let Err(fault) = guard::call_handler(handler, &mut self.sink, &err) {
                tracing::warn!(error = %fault, "write-error handler panicked");
            }
        }
    }
}
