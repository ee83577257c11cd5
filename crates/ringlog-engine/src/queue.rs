//! Segment queue entries exchanged between producers and the flush worker.
//!
//! The queue is a bounded crossbeam channel sized `max_segments + 1`.
//! Producers check its depth under the arena lock before allocating, so a
//! span send never finds it full. The queue itself never drops entries.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use ringlog_arena::{Generation, Span};

/// One item of the segment queue.
pub(crate) enum QueueEntry<W> {
    /// A populated range of the current generation.
    Span(Span),
    /// Destination swap sentinel: zero-length, carries only the new
    /// generation and destination. The worker answers on `reply` with the
    /// previous destination once the previous generation is fully drained.
    Reset {
        generation: Arc<Generation>,
        sink: W,
        reply: Sender<W>,
    },
}

/// Create the segment queue for a writer.
pub(crate) fn segment_queue<W>(bound: usize) -> (Sender<QueueEntry<W>>, Receiver<QueueEntry<W>>) {
    crossbeam_channel::bounded(bound)
}
