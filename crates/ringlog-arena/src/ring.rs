//! Ring allocator: cursor arithmetic over the current generation.
//!
//! Offsets are taken modulo the capacity `C`. One byte is permanently
//! reserved so that `start == end` always means *empty*; the buffer is
//! full at `C - 1` used bytes:
//!
//! ```text
//! free = C - ((end - start) mod C) - 1
//! ```

use std::sync::Arc;

use ringlog_core::GenerationId;
use smallvec::{smallvec, SmallVec};

use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::generation::Generation;
use crate::overflow::Overflow;
use crate::span::Span;

/// Outcome of [`RingArena::allocate`].
#[derive(Debug)]
pub enum Admission {
    /// Space was reserved. One span, or two if the record wraps.
    Admitted(SmallVec<[Span; 2]>),
    /// The record must be dropped.
    Rejected {
        /// `true` if this rejection moved the controller into `Skipping`.
        entered_skipping: bool,
    },
}

impl Admission {
    /// Whether space was reserved.
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted(_))
    }
}

/// Cursor state and overflow controller for one writer.
///
/// Not thread-safe on its own; the engine serialises every call behind
/// one lock shared by producers, the flush worker and reset.
#[derive(Debug)]
pub struct RingArena {
    generation: Arc<Generation>,
    capacity: usize,
    max_segments: usize,
    start: usize,
    end: usize,
    overflow: Overflow,
}

impl RingArena {
    /// Create an arena with a fresh, empty generation.
    pub fn new(config: &ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Self {
            generation: Arc::new(Generation::new(config.capacity)),
            capacity: config.capacity,
            max_segments: config.max_segments,
            start: 0,
            end: 0,
            overflow: Overflow::Normal,
        })
    }

    /// Bytes reserved but not yet released by the flush worker.
    pub fn used_bytes(&self) -> usize {
        (self.end + self.capacity - self.start) % self.capacity
    }

    /// Bytes available for new records. Never exceeds `capacity - 1`.
    pub fn free_bytes(&self) -> usize {
        self.capacity - self.used_bytes() - 1
    }

    /// Reserve `len` bytes for a record.
    ///
    /// `queued` is the current depth of the segment queue. Admission
    /// requires `free_bytes() >= len` and `queued < max_segments`;
    /// otherwise the controller enters `Skipping` and every later call is
    /// rejected until [`release`](Self::release) or [`reset`](Self::reset)
    /// lets it resume.
    ///
    /// A record longer than `capacity - 1` can never fit. It is rejected
    /// without touching the controller, since an empty buffer would never
    /// see the release needed to resume.
    pub fn allocate(&mut self, len: usize, queued: usize) -> Admission {
        if self.overflow.is_skipping() {
            return Admission::Rejected {
                entered_skipping: false,
            };
        }
        if len == 0 {
            return Admission::Admitted(SmallVec::new());
        }
        if len >= self.capacity {
            return Admission::Rejected {
                entered_skipping: false,
            };
        }
        if self.free_bytes() < len || queued >= self.max_segments {
            let entered_skipping = self.overflow.enter_skipping();
            return Admission::Rejected { entered_skipping };
        }

        let old_end = self.end;
        let new_end = (old_end + len) % self.capacity;
        self.end = new_end;

        let spans = if old_end < new_end {
            smallvec![Span::new(Arc::clone(&self.generation), old_end, new_end)]
        } else if new_end == 0 {
            smallvec![Span::new(Arc::clone(&self.generation), old_end, self.capacity)]
        } else {
            smallvec![
                Span::new(Arc::clone(&self.generation), old_end, self.capacity),
                Span::new(Arc::clone(&self.generation), 0, new_end),
            ]
        };
        Admission::Admitted(spans)
    }

    /// Return `len` flushed bytes of `generation` to the free pool.
    ///
    /// Releases against a retired generation are ignored. Returns `true`
    /// if the release moved the controller out of `Skipping`.
    pub fn release(&mut self, generation: GenerationId, len: usize, queued: usize) -> bool {
        if generation != self.generation.id() {
            return false;
        }
        debug_assert!(len <= self.used_bytes(), "release exceeds used bytes");
        self.start = (self.start + len) % self.capacity;
        self.overflow
            .try_resume(self.free_bytes(), self.capacity, queued, self.max_segments)
    }

    /// Install a fresh generation with empty cursors and clear `Skipping`.
    ///
    /// Returns the new generation. The previous one stays alive for as
    /// long as queued spans still reference it.
    pub fn reset(&mut self) -> Arc<Generation> {
        self.generation = Arc::new(Generation::new(self.capacity));
        self.start = 0;
        self.end = 0;
        self.overflow = Overflow::Normal;
        Arc::clone(&self.generation)
    }

    /// The current generation.
    pub fn generation(&self) -> &Arc<Generation> {
        &self.generation
    }

    /// Buffer capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Queued-segment ceiling.
    pub fn max_segments(&self) -> usize {
        self.max_segments
    }

    /// Current overflow state.
    pub fn overflow(&self) -> Overflow {
        self.overflow
    }

    /// Whether records are currently being dropped.
    pub fn is_skipping(&self) -> bool {
        self.overflow.is_skipping()
    }
}
