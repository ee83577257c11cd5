//! Segments: references to populated ranges of one generation.

use std::fmt;
use std::sync::Arc;

use crate::generation::Generation;

/// A contiguous byte range `[start, end)` of one buffer generation.
///
/// Produced by [`RingArena::allocate`](crate::RingArena::allocate) and
/// consumed by the flush worker. A record that wraps past the end of the
/// buffer yields two spans; they must be published in the order returned.
#[derive(Clone)]
pub struct Span {
    generation: Arc<Generation>,
    start: usize,
    end: usize,
}

impl Span {
    pub(crate) fn new(generation: Arc<Generation>, start: usize, end: usize) -> Self {
        debug_assert!(start <= end && end <= generation.capacity());
        Self {
            generation,
            start,
            end,
        }
    }

    /// The generation this span belongs to.
    pub fn generation(&self) -> &Arc<Generation> {
        &self.generation
    }

    /// Start offset (inclusive).
    pub fn start(&self) -> usize {
        self.start
    }

    /// End offset (exclusive).
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of bytes covered.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Copy a record piece into the span.
    ///
    /// # Panics
    ///
    /// Panics if `src.len()` differs from [`len()`](Self::len).
    pub fn fill(&self, src: &[u8]) {
        assert_eq!(
            src.len(),
            self.len(),
            "span fill length mismatch: span covers {} bytes",
            self.len()
        );
        self.generation.fill(self.start, src);
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Span")
            .field("generation", &self.generation.id())
            .field("start", &self.start)
            .field("end", &self.end)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_lands_at_offset() {
        let generation = Arc::new(Generation::new(8));
        let span = Span::new(Arc::clone(&generation), 3, 6);
        assert_eq!(span.len(), 3);
        assert!(!span.is_empty());
        span.fill(b"xyz");

        let mut out = Vec::new();
        generation.copy_out(0, 8, &mut out);
        assert_eq!(out, b"\0\0\0xyz\0\0");
    }

    #[test]
    #[should_panic(expected = "span fill length mismatch")]
    fn fill_wrong_length_panics() {
        let span = Span::new(Arc::new(Generation::new(8)), 0, 2);
        span.fill(b"abc");
    }
}
