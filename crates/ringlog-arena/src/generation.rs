//! One buffer generation: a fixed-capacity byte region.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use ringlog_core::GenerationId;

/// The bytes of one buffer generation.
///
/// Producers copy records into disjoint, freshly allocated ranges; the
/// flush worker copies already-published ranges out. Both sides hold the
/// region lock only for the duration of a `memcpy`, never across sink I/O.
pub struct Generation {
    id: GenerationId,
    bytes: Mutex<Box<[u8]>>,
    capacity: usize,
}

// Compile-time assertion: Generation must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Generation>();
};

impl Generation {
    /// Allocate a zeroed region of `capacity` bytes under a fresh id.
    pub fn new(capacity: usize) -> Self {
        Self {
            id: GenerationId::next(),
            bytes: Mutex::new(vec![0u8; capacity].into_boxed_slice()),
            capacity,
        }
    }

    /// Unique id of this generation.
    pub fn id(&self) -> GenerationId {
        self.id
    }

    /// Size of the region in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy `src` into the region starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset + src.len()` exceeds the capacity.
    pub fn fill(&self, offset: usize, src: &[u8]) {
        let mut bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        bytes[offset..offset + src.len()].copy_from_slice(src);
    }

    /// Replace the contents of `dst` with the bytes in `[start, end)`.
    ///
    /// # Panics
    ///
    /// Panics if `start > end` or `end` exceeds the capacity.
    pub fn copy_out(&self, start: usize, end: usize, dst: &mut Vec<u8>) {
        dst.clear();
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        dst.extend_from_slice(&bytes[start..end]);
    }
}

impl fmt::Debug for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generation")
            .field("id", &self.id)
            .field("capacity", &self.capacity)
            .finish()
    }
}
