//! Strongly-typed identifiers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique [`GenerationId`] allocation.
static GENERATION_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identifies one buffer generation.
///
/// A generation lives from writer construction (or a reset) until the
/// flush worker has drained it and adopted its successor. Ids are drawn
/// from a process-wide monotonic counter, so two generations never share
/// an id even across different writers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenerationId(u64);

impl GenerationId {
    /// Allocate a fresh, unique generation id. Thread-safe.
    pub fn next() -> Self {
        Self(GENERATION_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}
