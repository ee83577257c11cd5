//! Arena configuration parameters.

use crate::error::ArenaError;

/// Sizing for the ring buffer and the segment queue that feeds off it.
///
/// Validated at construction; all values are immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Size of each buffer generation in bytes. At most `capacity - 1`
    /// bytes are ever buffered.
    ///
    /// Default: 32 MiB. Minimum: 2.
    pub capacity: usize,

    /// Maximum number of segments waiting in the queue before new
    /// records are dropped.
    ///
    /// Default: 500_000. Minimum: 2.
    pub max_segments: usize,
}

impl ArenaConfig {
    /// Default buffer capacity: 32 MiB.
    pub const DEFAULT_CAPACITY: usize = 32 * (1 << 20);

    /// Default queued-segment ceiling.
    pub const DEFAULT_MAX_SEGMENTS: usize = 500_000;

    /// Create a config with the given capacity and the default segment limit.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.capacity < 2 {
            return Err(ArenaError::CapacityTooSmall {
                configured: self.capacity,
            });
        }
        if self.max_segments < 2 {
            return Err(ArenaError::SegmentLimitTooSmall {
                configured: self.max_segments,
            });
        }
        if self.max_segments.checked_add(1).is_none() {
            return Err(ArenaError::SegmentLimitOverflow);
        }
        Ok(())
    }

    /// Bound of the segment queue.
    ///
    /// One slot above `max_segments`: the admission check allows a
    /// wrapped record's two segments when the queue holds `max - 1`.
    pub fn queue_bound(&self) -> usize {
        self.max_segments.saturating_add(1)
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
            max_segments: Self::DEFAULT_MAX_SEGMENTS,
        }
    }
}
