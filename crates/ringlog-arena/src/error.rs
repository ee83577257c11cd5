//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors detected by [`ArenaConfig::validate()`](crate::ArenaConfig::validate).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// Capacity leaves no usable byte once the reserved slot is taken.
    CapacityTooSmall {
        /// The configured capacity.
        configured: usize,
    },
    /// Segment limit is too small for the resume condition `queued < max / 2`
    /// to ever hold.
    SegmentLimitTooSmall {
        /// The configured limit.
        configured: usize,
    },
    /// `max_segments + 1` does not fit in `usize`.
    SegmentLimitOverflow,
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityTooSmall { configured } => {
                write!(f, "buffer capacity {configured} is below minimum of 2 bytes")
            }
            Self::SegmentLimitTooSmall { configured } => {
                write!(f, "max_segments {configured} is below minimum of 2")
            }
            Self::SegmentLimitOverflow => write!(f, "max_segments is too large"),
        }
    }
}

impl Error for ArenaError {}
