//! Two-state overflow controller with hysteresis.
//!
//! ```text
//!            allocation fails
//!   Normal ───────────────────▶ Skipping
//!     ▲                            │
//!     └────────────────────────────┘
//!   free >= C/2 && queued < max/2 (checked on release)
//!   or reset
//! ```
//!
//! The exit thresholds sit well below the entry point so a writer running
//! near capacity does not flap between states on every flush.

/// Admission state of the ring buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Overflow {
    /// Records are admitted while space and queue depth allow.
    #[default]
    Normal,
    /// Every record is dropped until the resume condition holds.
    Skipping,
}

impl Overflow {
    /// Whether records are currently being dropped.
    pub fn is_skipping(self) -> bool {
        self == Self::Skipping
    }

    /// Move to `Skipping`. Returns `true` if this was a transition.
    pub fn enter_skipping(&mut self) -> bool {
        let entered = *self == Self::Normal;
        *self = Self::Skipping;
        entered
    }

    /// Leave `Skipping` if the hysteresis condition holds.
    ///
    /// Returns `true` only on an actual `Skipping -> Normal` transition.
    pub fn try_resume(
        &mut self,
        free_bytes: usize,
        capacity: usize,
        queued: usize,
        max_segments: usize,
    ) -> bool {
        if *self == Self::Skipping && Self::resume_allowed(free_bytes, capacity, queued, max_segments)
        {
            *self = Self::Normal;
            return true;
        }
        false
    }

    /// The exit condition: at least half the buffer free and the queue
    /// below half its ceiling.
    pub fn resume_allowed(
        free_bytes: usize,
        capacity: usize,
        queued: usize,
        max_segments: usize,
    ) -> bool {
        free_bytes >= capacity / 2 && queued < max_segments / 2
    }
}
