//! Writer configuration, callbacks, and error types.
//!
//! [`WriterConfig`] is plain data with named defaults; [`Handlers`] holds
//! the optional callbacks. [`LogWriter::new`](crate::LogWriter::new)
//! runs [`WriterConfig::validate()`] before allocating anything.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use ringlog_arena::{ArenaConfig, ArenaError};
use ringlog_core::{SinkError, SkipHandler, WriteErrorHandler};

/// Pending bytes below this size wait for more data (or the flush timer)
/// instead of being written immediately. Not configurable.
pub const COALESCE_THRESHOLD: usize = 4096;

// ── WriterConfig ──────────────────────────────────────────────────

/// Sizing and timing for a [`LogWriter`](crate::LogWriter).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriterConfig {
    /// Ring buffer capacity and queued-segment ceiling.
    pub arena: ArenaConfig,
    /// Longest time buffered bytes may wait before being written when
    /// traffic is too sparse to reach [`COALESCE_THRESHOLD`]. Default: 100ms.
    pub flush_period: Duration,
}

impl WriterConfig {
    /// Default flush period.
    pub const DEFAULT_FLUSH_PERIOD: Duration = Duration::from_millis(100);

    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.arena.validate()?;
        if self.flush_period.is_zero() {
            return Err(ConfigError::ZeroFlushPeriod);
        }
        Ok(())
    }
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            arena: ArenaConfig::default(),
            flush_period: Self::DEFAULT_FLUSH_PERIOD,
        }
    }
}

// ── Handlers ──────────────────────────────────────────────────────

/// Optional callbacks notified of dropped records and destination failures.
///
/// Do not write to the same [`LogWriter`](crate::LogWriter) from inside
/// either handler.
pub struct Handlers<W> {
    /// Called with `1` for every dropped record, on the producing thread.
    pub on_skip: Option<SkipHandler>,
    /// Called on the flush worker for every failed write or flush of the
    /// destination. May repair the destination in place.
    pub on_write_error: Option<WriteErrorHandler<W>>,
}

impl<W> Handlers<W> {
    /// Set the skip handler.
    pub fn on_skip(mut self, handler: impl Fn(u64) + Send + Sync + 'static) -> Self {
        self.on_skip = Some(Box::new(handler));
        self
    }

    /// Set the write-error handler.
    pub fn on_write_error(
        mut self,
        handler: impl FnMut(&mut W, &SinkError) + Send + 'static,
    ) -> Self {
        self.on_write_error = Some(Box::new(handler));
        self
    }
}

impl<W> Default for Handlers<W> {
    fn default() -> Self {
        Self {
            on_skip: None,
            on_write_error: None,
        }
    }
}

impl<W> fmt::Debug for Handlers<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("on_skip", &self.on_skip.is_some())
            .field("on_write_error", &self.on_write_error.is_some())
            .finish()
    }
}

// ── ConfigError ───────────────────────────────────────────────────

/// Errors detected while constructing a writer.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// Arena sizing is invalid.
    Arena(ArenaError),
    /// `flush_period` is zero.
    ZeroFlushPeriod,
    /// The flush worker thread could not be spawned.
    ThreadSpawnFailed {
        /// Description of the spawn failure.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arena(e) => write!(f, "arena: {e}"),
            Self::ZeroFlushPeriod => write!(f, "flush_period must be non-zero"),
            Self::ThreadSpawnFailed { reason } => {
                write!(f, "thread spawn failed: {reason}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Arena(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArenaError> for ConfigError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}
