//! Caller-supplied callback signatures.
//!
//! The skip handler runs on the producing thread after the input lock is
//! released. The error handler runs on the flush worker.

use crate::error::SinkError;

/// Invoked once per dropped record with the number of records dropped
/// (always 1). Called from producer threads, possibly concurrently.
pub type SkipHandler = Box<dyn Fn(u64) + Send + Sync>;

/// Invoked on the flush worker once per failed flush attempt, with the
/// destination that failed and the cause. The handler may repair the
/// destination in place (e.g. reopen a file).
pub type WriteErrorHandler<W> = Box<dyn FnMut(&mut W, &SinkError) + Send>;
