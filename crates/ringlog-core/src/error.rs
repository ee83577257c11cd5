//! Destination failure type reported to the write-error handler.

use std::error::Error;
use std::fmt;
use std::io;

/// A failure raised by the output destination during a flush.
///
/// Both failure shapes are funnelled through the same handler: a write
/// that returned an error, and a write that panicked. The failed bytes
/// are not retried.
#[derive(Debug)]
pub enum SinkError {
    /// The destination returned an I/O error.
    Io(io::Error),
    /// The destination panicked while writing or flushing.
    Panicked {
        /// Panic payload rendered as text, if it was a string.
        message: String,
    },
}

impl SinkError {
    /// Build a [`SinkError::Panicked`] from a `catch_unwind` payload.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked { message }
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "destination write failed: {e}"),
            Self::Panicked { message } => write!(f, "destination panicked: {message}"),
        }
    }
}

impl Error for SinkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Panicked { .. } => None,
        }
    }
}

impl From<io::Error> for SinkError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
