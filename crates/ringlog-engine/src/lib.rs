//! Background flush worker and non-blocking writer for ringlog.
//!
//! Provides [`LogWriter`], an [`std::io::Write`] implementation that
//! copies records into a fixed-capacity ring buffer and relays them to
//! the real destination from a single background thread. Producers never
//! wait on destination I/O: when the buffer is full, records are dropped
//! and counted instead.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
mod flush;
mod guard;
pub mod metrics;
mod queue;
pub mod writer;

pub use config::{ConfigError, Handlers, WriterConfig, COALESCE_THRESHOLD};
pub use metrics::WriterMetrics;
pub use writer::{LogWriter, ResetError, ShutdownReport};
