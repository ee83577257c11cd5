//! Ringlog: a non-blocking, backpressure-aware buffered writer for log output.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! ringlog sub-crates. For most users, adding `ringlog` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::time::Duration;
//! use ringlog::prelude::*;
//!
//! let config = WriterConfig {
//!     arena: ArenaConfig::with_capacity(64 * 1024),
//!     flush_period: Duration::from_millis(10),
//! };
//! let handlers = Handlers::default()
//!     .on_skip(|n| eprintln!("dropped {n} record(s)"))
//!     .on_write_error(|_sink: &mut Vec<u8>, err| eprintln!("log destination failed: {err}"));
//!
//! let writer = LogWriter::new(Vec::new(), config, handlers).unwrap();
//! writer.write_record(b"service started\n");
//! writer.write_record(b"listening on :8080\n");
//!
//! // Rotate: everything written so far lands in the old destination.
//! let first = writer.reset(Vec::new()).unwrap();
//! assert_eq!(first, b"service started\nlistening on :8080\n");
//!
//! writer.write_record(b"after rotation\n");
//! let report = writer.shutdown();
//! assert_eq!(report.metrics.records_accepted, 3);
//! assert_eq!(writer.recover_sink().unwrap(), b"after rotation\n");
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `ringlog-core` | Generation IDs, `SinkError`, handler signatures |
//! | [`arena`] | `ringlog-arena` | Ring buffer arena, overflow controller, spans |
//! | [`engine`] | `ringlog-engine` | `LogWriter`, flush worker, config, metrics |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and handler signatures (`ringlog-core`).
pub use ringlog_core as types;

/// Ring buffer storage and admission control (`ringlog-arena`).
///
/// Most users only need [`arena::ArenaConfig`] from this module; it is
/// also available in the [`prelude`].
pub use ringlog_arena as arena;

/// The writer and its background flush worker (`ringlog-engine`).
pub use ringlog_engine as engine;

/// Common imports for typical ringlog usage.
///
/// ```rust
/// use ringlog::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use ringlog_core::{SinkError, SkipHandler, WriteErrorHandler};

    // Arena configuration
    pub use ringlog_arena::{ArenaConfig, ArenaError};

    // Engine
    pub use ringlog_engine::{
        ConfigError, Handlers, LogWriter, ResetError, ShutdownReport, WriterConfig, WriterMetrics,
    };
}
