//! Fixed-capacity generational ring buffer arena for ringlog.
//!
//! The arena owns the bytes of one buffer *generation* and the cursor
//! arithmetic that decides whether a new record fits. It is
//! single-threaded: the engine wraps [`RingArena`] in a mutex and the
//! allocator never blocks or performs I/O while that lock is held.
//!
//! # Architecture
//!
//! ```text
//! RingArena (cursor state, one per writer)
//! ├── Arc<Generation> (current buffer, replaced wholesale on reset)
//! │   └── Mutex<Box<[u8]>> (C bytes, never resized)
//! ├── start / end cursors (mod C, one slot always kept free)
//! └── Overflow (Normal | Skipping, with hysteresis)
//! ```
//!
//! A successful [`RingArena::allocate`] yields one or two [`Span`]s:
//! two when the record wraps past the end of the buffer. The caller
//! copies the record into the spans before publishing them.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod generation;
pub mod overflow;
pub mod ring;
pub mod span;

pub use config::ArenaConfig;
pub use error::ArenaError;
pub use generation::Generation;
pub use overflow::Overflow;
pub use ring::{Admission, RingArena};
pub use span::Span;
