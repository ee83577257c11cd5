//! Core types and handler signatures for the ringlog buffered writer.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the identifiers, error types, and callback signatures shared by the
//! arena and the engine.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod handler;
pub mod id;

pub use error::SinkError;
pub use handler::{SkipHandler, WriteErrorHandler};
pub use id::GenerationId;
