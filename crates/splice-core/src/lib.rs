//! Core domain model and contracts for Splice.
//!
//! Everything in this crate is pure: documents, ranges, the line
//! reconciliation engine, sentinel markers, code-fence extraction and the
//! symbol outline. Host and network concerns are expressed as traits in
//! [`protocol`] and implemented elsewhere.

pub mod document;
pub mod error;
pub mod extract;
pub mod index;
pub mod protocol;
pub mod reconcile;
pub mod sentinel;

pub use document::{Document, LineRange, Position, TextRange};
pub use error::{PreconditionError, SpliceError};
pub use protocol::*;
pub use reconcile::{normalize_line, reconcile, reconcile_detailed, Reconciliation};
