//! Value types for the deferred index queue.
//!
//! This crate defines the plugin-agnostic vocabulary shared by the queue and
//! by index backends:
//! - [`Operation`]: index / reindex / unindex, ordered `Unindex < Reindex < Index`
//! - [`AttributeSet`]: "all attributes" or a finite set of attribute names
//! - [`ObjectKey`] and [`Indexable`]: how queued objects are addressed and read
//! - [`KeySnapshot`]: an object paired with the key it had when it was queued
//! - [`QueueEntry`]: one pending operation
//!
//! Storage- and catalog-specific types belong to the backends, not here.

mod attributes;
mod entry;
mod key;
mod operation;

pub use attributes::AttributeSet;
pub use entry::{PendingOperation, QueueEntry};
pub use key::{Indexable, KeySnapshot, ObjectKey};
pub use operation::Operation;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type conversions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid operation code: {0}")]
    InvalidOperationCode(i8),
}
