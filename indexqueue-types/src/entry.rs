//! Queue entries.

use crate::{AttributeSet, Error, Indexable, KeySnapshot, ObjectKey, Operation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One pending operation: what to do, to which object, for which attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    /// The operation to apply.
    pub operation: Operation,
    /// The target, with its key frozen at enqueue time.
    pub target: KeySnapshot,
    /// Attributes touched by the operation; always `All` for unindex.
    pub attributes: AttributeSet,
}

impl QueueEntry {
    /// Creates an entry, capturing the object's current key.
    #[must_use]
    pub fn new(operation: Operation, object: Arc<dyn Indexable>, attributes: AttributeSet) -> Self {
        Self {
            operation,
            target: KeySnapshot::capture(object),
            attributes,
        }
    }

    /// Creates an entry from a raw operation code.
    pub fn from_code(
        code: i8,
        object: Arc<dyn Indexable>,
        attributes: AttributeSet,
    ) -> Result<Self, Error> {
        Ok(Self::new(Operation::try_from(code)?, object, attributes))
    }

    /// The key this entry is deduplicated and dispatched by.
    #[must_use]
    pub fn key(&self) -> &ObjectKey {
        self.target.frozen_key()
    }

    /// A serializable view of this entry.
    #[must_use]
    pub fn pending(&self) -> PendingOperation {
        PendingOperation {
            operation: self.operation,
            key: self.key().clone(),
            attributes: self.attributes.clone(),
        }
    }
}

/// Serializable description of a queued operation, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOperation {
    pub operation: Operation,
    pub key: ObjectKey,
    pub attributes: AttributeSet,
}
