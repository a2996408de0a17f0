//! Object addressing for queued operations.
//!
//! Backends address an object by its key, usually its path. The key may
//! change between the moment an operation is queued and the moment the queue
//! is flushed (for example after a rename), so the queue records a
//! [`KeySnapshot`] at enqueue time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identifying key of an indexable object, e.g. `/site/folder/doc`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Creates a key from its string form.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the key is empty, i.e. the object has no identity.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ObjectKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ObjectKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// An object that can be handed to index backends.
pub trait Indexable: fmt::Debug + Send + Sync {
    /// The key backends use to address this object.
    fn key(&self) -> ObjectKey;

    /// An alternate unique id, for backends that do not address by key.
    fn uid(&self) -> Option<String> {
        None
    }

    /// Reads an attribute value for indexing.
    fn attribute(&self, name: &str) -> Option<serde_json::Value>;
}

/// An object together with the key it had when it was queued.
///
/// `key()` returns the frozen key; every other read is forwarded to the
/// wrapped object. Equality and hashing use the frozen key only.
#[derive(Clone)]
pub struct KeySnapshot {
    object: Arc<dyn Indexable>,
    key: ObjectKey,
}

impl KeySnapshot {
    /// Captures the object's current key.
    #[must_use]
    pub fn capture(object: Arc<dyn Indexable>) -> Self {
        let key = object.key();
        Self { object, key }
    }

    /// Pairs an object with an explicit key.
    #[must_use]
    pub fn with_key(object: Arc<dyn Indexable>, key: ObjectKey) -> Self {
        Self { object, key }
    }

    /// The frozen key.
    #[must_use]
    pub fn frozen_key(&self) -> &ObjectKey {
        &self.key
    }

    /// The wrapped object, whose own key may have moved on.
    #[must_use]
    pub fn object(&self) -> &Arc<dyn Indexable> {
        &self.object
    }
}

impl Indexable for KeySnapshot {
    fn key(&self) -> ObjectKey {
        self.key.clone()
    }

    fn uid(&self) -> Option<String> {
        self.object.uid()
    }

    fn attribute(&self, name: &str) -> Option<serde_json::Value> {
        self.object.attribute(name)
    }
}

impl fmt::Debug for KeySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySnapshot")
            .field("key", &self.key)
            .field("object", &self.object)
            .finish()
    }
}

impl PartialEq for KeySnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for KeySnapshot {}

impl Hash for KeySnapshot {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}
