//! Error types for the index queue.

use thiserror::Error;

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Errors that can occur while queueing or flushing index operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The object passed to index/reindex/unindex has no identity.
    #[error("invalid operand: {0}")]
    InvalidOperand(String),

    /// The commit hook cannot be invoked.
    #[error("invalid hook: {0}")]
    InvalidHook(String),

    /// A state restore was rejected.
    #[error("invalid queue state: {reason}")]
    InvalidState { reason: String },

    /// An integer that is not one of the three operation codes.
    #[error("invalid operation code: {code}")]
    InvalidOperationCode { code: i8 },

    /// A backend failed; the error is propagated untouched.
    #[error("processor {name} failed: {reason}")]
    Processor { name: String, reason: String },

    /// The unit of work already committed or aborted.
    #[error("unit of work {0} is already closed")]
    TransactionClosed(String),

    /// A lock guarding queue state was poisoned by a panicking holder.
    #[error("queue lock poisoned")]
    LockPoisoned,

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Malformed configuration.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

impl QueueError {
    /// Builds a backend failure.
    pub fn processor(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Processor {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl From<indexqueue_types::Error> for QueueError {
    fn from(err: indexqueue_types::Error) -> Self {
        match err {
            indexqueue_types::Error::InvalidOperationCode(code) => {
                Self::InvalidOperationCode { code }
            }
        }
    }
}
