//! Queue configuration.

use crate::error::QueueResult;
use serde::{Deserialize, Serialize};

/// Configuration for an index queue.
///
/// ```toml
/// queued = true
/// optimize = true
/// auto_flush_threshold = 500
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Defer operations until commit. When off, every append is flushed
    /// immediately.
    pub queued: bool,
    /// Coalesce the log with the configured reducer before dispatch.
    pub optimize: bool,
    /// Flush eagerly once the raw log reaches this many entries.
    pub auto_flush_threshold: Option<usize>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            queued: true,
            optimize: true,
            auto_flush_threshold: None,
        }
    }
}

impl QueueConfig {
    /// Parses a configuration from TOML text. Missing keys take defaults.
    pub fn from_toml_str(text: &str) -> QueueResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Configuration with deferred indexing switched off.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            queued: false,
            ..Self::default()
        }
    }
}
