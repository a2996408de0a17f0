//! Index backends and their registry.
//!
//! Every registered processor receives every reduced entry of a flush, in
//! registration order, bracketed by `begin()` and `commit()`. On rollback a
//! processor only sees `abort()`.

use crate::error::{QueueError, QueueResult};
use crate::reducer::QueueReducer;
use indexqueue_types::{AttributeSet, Indexable};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Index backend capability.
///
/// Methods take `&self`: a processor is shared by every unit of work and
/// keeps its own batch state behind interior mutability.
pub trait IndexProcessor: Send + Sync {
    /// Name used in logs and for unregistering.
    fn name(&self) -> &str;

    /// A flush is about to dispatch entries.
    fn begin(&self) -> QueueResult<()> {
        Ok(())
    }

    /// Adds `object` to the index.
    fn index(&self, object: &dyn Indexable, attributes: &AttributeSet) -> QueueResult<()>;

    /// Refreshes the selected attributes of `object`.
    fn reindex(&self, object: &dyn Indexable, attributes: &AttributeSet) -> QueueResult<()>;

    /// Removes `object`, addressed by the key it had when it was queued.
    fn unindex(&self, object: &dyn Indexable) -> QueueResult<()>;

    /// The flush dispatched all entries.
    fn commit(&self) -> QueueResult<()> {
        Ok(())
    }

    /// The unit of work rolled back. Failures are logged and ignored.
    fn abort(&self) -> QueueResult<()> {
        Ok(())
    }
}

/// Registered processors plus the optional reducer.
///
/// Shared across units of work; queues take a snapshot of it at flush time.
#[derive(Default)]
pub struct ProcessorRegistry {
    processors: RwLock<Vec<Arc<dyn IndexProcessor>>>,
    reducer: RwLock<Option<Arc<dyn QueueReducer>>>,
}

impl ProcessorRegistry {
    /// Creates an empty registry with no reducer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry from an explicit processor list and reducer.
    pub fn with(
        processors: Vec<Arc<dyn IndexProcessor>>,
        reducer: Option<Arc<dyn QueueReducer>>,
    ) -> Self {
        Self {
            processors: RwLock::new(processors),
            reducer: RwLock::new(reducer),
        }
    }

    /// Appends a processor; dispatch follows registration order.
    pub fn register(&self, processor: Arc<dyn IndexProcessor>) -> QueueResult<()> {
        debug!(processor = processor.name(), "registering index processor");
        self.processors
            .write()
            .map_err(|_| QueueError::LockPoisoned)?
            .push(processor);
        Ok(())
    }

    /// Removes every processor registered under `name`.
    /// Returns true if anything was removed.
    pub fn unregister(&self, name: &str) -> QueueResult<bool> {
        let mut processors = self.processors.write().map_err(|_| QueueError::LockPoisoned)?;
        let before = processors.len();
        processors.retain(|p| p.name() != name);
        Ok(processors.len() != before)
    }

    /// Installs the reducer used by `optimize()`.
    pub fn set_reducer(&self, reducer: Arc<dyn QueueReducer>) -> QueueResult<()> {
        *self.reducer.write().map_err(|_| QueueError::LockPoisoned)? = Some(reducer);
        Ok(())
    }

    /// Removes the reducer; logs are then dispatched raw.
    pub fn clear_reducer(&self) -> QueueResult<()> {
        *self.reducer.write().map_err(|_| QueueError::LockPoisoned)? = None;
        Ok(())
    }

    /// Snapshot of the registered processors.
    pub fn processors(&self) -> QueueResult<Vec<Arc<dyn IndexProcessor>>> {
        Ok(self
            .processors
            .read()
            .map_err(|_| QueueError::LockPoisoned)?
            .clone())
    }

    /// The current reducer, if any.
    pub fn reducer(&self) -> QueueResult<Option<Arc<dyn QueueReducer>>> {
        Ok(self
            .reducer
            .read()
            .map_err(|_| QueueError::LockPoisoned)?
            .clone())
    }

    /// Number of registered processors.
    pub fn len(&self) -> QueueResult<usize> {
        Ok(self
            .processors
            .read()
            .map_err(|_| QueueError::LockPoisoned)?
            .len())
    }

    /// Returns true if no processor is registered.
    pub fn is_empty(&self) -> QueueResult<bool> {
        Ok(self.len()? == 0)
    }
}
