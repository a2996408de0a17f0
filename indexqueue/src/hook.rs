//! Commit hooks.
//!
//! A queue arms its hook on the first append of a unit of work. The hook's
//! job is to make sure the queue is flushed right before that unit of work
//! commits. [`TransactionHook`] does this by enlisting the queue with a
//! [`UnitOfWork`](crate::UnitOfWork); tests and embedders can supply any
//! closure instead.

use crate::error::{QueueError, QueueResult};
use crate::queue::IndexQueue;
use crate::transaction::UnitInner;
use std::sync::{Arc, Weak};

/// Trigger tying a queue to its unit of work's commit signal.
pub trait CommitHook: Send {
    /// Called when the queue goes from disarmed to armed.
    fn register(&mut self, queue: &IndexQueue) -> QueueResult<()>;

    /// Flushes `queue` ahead of commit (immediate mode, size threshold).
    fn flush_now(&mut self, queue: &IndexQueue) -> QueueResult<usize> {
        queue.process()
    }

    /// Whether the hook can still be called.
    fn is_invocable(&self) -> bool {
        true
    }
}

impl<F> CommitHook for F
where
    F: FnMut(&IndexQueue) -> QueueResult<()> + Send,
{
    fn register(&mut self, queue: &IndexQueue) -> QueueResult<()> {
        self(queue)
    }
}

/// Hook that does nothing; queues start with it until bound to a unit of work.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl CommitHook for NoopHook {
    fn register(&mut self, _queue: &IndexQueue) -> QueueResult<()> {
        Ok(())
    }
}

/// Enlists the queue with a unit of work so it is flushed before commit and
/// aborted on rollback.
#[derive(Clone)]
pub struct TransactionHook {
    unit: Weak<UnitInner>,
}

impl TransactionHook {
    pub(crate) fn new(unit: &Arc<UnitInner>) -> Self {
        Self {
            unit: Arc::downgrade(unit),
        }
    }

    fn unit(&self) -> QueueResult<Arc<UnitInner>> {
        self.unit
            .upgrade()
            .ok_or_else(|| QueueError::InvalidHook("unit of work no longer exists".into()))
    }
}

impl std::fmt::Debug for TransactionHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionHook")
            .field("unit", &self.unit.upgrade().map(|unit| unit.id()))
            .finish()
    }
}

impl CommitHook for TransactionHook {
    fn register(&mut self, queue: &IndexQueue) -> QueueResult<()> {
        self.unit()?.enlist(queue)
    }

    fn flush_now(&mut self, queue: &IndexQueue) -> QueueResult<usize> {
        self.unit()?.flush_early(queue)
    }

    fn is_invocable(&self) -> bool {
        self.unit
            .upgrade()
            .map(|unit| unit.accepts_work())
            .unwrap_or(false)
    }
}
