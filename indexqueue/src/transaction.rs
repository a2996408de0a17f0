//! Units of work.
//!
//! A [`UnitOfWork`] is the explicit per-context handle: it lazily owns one
//! [`IndexQueue`], keeps the list of queues enlisted for a flush right
//! before commit, and tracks which of them are flushing so a nested trigger
//! cannot flush the same queue twice. Dropping an active unit of work aborts
//! it.

use crate::config::QueueConfig;
use crate::error::{QueueError, QueueResult};
use crate::hook::TransactionHook;
use crate::processor::ProcessorRegistry;
use crate::queue::{IndexQueue, QueueId};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

/// Identifier of a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitOfWorkId(Uuid);

impl fmt::Display for UnitOfWorkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitStatus {
    Active,
    /// Running before-commit flushes.
    Committing,
    Committed,
    Aborted,
}

pub(crate) struct UnitInner {
    id: UnitOfWorkId,
    registry: Arc<ProcessorRegistry>,
    config: QueueConfig,
    status: Mutex<UnitStatus>,
    queue: Mutex<Option<IndexQueue>>,
    enlisted: Mutex<Vec<IndexQueue>>,
    flushing: Mutex<HashSet<QueueId>>,
}

impl UnitInner {
    pub(crate) fn id(&self) -> UnitOfWorkId {
        self.id
    }

    fn status(&self) -> QueueResult<UnitStatus> {
        Ok(*self.status.lock().map_err(|_| QueueError::LockPoisoned)?)
    }

    fn set_status(&self, status: UnitStatus) -> QueueResult<()> {
        *self.status.lock().map_err(|_| QueueError::LockPoisoned)? = status;
        Ok(())
    }

    /// Whether queues may still enlist.
    pub(crate) fn accepts_work(&self) -> bool {
        matches!(
            self.status(),
            Ok(UnitStatus::Active | UnitStatus::Committing)
        )
    }

    /// Registers `queue` for the before-commit flush. Idempotent per queue.
    pub(crate) fn enlist(&self, queue: &IndexQueue) -> QueueResult<()> {
        if !self.accepts_work() {
            return Err(QueueError::TransactionClosed(self.id.to_string()));
        }
        let mut enlisted = self.enlisted.lock().map_err(|_| QueueError::LockPoisoned)?;
        if !enlisted.iter().any(|q| q.id() == queue.id()) {
            debug!(unit_of_work = %self.id, queue = %queue.id(), "enlisting queue");
            enlisted.push(queue.clone());
        }
        Ok(())
    }

    /// Flushes `queue` ahead of commit. A failure aborts the unit of work,
    /// so processors never see a second `begin()` for the same work.
    pub(crate) fn flush_early(&self, queue: &IndexQueue) -> QueueResult<usize> {
        match self.flush(queue) {
            Ok(count) => Ok(count),
            Err(err) => {
                if matches!(self.status(), Ok(UnitStatus::Active)) {
                    warn!(unit_of_work = %self.id, queue = %queue.id(), %err, "early flush failed, aborting");
                    self.abort_all()?;
                }
                Err(err)
            }
        }
    }

    /// Flushes `queue` unless it is empty or already flushing.
    fn flush(&self, queue: &IndexQueue) -> QueueResult<usize> {
        let items = queue.queued()?;
        if items == 0 {
            return Ok(0);
        }
        {
            let mut flushing = self.flushing.lock().map_err(|_| QueueError::LockPoisoned)?;
            if !flushing.insert(queue.id()) {
                debug!(unit_of_work = %self.id, queue = %queue.id(), "already flushing, skipping");
                return Ok(0);
            }
        }
        debug!(unit_of_work = %self.id, queue = %queue.id(), items, "flushing queue");
        let result = queue.process();
        self.flushing
            .lock()
            .map_err(|_| QueueError::LockPoisoned)?
            .remove(&queue.id());
        result
    }

    fn take_enlisted(&self) -> QueueResult<Vec<IndexQueue>> {
        Ok(std::mem::take(
            &mut *self.enlisted.lock().map_err(|_| QueueError::LockPoisoned)?,
        ))
    }

    fn commit(&self) -> QueueResult<usize> {
        match self.status()? {
            UnitStatus::Active => {}
            _ => return Err(QueueError::TransactionClosed(self.id.to_string())),
        }
        self.set_status(UnitStatus::Committing)?;

        let queues = self
            .enlisted
            .lock()
            .map_err(|_| QueueError::LockPoisoned)?
            .clone();
        let mut processed = 0;
        for queue in &queues {
            match self.flush(queue) {
                Ok(count) => processed += count,
                Err(err) => {
                    warn!(unit_of_work = %self.id, queue = %queue.id(), %err, "flush failed, aborting");
                    self.abort_all()?;
                    return Err(err);
                }
            }
        }

        // Work queued by processors during the flush is not carried over.
        self.take_enlisted()?;
        self.set_status(UnitStatus::Committed)?;
        debug!(unit_of_work = %self.id, processed, "committed");
        Ok(processed)
    }

    fn abort_all(&self) -> QueueResult<()> {
        self.set_status(UnitStatus::Aborted)?;
        let own = self.queue.lock().map_err(|_| QueueError::LockPoisoned)?.clone();
        let mut queues = self.take_enlisted()?;
        if let Some(own) = own {
            if !queues.iter().any(|q| q.id() == own.id()) {
                queues.push(own);
            }
        }

        for queue in queues {
            if let Err(err) = queue.abort() {
                warn!(unit_of_work = %self.id, queue = %queue.id(), %err, "queue abort failed");
            }
        }
        debug!(unit_of_work = %self.id, "aborted");
        Ok(())
    }
}

impl fmt::Debug for UnitInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitInner")
            .field("id", &self.id)
            .field("status", &self.status.lock().ok().map(|s| *s))
            .finish()
    }
}

/// One logical transaction-scoped sequence of operations.
#[derive(Debug)]
pub struct UnitOfWork {
    inner: Arc<UnitInner>,
}

impl UnitOfWork {
    /// Starts a unit of work dispatching to `registry`.
    pub fn begin(registry: Arc<ProcessorRegistry>) -> Self {
        Self::with_config(registry, QueueConfig::default())
    }

    /// Starts a unit of work whose queue uses `config`.
    pub fn with_config(registry: Arc<ProcessorRegistry>, config: QueueConfig) -> Self {
        let id = UnitOfWorkId(Uuid::now_v7());
        debug!(unit_of_work = %id, "beginning unit of work");
        Self {
            inner: Arc::new(UnitInner {
                id,
                registry,
                config,
                status: Mutex::new(UnitStatus::Active),
                queue: Mutex::new(None),
                enlisted: Mutex::new(Vec::new()),
                flushing: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Returns the unit of work id.
    pub fn id(&self) -> UnitOfWorkId {
        self.inner.id
    }

    /// Returns the current status.
    pub fn status(&self) -> QueueResult<UnitStatus> {
        self.inner.status()
    }

    /// The queue of this unit of work, created on first use.
    pub fn queue(&self) -> QueueResult<IndexQueue> {
        if !self.inner.accepts_work() {
            return Err(QueueError::TransactionClosed(self.inner.id.to_string()));
        }
        let mut slot = self.inner.queue.lock().map_err(|_| QueueError::LockPoisoned)?;
        if let Some(queue) = slot.as_ref() {
            return Ok(queue.clone());
        }
        let queue = IndexQueue::with_config(self.inner.registry.clone(), self.inner.config.clone());
        queue.set_hook(self.hook())?;
        *slot = Some(queue.clone());
        Ok(queue)
    }

    /// A hook binding any queue to this unit of work.
    pub fn hook(&self) -> TransactionHook {
        TransactionHook::new(&self.inner)
    }

    /// Flushes `queue` now, e.g. before a search that must see pending work.
    /// Returns 0 if the queue is empty or already flushing. If a processor
    /// fails, the whole unit of work is aborted and the error returned.
    pub fn flush(&self, queue: &IndexQueue) -> QueueResult<usize> {
        self.inner.flush_early(queue)
    }

    /// Flushes every enlisted queue, then commits. If a flush fails, every
    /// queue is aborted and the error is returned.
    pub fn commit(self) -> QueueResult<usize> {
        self.inner.commit()
    }

    /// Rolls back: processors only see `abort()` and every queue is cleared.
    pub fn abort(self) -> QueueResult<()> {
        self.inner.abort_all()
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        if matches!(self.inner.status(), Ok(UnitStatus::Active)) {
            debug!(unit_of_work = %self.inner.id, "dropped while active, aborting");
            if let Err(err) = self.inner.abort_all() {
                warn!(unit_of_work = %self.inner.id, %err, "abort on drop failed");
            }
        }
    }
}
