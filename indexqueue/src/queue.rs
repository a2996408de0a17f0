//! The per-unit-of-work operation log.
//!
//! `index`, `reindex` and `unindex` only append to the log. Nothing reaches
//! a backend until [`IndexQueue::process`] runs, normally right before the
//! enclosing unit of work commits. Processing reduces the log, fans every
//! remaining entry out to all registered processors and clears the log.
//!
//! ```text
//! Empty ──append──▶ Pending ──process──▶ Flushing ──▶ Empty
//!                      │
//!                      └────abort────▶ Aborting ──▶ Empty
//! ```
//!
//! A processor failure during a flush puts the log back into `Pending`
//! holding the reduced entries, so the unit of work can abort it.

use crate::config::QueueConfig;
use crate::error::{QueueError, QueueResult};
use crate::hook::{CommitHook, NoopHook};
use crate::processor::{IndexProcessor, ProcessorRegistry};
use indexqueue_types::{
    AttributeSet, Indexable, KeySnapshot, Operation, PendingOperation, QueueEntry,
};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};
use uuid::Uuid;

/// Identifier of one queue instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueueId(Uuid);

impl QueueId {
    fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle phase of a queue within one unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuePhase {
    /// Nothing queued, hook disarmed.
    Empty,
    /// Operations queued, waiting for commit or abort.
    Pending,
    /// Dispatching to processors.
    Flushing,
    /// Notifying processors of a rollback.
    Aborting,
}

struct QueueState {
    entries: Vec<QueueEntry>,
    phase: QueuePhase,
    armed: bool,
    /// `None` while the hook is being invoked.
    hook: Option<Box<dyn CommitHook>>,
}

/// Handle to an operation log.
///
/// Clones share the same log, so a processor that holds a handle can queue
/// follow-up work while the log is being flushed.
#[derive(Clone)]
pub struct IndexQueue {
    id: QueueId,
    registry: Arc<ProcessorRegistry>,
    config: Arc<QueueConfig>,
    state: Arc<Mutex<QueueState>>,
}

impl IndexQueue {
    /// Creates an empty queue dispatching to `registry`.
    pub fn new(registry: Arc<ProcessorRegistry>) -> Self {
        Self::with_config(registry, QueueConfig::default())
    }

    /// Creates an empty queue with an explicit configuration.
    pub fn with_config(registry: Arc<ProcessorRegistry>, config: QueueConfig) -> Self {
        Self {
            id: QueueId::new(),
            registry,
            config: Arc::new(config),
            state: Arc::new(Mutex::new(QueueState {
                entries: Vec::new(),
                phase: QueuePhase::Empty,
                armed: false,
                hook: Some(Box::new(NoopHook)),
            })),
        }
    }

    /// Returns the queue id.
    pub fn id(&self) -> QueueId {
        self.id
    }

    /// Returns the configuration.
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    fn lock(&self) -> QueueResult<MutexGuard<'_, QueueState>> {
        self.state.lock().map_err(|_| QueueError::LockPoisoned)
    }

    // ── Appending ────────────────────────────────────────────────

    /// Queues `object` for indexing.
    pub fn index(&self, object: Arc<dyn Indexable>, attributes: AttributeSet) -> QueueResult<()> {
        self.append(Operation::Index, object, attributes)
    }

    /// Queues a refresh of the selected attributes of `object`.
    pub fn reindex(&self, object: Arc<dyn Indexable>, attributes: AttributeSet) -> QueueResult<()> {
        self.append(Operation::Reindex, object, attributes)
    }

    /// Queues removal of `object`. Its current key is frozen now, so a later
    /// rename does not change what gets unindexed.
    pub fn unindex(&self, object: Arc<dyn Indexable>) -> QueueResult<()> {
        self.append(Operation::Unindex, object, AttributeSet::All)
    }

    fn append(
        &self,
        operation: Operation,
        object: Arc<dyn Indexable>,
        attributes: AttributeSet,
    ) -> QueueResult<()> {
        let target = KeySnapshot::capture(object);
        if target.frozen_key().is_empty() {
            return Err(QueueError::InvalidOperand(format!(
                "{:?} has no key",
                target.object()
            )));
        }
        debug!(queue = %self.id, %operation, key = %target.frozen_key(), "adding operation");

        let (hook, position, previous_phase) = {
            let mut state = self.lock()?;
            let position = state.entries.len();
            let previous_phase = state.phase;
            state.entries.push(QueueEntry {
                operation,
                target,
                attributes,
            });
            if state.phase == QueuePhase::Empty {
                state.phase = QueuePhase::Pending;
            }
            let hook = if state.armed {
                None
            } else {
                state.armed = true;
                state.hook.take()
            };
            (hook, position, previous_phase)
        };

        if let Some(mut hook) = hook {
            let registered = hook.register(self);
            self.put_hook_back(hook)?;
            if let Err(err) = registered {
                // A rejected append leaves the log as it was.
                let mut state = self.lock()?;
                if position < state.entries.len() {
                    state.entries.remove(position);
                }
                state.phase = previous_phase;
                state.armed = false;
                debug!(queue = %self.id, %err, "hook registration failed, append rolled back");
                return Err(err);
            }
        }
        let queued = self.queued()?;

        let over_threshold = self
            .config
            .auto_flush_threshold
            .is_some_and(|limit| queued >= limit);
        if !self.config.queued || over_threshold {
            debug!(queue = %self.id, queued, "flushing ahead of commit");
            self.with_hook(|hook, queue| hook.flush_now(queue))?
                .transpose()?;
        }
        Ok(())
    }

    /// Runs `f` with the hook taken out of the lock. Returns `None` if the
    /// hook is already being invoked further up the stack.
    fn with_hook<R>(
        &self,
        f: impl FnOnce(&mut dyn CommitHook, &IndexQueue) -> R,
    ) -> QueueResult<Option<R>> {
        let Some(mut hook) = self.lock()?.hook.take() else {
            return Ok(None);
        };
        let result = f(hook.as_mut(), self);
        self.put_hook_back(hook)?;
        Ok(Some(result))
    }

    fn put_hook_back(&self, hook: Box<dyn CommitHook>) -> QueueResult<()> {
        let mut state = self.lock()?;
        // A hook installed while this one was out takes precedence.
        if state.hook.is_none() {
            state.hook = Some(hook);
        }
        Ok(())
    }

    // ── Hook and state ───────────────────────────────────────────

    /// Replaces the commit trigger. The new hook registers on the next append.
    pub fn set_hook(&self, hook: impl CommitHook + 'static) -> QueueResult<()> {
        if !hook.is_invocable() {
            return Err(QueueError::InvalidHook(
                "hook is bound to a closed unit of work".into(),
            ));
        }
        debug!(queue = %self.id, "setting hook");
        let mut state = self.lock()?;
        state.hook = Some(Box::new(hook));
        state.armed = false;
        Ok(())
    }

    /// Copy of the raw, unreduced log.
    pub fn get_state(&self) -> QueueResult<Vec<QueueEntry>> {
        Ok(self.lock()?.entries.clone())
    }

    /// Replaces the raw log.
    pub fn set_state(&self, entries: Vec<QueueEntry>) -> QueueResult<()> {
        if let Some(entry) = entries.iter().find(|entry| entry.key().is_empty()) {
            return Err(QueueError::InvalidState {
                reason: format!("entry for {:?} has no key", entry.target.object()),
            });
        }
        let mut state = self.lock()?;
        if state.phase == QueuePhase::Flushing {
            return Err(QueueError::InvalidState {
                reason: "cannot replace the log while it is being flushed".into(),
            });
        }
        debug!(queue = %self.id, entries = entries.len(), "setting queue state");
        state.entries = entries;
        state.phase = if state.entries.is_empty() && !state.armed {
            QueuePhase::Empty
        } else {
            QueuePhase::Pending
        };
        Ok(())
    }

    /// Number of raw entries currently queued. Reads 0 if the log's lock is
    /// poisoned; use [`IndexQueue::queued`] to surface that instead.
    pub fn len(&self) -> usize {
        self.queued().unwrap_or(0)
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of raw entries currently queued.
    pub fn queued(&self) -> QueueResult<usize> {
        Ok(self.lock()?.entries.len())
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> QueueResult<QueuePhase> {
        Ok(self.lock()?.phase)
    }

    /// Whether the hook has registered for the current unit of work.
    pub fn is_armed(&self) -> QueueResult<bool> {
        Ok(self.lock()?.armed)
    }

    /// Serializable view of the raw log.
    pub fn pending(&self) -> QueueResult<Vec<PendingOperation>> {
        Ok(self.lock()?.entries.iter().map(QueueEntry::pending).collect())
    }

    /// The raw log as JSON, for debug endpoints and logs.
    pub fn pending_json(&self) -> QueueResult<serde_json::Value> {
        Ok(serde_json::to_value(self.pending()?)?)
    }

    // ── Flushing ─────────────────────────────────────────────────

    /// Replaces the log with its reduction. No-op without a reducer.
    pub fn optimize(&self) -> QueueResult<()> {
        let Some(reducer) = self.registry.reducer()? else {
            return Ok(());
        };
        let mut state = self.lock()?;
        let raw = std::mem::take(&mut state.entries);
        let before = raw.len();
        state.entries = reducer.optimize(raw);
        debug!(queue = %self.id, before, after = state.entries.len(), "optimized queue");
        Ok(())
    }

    /// Flushes the log to every registered processor.
    ///
    /// Returns the number of reduced entries dispatched. A nested call while
    /// the same log is already flushing does nothing and returns 0.
    pub fn process(&self) -> QueueResult<usize> {
        {
            let mut state = self.lock()?;
            if state.phase == QueuePhase::Flushing {
                warn!(queue = %self.id, "queue is already flushing, skipping");
                return Ok(0);
            }
            state.phase = QueuePhase::Flushing;
        }

        match self.flush() {
            Ok(processed) => {
                self.clear()?;
                Ok(processed)
            }
            Err(err) => {
                self.lock()?.phase = QueuePhase::Pending;
                Err(err)
            }
        }
    }

    fn flush(&self) -> QueueResult<usize> {
        let processors = self.registry.processors()?;
        debug!(queue = %self.id, processors = processors.len(), "processing queue");

        for processor in &processors {
            processor.begin()?;
        }
        if self.config.optimize {
            self.optimize()?;
        }

        // Entries stay in the log until the flush succeeds.
        let entries = self.get_state()?;
        for entry in &entries {
            for processor in &processors {
                dispatch(processor.as_ref(), entry)?;
            }
        }

        for processor in &processors {
            debug!(queue = %self.id, processor = processor.name(), "committing");
            processor.commit()?;
        }
        debug!(queue = %self.id, processed = entries.len(), "finished processing");
        Ok(entries.len())
    }

    /// Notifies every processor of a rollback, then clears the log.
    /// No queued operation is dispatched.
    ///
    /// The one exception is a log that is being flushed: aborting it returns
    /// [`QueueError::InvalidState`] and leaves the log untouched. Once the
    /// flush fails the log is `Pending` again and can be aborted.
    pub fn abort(&self) -> QueueResult<()> {
        {
            let mut state = self.lock()?;
            if state.phase == QueuePhase::Flushing {
                return Err(QueueError::InvalidState {
                    reason: "cannot abort while the log is being flushed".into(),
                });
            }
            state.phase = QueuePhase::Aborting;
        }
        for processor in self.registry.processors()? {
            debug!(queue = %self.id, processor = processor.name(), "aborting");
            if let Err(err) = processor.abort() {
                warn!(queue = %self.id, processor = processor.name(), %err, "abort notification failed");
            }
        }
        self.clear()
    }

    /// Empties the log and disarms the hook.
    pub fn clear(&self) -> QueueResult<()> {
        let mut state = self.lock()?;
        debug!(queue = %self.id, entries = state.entries.len(), "clearing queue");
        state.entries.clear();
        state.armed = false;
        state.phase = QueuePhase::Empty;
        Ok(())
    }
}

fn dispatch(processor: &dyn IndexProcessor, entry: &QueueEntry) -> QueueResult<()> {
    match entry.operation {
        Operation::Index => processor.index(entry.target.object().as_ref(), &entry.attributes),
        Operation::Reindex => processor.reindex(entry.target.object().as_ref(), &entry.attributes),
        Operation::Unindex => processor.unindex(&entry.target),
    }
}

impl fmt::Debug for IndexQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexQueue")
            .field("id", &self.id)
            .field("len", &self.len())
            .field("armed", &self.is_armed().ok())
            .finish()
    }
}
