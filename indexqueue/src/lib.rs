//! Deferred index queue.
//!
//! Content changes raise index, reindex and unindex requests many times per
//! unit of work. Applying each of them straight away is expensive, so this
//! crate queues them instead and flushes once, right before the unit of work
//! commits.
//!
//! # Components
//!
//! - **Queue** ([`IndexQueue`]): append-only per-context operation log
//! - **Reducer** ([`QueueReducer`], [`CoalescingReducer`]): folds the log into
//!   at most one effective operation per object key
//! - **Processors** ([`IndexProcessor`], [`ProcessorRegistry`]): the index
//!   backends every flush fans out to, in registration order
//! - **Hooks** ([`CommitHook`], [`TransactionHook`]): tie a queue to its
//!   unit of work's commit signal
//! - **Unit of work** ([`UnitOfWork`]): the per-context handle that owns the
//!   queue and drives commit and abort
//!
//! # Example
//!
//! ```
//! use indexqueue::{CoalescingReducer, ProcessorRegistry, UnitOfWork};
//! use indexqueue_types::{AttributeSet, Indexable, ObjectKey};
//! use std::sync::Arc;
//!
//! #[derive(Debug)]
//! struct Page(&'static str);
//!
//! impl Indexable for Page {
//!     fn key(&self) -> ObjectKey {
//!         ObjectKey::new(self.0)
//!     }
//!
//!     fn attribute(&self, _name: &str) -> Option<serde_json::Value> {
//!         None
//!     }
//! }
//!
//! let registry = Arc::new(ProcessorRegistry::with(Vec::new(), Some(Arc::new(CoalescingReducer))));
//! let unit = UnitOfWork::begin(registry);
//! let queue = unit.queue().unwrap();
//!
//! let page = Arc::new(Page("/front-page"));
//! queue.index(page.clone(), AttributeSet::All).unwrap();
//! queue.unindex(page).unwrap();
//!
//! // Created and removed in the same unit of work: nothing to dispatch.
//! assert_eq!(unit.commit().unwrap(), 0);
//! ```

mod config;
mod error;
mod hook;
mod processor;
mod queue;
mod reducer;
mod transaction;

pub use config::QueueConfig;
pub use error::{QueueError, QueueResult};
pub use hook::{CommitHook, NoopHook, TransactionHook};
pub use processor::{IndexProcessor, ProcessorRegistry};
pub use queue::{IndexQueue, QueueId, QueuePhase};
pub use reducer::{CoalescingReducer, QueueReducer};
pub use transaction::{UnitOfWork, UnitOfWorkId, UnitStatus};
