//! Shared test helpers for queue tests.

#![allow(dead_code)]

use indexqueue::{
    CoalescingReducer, IndexProcessor, IndexQueue, ProcessorRegistry, QueueError, QueueResult,
};
use indexqueue_types::{AttributeSet, Indexable, ObjectKey};
use std::sync::{Arc, Mutex};

/// Installs a test subscriber once; `RUST_LOG=indexqueue=debug` shows queue logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A content object whose path can change after it was queued.
#[derive(Debug)]
pub struct Doc {
    path: Mutex<String>,
    pub uid: String,
}

impl Doc {
    pub fn new(path: &str) -> Arc<Self> {
        Arc::new(Self {
            path: Mutex::new(path.to_string()),
            uid: format!("uid{}", path.replace('/', "-")),
        })
    }

    pub fn rename(&self, path: &str) {
        *self.path.lock().unwrap() = path.to_string();
    }
}

impl Indexable for Doc {
    fn key(&self) -> ObjectKey {
        ObjectKey::new(self.path.lock().unwrap().clone())
    }

    fn uid(&self) -> Option<String> {
        Some(self.uid.clone())
    }

    fn attribute(&self, name: &str) -> Option<serde_json::Value> {
        match name {
            "title" => Some(serde_json::json!(format!("Title of {}", self.key()))),
            _ => None,
        }
    }
}

/// One observed processor call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Begin(String),
    Index(String, String, AttributeSet),
    Reindex(String, String, AttributeSet),
    Unindex(String, String),
    Commit(String),
    Abort(String),
}

/// Shared, ordered record of calls across processors.
pub type CallLog = Arc<Mutex<Vec<Call>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Records every call; optionally fails on a given key or on commit.
pub struct RecordingProcessor {
    name: String,
    calls: CallLog,
    fail_on_key: Option<String>,
    fail_on_commit: bool,
    fail_on_abort: bool,
}

impl RecordingProcessor {
    pub fn new(name: &str, calls: &CallLog) -> Arc<dyn IndexProcessor> {
        Arc::new(Self::build(name, calls))
    }

    pub fn failing_on(name: &str, calls: &CallLog, key: &str) -> Arc<dyn IndexProcessor> {
        Arc::new(Self {
            fail_on_key: Some(key.to_string()),
            ..Self::build(name, calls)
        })
    }

    pub fn failing_commit(name: &str, calls: &CallLog) -> Arc<dyn IndexProcessor> {
        Arc::new(Self {
            fail_on_commit: true,
            ..Self::build(name, calls)
        })
    }

    pub fn failing_abort(name: &str, calls: &CallLog) -> Arc<dyn IndexProcessor> {
        Arc::new(Self {
            fail_on_abort: true,
            ..Self::build(name, calls)
        })
    }

    fn build(name: &str, calls: &CallLog) -> Self {
        Self {
            name: name.to_string(),
            calls: calls.clone(),
            fail_on_key: None,
            fail_on_commit: false,
            fail_on_abort: false,
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, key: &ObjectKey) -> QueueResult<()> {
        match &self.fail_on_key {
            Some(bad) if bad == key.as_str() => {
                Err(QueueError::processor(&self.name, format!("cannot index {key}")))
            }
            _ => Ok(()),
        }
    }
}

impl IndexProcessor for RecordingProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn begin(&self) -> QueueResult<()> {
        self.record(Call::Begin(self.name.clone()));
        Ok(())
    }

    fn index(&self, object: &dyn Indexable, attributes: &AttributeSet) -> QueueResult<()> {
        self.check(&object.key())?;
        self.record(Call::Index(
            self.name.clone(),
            object.key().to_string(),
            attributes.clone(),
        ));
        Ok(())
    }

    fn reindex(&self, object: &dyn Indexable, attributes: &AttributeSet) -> QueueResult<()> {
        self.check(&object.key())?;
        self.record(Call::Reindex(
            self.name.clone(),
            object.key().to_string(),
            attributes.clone(),
        ));
        Ok(())
    }

    fn unindex(&self, object: &dyn Indexable) -> QueueResult<()> {
        self.check(&object.key())?;
        self.record(Call::Unindex(self.name.clone(), object.key().to_string()));
        Ok(())
    }

    fn commit(&self) -> QueueResult<()> {
        if self.fail_on_commit {
            return Err(QueueError::processor(&self.name, "commit refused"));
        }
        self.record(Call::Commit(self.name.clone()));
        Ok(())
    }

    fn abort(&self) -> QueueResult<()> {
        self.record(Call::Abort(self.name.clone()));
        if self.fail_on_abort {
            return Err(QueueError::processor(&self.name, "abort refused"));
        }
        Ok(())
    }
}

/// Registry with the given processors and the coalescing reducer.
pub fn registry(processors: Vec<Arc<dyn IndexProcessor>>) -> Arc<ProcessorRegistry> {
    Arc::new(ProcessorRegistry::with(
        processors,
        Some(Arc::new(CoalescingReducer)),
    ))
}

/// Queue over a single recording processor named "catalog".
pub fn recorded_queue() -> (IndexQueue, CallLog) {
    let calls = call_log();
    let queue = IndexQueue::new(registry(vec![RecordingProcessor::new("catalog", &calls)]));
    (queue, calls)
}

/// Snapshot of recorded calls.
pub fn calls(log: &CallLog) -> Vec<Call> {
    log.lock().unwrap().clone()
}
