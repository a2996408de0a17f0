use indexqueue_types::{
    AttributeSet, Indexable, KeySnapshot, ObjectKey, Operation, QueueEntry,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Debug)]
struct Movable {
    path: Mutex<String>,
    title: &'static str,
}

impl Movable {
    fn new(path: &str) -> Arc<Self> {
        Arc::new(Self {
            path: Mutex::new(path.to_string()),
            title: "Hello",
        })
    }

    fn rename(&self, path: &str) {
        *self.path.lock().unwrap() = path.to_string();
    }
}

impl Indexable for Movable {
    fn key(&self) -> ObjectKey {
        ObjectKey::new(self.path.lock().unwrap().clone())
    }

    fn uid(&self) -> Option<String> {
        Some("uid-1".into())
    }

    fn attribute(&self, name: &str) -> Option<serde_json::Value> {
        (name == "title").then(|| serde_json::json!(self.title))
    }
}

#[test]
fn snapshot_freezes_key_across_rename() {
    let doc = Movable::new("/a");
    let snapshot = KeySnapshot::capture(doc.clone());
    doc.rename("/b");

    assert_eq!(snapshot.key(), ObjectKey::new("/a"));
    assert_eq!(snapshot.object().key(), ObjectKey::new("/b"));
}

#[test]
fn snapshot_forwards_other_reads() {
    let doc = Movable::new("/a");
    let snapshot = KeySnapshot::capture(doc);
    assert_eq!(snapshot.uid().as_deref(), Some("uid-1"));
    assert_eq!(snapshot.attribute("title"), Some(serde_json::json!("Hello")));
    assert_eq!(snapshot.attribute("missing"), None);
}

#[test]
fn snapshot_equality_uses_frozen_key() {
    let doc = Movable::new("/a");
    let first = KeySnapshot::capture(doc.clone());
    let second = KeySnapshot::capture(doc.clone());
    doc.rename("/b");
    let third = KeySnapshot::capture(doc);

    assert_eq!(first, second);
    assert_ne!(first, third);
    let set: HashSet<_> = [first, second, third].into_iter().collect();
    assert_eq!(set.len(), 2);
}

#[test]
fn entry_from_code() {
    let entry = QueueEntry::from_code(-1, Movable::new("/a"), AttributeSet::All).unwrap();
    assert_eq!(entry.operation, Operation::Unindex);
    assert_eq!(entry.key(), &ObjectKey::new("/a"));
    assert!(QueueEntry::from_code(3, Movable::new("/a"), AttributeSet::All).is_err());
}

#[test]
fn pending_view_serializes() {
    let entry = QueueEntry::new(
        Operation::Reindex,
        Movable::new("/a"),
        AttributeSet::only(["title"]),
    );
    let json = serde_json::to_value(entry.pending()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"operation": 0, "key": "/a", "attributes": {"only": ["title"]}})
    );
}

#[test]
fn object_key_basics() {
    let key = ObjectKey::from("/site/doc");
    assert_eq!(key.as_str(), "/site/doc");
    assert_eq!(key.to_string(), "/site/doc");
    assert!(!key.is_empty());
    assert!(ObjectKey::from(String::new()).is_empty());
}
