//! Queue reduction.
//!
//! A reducer folds the raw operation log into at most one entry per object
//! key. Operation codes are summed and clamped, attribute sets are merged,
//! and an object indexed then unindexed within the same unit of work drops
//! out entirely.

use indexqueue_types::{Operation, QueueEntry};
use std::collections::HashMap;

/// Optimizer capability: rewrites a raw log into its effective operations.
pub trait QueueReducer: Send + Sync {
    /// Returns the reduced log.
    fn optimize(&self, entries: Vec<QueueEntry>) -> Vec<QueueEntry>;
}

/// The default reducer.
///
/// Output order follows the first appearance of each surviving key.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoalescingReducer;

impl QueueReducer for CoalescingReducer {
    fn optimize(&self, entries: Vec<QueueEntry>) -> Vec<QueueEntry> {
        // Slots keep first-seen order; a cancelled key leaves a hole that a
        // later entry for the same key may refill.
        let mut slots: Vec<Option<QueueEntry>> = Vec::with_capacity(entries.len());
        let mut positions = HashMap::with_capacity(entries.len());

        for incoming in entries {
            let pos = *positions.entry(incoming.key().clone()).or_insert_with(|| {
                slots.push(None);
                slots.len() - 1
            });

            let merged = match slots[pos].take() {
                // Created and removed within the same unit of work.
                Some(current)
                    if current.operation == Operation::Index
                        && incoming.operation == Operation::Unindex =>
                {
                    None
                }
                Some(mut current) => {
                    current.operation = current.operation.combine(incoming.operation);
                    current.attributes.merge(&incoming.attributes);
                    Some(current)
                }
                // Unseen (or cancelled) keys start from a neutral reindex
                // seeded with the incoming attributes.
                None => Some(QueueEntry {
                    operation: Operation::Reindex.combine(incoming.operation),
                    ..incoming
                }),
            };
            slots[pos] = merged;
        }

        slots.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexqueue_types::{AttributeSet, Indexable, ObjectKey};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Doc(&'static str);

    impl Indexable for Doc {
        fn key(&self) -> ObjectKey {
            ObjectKey::new(self.0)
        }

        fn attribute(&self, _name: &str) -> Option<serde_json::Value> {
            None
        }
    }

    fn entry(op: Operation, key: &'static str, attrs: AttributeSet) -> QueueEntry {
        QueueEntry::new(op, Arc::new(Doc(key)), attrs)
    }

    #[test]
    fn lone_reindex_keeps_its_attributes() {
        let reduced = CoalescingReducer.optimize(vec![entry(
            Operation::Reindex,
            "/a",
            AttributeSet::only(["title"]),
        )]);
        assert_eq!(reduced.len(), 1);
        assert_eq!(reduced[0].operation, Operation::Reindex);
        assert_eq!(reduced[0].attributes, AttributeSet::only(["title"]));
    }

    #[test]
    fn key_reappearing_after_cancellation_starts_fresh() {
        let reduced = CoalescingReducer.optimize(vec![
            entry(Operation::Index, "/a", AttributeSet::All),
            entry(Operation::Unindex, "/a", AttributeSet::All),
            entry(Operation::Reindex, "/a", AttributeSet::only(["title"])),
        ]);
        assert_eq!(reduced.len(), 1);
        assert_eq!(reduced[0].operation, Operation::Reindex);
        assert_eq!(reduced[0].attributes, AttributeSet::only(["title"]));
    }
}
