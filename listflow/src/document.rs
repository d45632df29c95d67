//! Live document access and per-fragment processing marks.

use parking_lot::Mutex;
use std::collections::HashSet;

use crate::extract::FragmentKey;

/// A live, mutable page the pipeline observes.
///
/// Implementations hand out HTML snapshots; the pipeline never holds a parsed
/// document across a suspension point.
pub trait DocumentHost: Send + Sync {
    /// The page locator.
    fn locator(&self) -> String;

    /// Serialized HTML of the current document.
    fn snapshot(&self) -> String;
}

/// One observed document mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// CSS selector resolving to the mutated node(s) in the current snapshot.
    pub target: String,
}

impl MutationRecord {
    /// A mutation of the nodes matching `selector`.
    #[must_use]
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            target: selector.into(),
        }
    }
}

/// Fragments that have already been processed in this navigation.
///
/// Marking is idempotent: a second mark of the same key reports `false` and
/// triggers no side effects at the call site.
#[derive(Debug, Default)]
pub struct ProcessingMarks {
    marked: Mutex<HashSet<FragmentKey>>,
}

impl ProcessingMarks {
    /// Creates an empty mark set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the fragment was already processed.
    #[must_use]
    pub fn is_marked(&self, key: &FragmentKey) -> bool {
        self.marked.lock().contains(key)
    }

    /// Marks the fragment. Returns `true` only for the first mark.
    pub fn mark(&self, key: &FragmentKey) -> bool {
        self.marked.lock().insert(key.clone())
    }

    /// Removes a mark. Returns whether it was present.
    pub fn unmark(&self, key: &FragmentKey) -> bool {
        self.marked.lock().remove(key)
    }

    /// Number of marked fragments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.marked.lock().len()
    }

    /// Returns true if nothing is marked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.marked.lock().is_empty()
    }

    /// Forgets every mark.
    pub fn reset(&self) {
        self.marked.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_is_idempotent() {
        let marks = ProcessingMarks::new();
        let key = FragmentKey::for_path(&[0, 1]);

        assert!(!marks.is_marked(&key));
        assert!(marks.mark(&key));
        assert!(!marks.mark(&key));
        assert!(marks.is_marked(&key));
        assert_eq!(marks.len(), 1);

        assert!(marks.unmark(&key));
        assert!(!marks.unmark(&key));
        assert!(marks.mark(&key));

        marks.reset();
        assert!(marks.is_empty());
    }
}
