//! Snapshot-based linear undo/redo
//!
//! Each entry is a complete, immutable copy of a document's annotation
//! collection. Snapshots are shared through `Arc`, so handing the current one
//! to a renderer or exporter never copies annotations.

use std::sync::Arc;

use crate::annotation::Annotation;

/// One immutable history entry
pub type Snapshot = Arc<Vec<Annotation>>;

/// Linear history with branch discarding
#[derive(Debug, Clone)]
pub struct History {
    /// Oldest first; never empty
    snapshots: Vec<Snapshot>,
    /// Position of the live collection in `snapshots`
    index: usize,
    /// Maximum number of snapshots kept, baseline included
    limit: Option<usize>,
}

impl History {
    /// History holding only `baseline`
    pub fn new(baseline: Vec<Annotation>, limit: Option<usize>) -> Self {
        Self {
            snapshots: vec![Arc::new(baseline)],
            index: 0,
            limit: limit.map(|l| l.max(1)),
        }
    }

    /// The collection at the current position
    pub fn current(&self) -> &Snapshot {
        &self.snapshots[self.index]
    }

    /// Record `collection` as the new present, dropping any redo branch
    pub fn commit(&mut self, collection: Vec<Annotation>) -> &Snapshot {
        self.snapshots.truncate(self.index + 1);
        self.snapshots.push(Arc::new(collection));

        // Trim from the front so the oldest reachable state becomes the baseline
        if let Some(limit) = self.limit {
            if self.snapshots.len() > limit {
                let excess = self.snapshots.len() - limit;
                self.snapshots.drain(..excess);
            }
        }

        self.index = self.snapshots.len() - 1;
        self.current()
    }

    /// Step back one snapshot; `None` at the baseline
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.current())
    }

    /// Step forward one snapshot; `None` at the newest entry
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if self.index + 1 >= self.snapshots.len() {
            return None;
        }
        self.index += 1;
        Some(self.current())
    }

    /// Replace everything with a single baseline snapshot
    pub fn reset(&mut self, baseline: Vec<Annotation>) {
        self.snapshots = vec![Arc::new(baseline)];
        self.index = 0;
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.snapshots.len()
    }

    /// Number of snapshots, baseline included
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false; a history holds at least its baseline
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(Vec::new(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationStyle, AnnotationType, Point};

    fn stroke(x: f64) -> Annotation {
        Annotation::new(
            AnnotationType::Freehand,
            vec![Point::new(x, x)],
            AnnotationStyle::new(),
            1,
            0,
            "tester",
        )
    }

    fn ids(snapshot: &Snapshot) -> Vec<String> {
        snapshot.iter().map(|a| a.id.to_string()).collect()
    }

    #[test]
    fn test_new_history_has_baseline_only() {
        let history = History::default();
        assert_eq!(history.len(), 1);
        assert_eq!(history.index(), 0);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(history.current().is_empty());
    }

    #[test]
    fn test_undo_redo_walks_snapshots() {
        let mut history = History::default();
        let a = stroke(1.0);
        history.commit(vec![a.clone()]);
        history.commit(vec![a.clone(), stroke(2.0)]);

        assert_eq!(history.undo().map(|s| s.len()), Some(1));
        assert_eq!(history.undo().map(|s| s.len()), Some(0));
        assert!(history.undo().is_none());
        assert_eq!(history.index(), 0);

        assert_eq!(history.redo().map(|s| s.len()), Some(1));
        assert_eq!(history.redo().map(|s| s.len()), Some(2));
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_commit_after_undo_discards_redo_branch() {
        let mut history = History::default();
        let a = stroke(1.0);
        let b = stroke(2.0);
        let c = stroke(3.0);
        history.commit(vec![a.clone()]);
        history.commit(vec![a.clone(), b]);
        history.undo();

        history.commit(vec![a.clone(), c.clone()]);
        assert!(!history.can_redo());
        assert_eq!(history.len(), 3);
        assert_eq!(ids(history.current()), vec![a.id.to_string(), c.id.to_string()]);
    }

    #[test]
    fn test_limit_drops_oldest_snapshots() {
        let mut history = History::new(Vec::new(), Some(3));
        for i in 0..5 {
            let next: Vec<_> = (0..=i).map(|x| stroke(x as f64)).collect();
            history.commit(next);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.index(), 2);

        history.undo();
        history.undo();
        assert!(!history.can_undo());
        assert_eq!(history.current().len(), 3);
    }

    #[test]
    fn test_reset_replaces_everything() {
        let mut history = History::default();
        history.commit(vec![stroke(1.0)]);
        history.reset(vec![stroke(5.0), stroke(6.0)]);

        assert_eq!(history.len(), 1);
        assert_eq!(history.current().len(), 2);
        assert!(!history.can_undo());
    }
}
