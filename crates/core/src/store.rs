//! Annotation store
//!
//! The single owner of annotation state. Every mutation builds a new collection
//! and commits it to the active document's [`History`]; the live collection is
//! always the snapshot at the current history index. Session state (current
//! tool, style, active page and selection) lives alongside but is never
//! historied.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::annotation::{
    Annotation, AnnotationId, AnnotationPatch, AnnotationStyle, AnnotationType, StylePatch,
};
use crate::error::{EngineError, Result, ValidationError};
use crate::history::{History, Snapshot};

/// Identifier of an open document; each has its own isolated history
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self("default".to_string())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Ordered annotations, current tool and style, selection and per-document history
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    active: DocumentId,
    history: History,
    /// Histories of open documents other than the active one
    parked: HashMap<DocumentId, History>,
    active_page: u32,
    current_tool: AnnotationType,
    current_style: AnnotationStyle,
    selection: BTreeSet<AnnotationId>,
    history_limit: Option<usize>,
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationStore {
    /// Empty store on the default document, freehand tool, default style
    pub fn new() -> Self {
        Self {
            active: DocumentId::default(),
            history: History::default(),
            parked: HashMap::new(),
            active_page: 1,
            current_tool: AnnotationType::Freehand,
            current_style: AnnotationStyle::new(),
            selection: BTreeSet::new(),
            history_limit: None,
        }
    }

    /// Builder: cap the number of snapshots kept per document
    pub fn with_history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit;
        self.history = History::new(self.history.current().to_vec(), limit);
        self
    }

    /// Builder: initial tool and style for new annotations
    pub fn with_defaults(mut self, tool: AnnotationType, style: AnnotationStyle) -> Self {
        self.current_tool = tool;
        self.current_style = style;
        self
    }

    // ----- Reads -----

    /// Live collection of the active document, in paint order
    pub fn annotations(&self) -> &Snapshot {
        self.history.current()
    }

    /// Annotations on `page`, in paint order
    pub fn page_annotations(&self, page: u32) -> impl DoubleEndedIterator<Item = &Annotation> {
        self.annotations()
            .iter()
            .filter(move |annotation| annotation.page_number == page)
    }

    pub fn get(&self, id: &AnnotationId) -> Option<&Annotation> {
        self.annotations().iter().find(|annotation| &annotation.id == id)
    }

    pub fn contains(&self, id: &AnnotationId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.annotations().len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations().is_empty()
    }

    /// Copies of the live collection with `selected` derived from the selection set
    pub fn annotations_with_selection(&self) -> Vec<Annotation> {
        self.annotations()
            .iter()
            .map(|annotation| {
                let mut annotation = annotation.clone();
                annotation.selected = self.selection.contains(&annotation.id);
                annotation
            })
            .collect()
    }

    // ----- Mutations (historied) -----

    /// Append a new annotation as one snapshot
    pub fn add_annotation(&mut self, annotation: Annotation) -> Result<()> {
        self.add_annotations(vec![annotation]).map(|_| ())
    }

    /// Append several annotations as a single snapshot
    ///
    /// All-or-nothing: one invalid or duplicate entry rejects the whole batch.
    pub fn add_annotations(&mut self, annotations: Vec<Annotation>) -> Result<usize> {
        if annotations.is_empty() {
            return Ok(0);
        }

        let mut seen: HashSet<&AnnotationId> =
            self.annotations().iter().map(|annotation| &annotation.id).collect();
        for annotation in &annotations {
            annotation.validate()?;
            if !seen.insert(&annotation.id) {
                return Err(EngineError::DuplicateId(annotation.id.clone()));
            }
        }

        let count = annotations.len();
        let mut next = self.annotations().to_vec();
        next.extend(annotations.into_iter().map(|mut annotation| {
            annotation.selected = false;
            annotation
        }));
        self.commit(next, "add");
        Ok(count)
    }

    /// Merge `patch` into the annotation with `id`
    pub fn update_annotation(&mut self, id: &AnnotationId, patch: &AnnotationPatch) -> Result<()> {
        let index = self.index_of(id)?;
        let edited = self.annotations()[index].patched(patch);
        edited.validate()?;

        let mut next = self.annotations().to_vec();
        next[index] = edited;
        self.commit(next, "update");
        Ok(())
    }

    /// Remove one annotation and drop it from the selection
    pub fn remove_annotation(&mut self, id: &AnnotationId) -> Result<()> {
        let index = self.index_of(id)?;
        let mut next = self.annotations().to_vec();
        next.remove(index);
        self.selection.remove(id);
        self.commit(next, "remove");
        Ok(())
    }

    /// Remove every selected annotation as one snapshot; returns the count removed
    pub fn delete_selected(&mut self) -> usize {
        if self.selection.is_empty() {
            return 0;
        }
        let before = self.len();
        let next: Vec<Annotation> = self
            .annotations()
            .iter()
            .filter(|annotation| !self.selection.contains(&annotation.id))
            .cloned()
            .collect();
        let removed = before - next.len();
        self.selection.clear();
        if removed > 0 {
            self.commit(next, "delete selected");
        }
        removed
    }

    /// Translate every point of one annotation
    pub fn move_annotation(&mut self, id: &AnnotationId, dx: f64, dy: f64) -> Result<()> {
        self.index_of(id)?;
        self.move_annotations(std::slice::from_ref(id), dx, dy).map(|_| ())
    }

    /// Translate several annotations as one snapshot; unknown ids are skipped
    ///
    /// A zero offset commits nothing.
    pub fn move_annotations(&mut self, ids: &[AnnotationId], dx: f64, dy: f64) -> Result<usize> {
        if !dx.is_finite() || !dy.is_finite() {
            return Err(crate::annotation::InvalidAnnotation::NonFinitePoint(0).into());
        }
        if dx == 0.0 && dy == 0.0 {
            return Ok(0);
        }
        let targets: HashSet<&AnnotationId> = ids.iter().collect();
        let mut moved = 0;
        let next: Vec<Annotation> = self
            .annotations()
            .iter()
            .map(|annotation| {
                if targets.contains(&annotation.id) {
                    moved += 1;
                    annotation.translated(dx, dy)
                } else {
                    annotation.clone()
                }
            })
            .collect();
        if moved > 0 {
            self.commit(next, "move");
        }
        Ok(moved)
    }

    /// Apply a style patch to several annotations as one snapshot
    pub fn restyle(&mut self, ids: &[AnnotationId], patch: &StylePatch) -> Result<usize> {
        let targets: HashSet<&AnnotationId> = ids.iter().collect();
        let edit = AnnotationPatch::style(patch.clone());
        let mut next = Vec::with_capacity(self.len());
        let mut changed = 0;
        for annotation in self.annotations().iter() {
            if targets.contains(&annotation.id) {
                let edited = annotation.patched(&edit);
                edited.validate()?;
                next.push(edited);
                changed += 1;
            } else {
                next.push(annotation.clone());
            }
        }
        if changed > 0 {
            self.commit(next, "restyle");
        }
        Ok(changed)
    }

    /// Move `ids` to the end of the paint order, keeping relative order
    ///
    /// Returns false (and commits nothing) when the order would not change.
    pub fn bring_to_front(&mut self, ids: &[AnnotationId]) -> bool {
        self.reorder(ids, true)
    }

    /// Move `ids` to the start of the paint order, keeping relative order
    pub fn send_to_back(&mut self, ids: &[AnnotationId]) -> bool {
        self.reorder(ids, false)
    }

    fn reorder(&mut self, ids: &[AnnotationId], to_front: bool) -> bool {
        let targets: HashSet<&AnnotationId> = ids.iter().collect();
        let (moved, untouched): (Vec<Annotation>, Vec<Annotation>) = self
            .annotations()
            .iter()
            .cloned()
            .partition(|annotation| targets.contains(&annotation.id));
        if moved.is_empty() {
            return false;
        }

        let next: Vec<Annotation> = if to_front {
            untouched.into_iter().chain(moved).collect()
        } else {
            moved.into_iter().chain(untouched).collect()
        };

        let unchanged = next
            .iter()
            .zip(self.annotations().iter())
            .all(|(a, b)| a.id == b.id);
        if unchanged {
            debug!(to_front, "z-order already satisfied");
            return false;
        }
        self.commit(next, if to_front { "bring to front" } else { "send to back" });
        true
    }

    /// Replace the whole collection and reset history to a single baseline
    pub fn import_annotations(&mut self, annotations: Vec<Annotation>) -> Result<()> {
        let mut seen = HashSet::new();
        for (index, annotation) in annotations.iter().enumerate() {
            annotation
                .validate()
                .map_err(|source| ValidationError::InvalidEntry { index, source })?;
            if !seen.insert(annotation.id.clone()) {
                return Err(ValidationError::DuplicateId {
                    index,
                    id: annotation.id.clone(),
                }
                .into());
            }
        }

        let count = annotations.len();
        let baseline = annotations
            .into_iter()
            .map(|mut annotation| {
                annotation.selected = false;
                annotation
            })
            .collect();
        self.history.reset(baseline);
        self.selection.clear();
        info!(document = %self.active, count, "imported annotations, history reset");
        Ok(())
    }

    fn index_of(&self, id: &AnnotationId) -> Result<usize> {
        self.annotations()
            .iter()
            .position(|annotation| &annotation.id == id)
            .ok_or_else(|| EngineError::NotFound(id.clone()))
    }

    fn commit(&mut self, next: Vec<Annotation>, action: &'static str) {
        self.history.commit(next);
        debug!(
            document = %self.active,
            action,
            index = self.history.index(),
            count = self.len(),
            "committed snapshot"
        );
    }

    // ----- History -----

    /// Step back one snapshot; false at the start of history
    pub fn undo(&mut self) -> bool {
        let moved = self.history.undo().is_some();
        if moved {
            self.prune_selection();
        }
        moved
    }

    /// Step forward one snapshot; false at the newest entry
    pub fn redo(&mut self) -> bool {
        let moved = self.history.redo().is_some();
        if moved {
            self.prune_selection();
        }
        moved
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn history_index(&self) -> usize {
        self.history.index()
    }

    fn prune_selection(&mut self) {
        let live: HashSet<&AnnotationId> = self
            .history
            .current()
            .iter()
            .filter(|annotation| annotation.page_number == self.active_page)
            .map(|annotation| &annotation.id)
            .collect();
        self.selection.retain(|id| live.contains(id));
    }

    // ----- Session state (not historied) -----

    pub fn current_tool(&self) -> AnnotationType {
        self.current_tool
    }

    /// Switching to a drawing tool clears the selection
    pub fn set_current_tool(&mut self, tool: AnnotationType) {
        if tool != AnnotationType::Select {
            self.selection.clear();
        }
        self.current_tool = tool;
    }

    pub fn current_style(&self) -> &AnnotationStyle {
        &self.current_style
    }

    /// Merge `patch` into the style used for future annotations
    pub fn set_current_style(&mut self, patch: &StylePatch) -> Result<()> {
        let style = self.current_style.merged(patch);
        if let Err(error) = style.validate() {
            warn!(%error, "rejected style change");
            return Err(error.into());
        }
        self.current_style = style;
        Ok(())
    }

    pub fn active_page(&self) -> u32 {
        self.active_page
    }

    /// Change the visible page; the selection is page-scoped and is cleared
    pub fn set_active_page(&mut self, page: u32) {
        let page = page.max(1);
        if page != self.active_page {
            self.selection.clear();
            self.active_page = page;
        }
    }

    pub fn active_document(&self) -> &DocumentId {
        &self.active
    }

    /// Ids of every open document, active one included
    pub fn document_ids(&self) -> Vec<DocumentId> {
        let mut ids: Vec<DocumentId> = self.parked.keys().cloned().collect();
        ids.push(self.active.clone());
        ids.sort();
        ids
    }

    /// Make `id` the active document, creating an empty history on first use
    pub fn open_document(&mut self, id: DocumentId) {
        if id == self.active {
            return;
        }
        let incoming = self
            .parked
            .remove(&id)
            .unwrap_or_else(|| History::new(Vec::new(), self.history_limit));
        let outgoing = std::mem::replace(&mut self.history, incoming);
        let previous = std::mem::replace(&mut self.active, id);
        self.parked.insert(previous, outgoing);
        self.selection.clear();
        self.active_page = 1;
        info!(document = %self.active, "switched document");
    }

    /// Drop a document's history
    ///
    /// Closing the active document leaves it active with an empty baseline.
    pub fn close_document(&mut self, id: &DocumentId) -> bool {
        if id == &self.active {
            self.history = History::new(Vec::new(), self.history_limit);
            self.selection.clear();
            info!(document = %id, "closed active document");
            return true;
        }
        self.parked.remove(id).is_some()
    }

    // ----- Selection -----

    pub fn selection(&self) -> &BTreeSet<AnnotationId> {
        &self.selection
    }

    /// Selected ids in paint order
    pub fn selected_ids(&self) -> Vec<AnnotationId> {
        self.annotations()
            .iter()
            .filter(|annotation| self.selection.contains(&annotation.id))
            .map(|annotation| annotation.id.clone())
            .collect()
    }

    pub fn is_selected(&self, id: &AnnotationId) -> bool {
        self.selection.contains(id)
    }

    /// Select exactly `id`, or clear with `None`
    pub fn set_selected_annotation(&mut self, id: Option<&AnnotationId>) {
        self.selection.clear();
        if let Some(id) = id {
            self.select_annotations(std::slice::from_ref(id));
        }
    }

    /// Add `ids` to the selection; ids not on the active page are ignored
    pub fn select_annotations(&mut self, ids: &[AnnotationId]) {
        let page = self.active_page;
        let valid: Vec<AnnotationId> = ids
            .iter()
            .filter(|id| {
                self.get(id)
                    .map(|annotation| annotation.page_number == page)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        self.selection.extend(valid);
    }

    /// Flip membership of `id`
    pub fn toggle_selection(&mut self, id: &AnnotationId) {
        if !self.selection.remove(id) {
            self.select_annotations(std::slice::from_ref(id));
        }
    }

    /// Select every annotation on the active page
    pub fn select_all(&mut self) -> usize {
        let ids: Vec<AnnotationId> = self
            .page_annotations(self.active_page)
            .map(|annotation| annotation.id.clone())
            .collect();
        self.selection = ids.into_iter().collect();
        self.selection.len()
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Point;

    fn rect(page: u32, a: (f64, f64), b: (f64, f64)) -> Annotation {
        Annotation::new(
            AnnotationType::Rectangle,
            vec![Point::new(a.0, a.1), Point::new(b.0, b.1)],
            AnnotationStyle::new(),
            page,
            0,
            "tester",
        )
    }

    fn order(store: &AnnotationStore) -> Vec<AnnotationId> {
        store.annotations().iter().map(|a| a.id.clone()).collect()
    }

    #[test]
    fn test_add_records_snapshot() {
        let mut store = AnnotationStore::new();
        store.add_annotation(rect(1, (0.0, 0.0), (10.0, 10.0))).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.history_len(), 2);
        assert!(store.can_undo());
    }

    #[test]
    fn test_add_duplicate_id_is_rejected() {
        let mut store = AnnotationStore::new();
        let a = rect(1, (0.0, 0.0), (10.0, 10.0));
        store.add_annotation(a.clone()).unwrap();
        let error = store.add_annotation(a).unwrap_err();
        assert!(matches!(error, EngineError::DuplicateId(_)));
        assert_eq!(store.history_len(), 2);
    }

    #[test]
    fn test_add_rejects_select_type() {
        let mut store = AnnotationStore::new();
        let mut a = rect(1, (0.0, 0.0), (10.0, 10.0));
        a.kind = AnnotationType::Select;
        assert!(matches!(store.add_annotation(a), Err(EngineError::Invalid(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_move_then_undo_restores_points() {
        let mut store = AnnotationStore::new();
        let a = rect(1, (0.0, 0.0), (100.0, 50.0));
        let id = a.id.clone();
        store.add_annotation(a).unwrap();

        store.move_annotation(&id, 10.0, 10.0).unwrap();
        assert_eq!(
            store.get(&id).unwrap().points,
            vec![Point::new(10.0, 10.0), Point::new(110.0, 60.0)]
        );
        assert_eq!(store.get(&id).unwrap().version, Some(2));

        assert!(store.undo());
        assert_eq!(
            store.get(&id).unwrap().points,
            vec![Point::new(0.0, 0.0), Point::new(100.0, 50.0)]
        );
    }

    #[test]
    fn test_zero_move_commits_nothing() {
        let mut store = AnnotationStore::new();
        let a = rect(1, (0.0, 0.0), (100.0, 50.0));
        let id = a.id.clone();
        store.add_annotation(a).unwrap();
        store.move_annotation(&id, 0.0, 0.0).unwrap();
        assert_eq!(store.history_len(), 2);
    }

    #[test]
    fn test_missing_id_is_not_found() {
        let mut store = AnnotationStore::new();
        let missing = AnnotationId::from("missing");
        assert!(matches!(
            store.move_annotation(&missing, 1.0, 1.0),
            Err(EngineError::NotFound(_))
        ));
        assert!(matches!(
            store.update_annotation(&missing, &AnnotationPatch::text("x")),
            Err(EngineError::NotFound(_))
        ));
        assert!(store.remove_annotation(&missing).unwrap_err().is_benign());
        assert_eq!(store.history_len(), 1);
    }

    #[test]
    fn test_update_rejects_invalid_result() {
        let mut store = AnnotationStore::new();
        let a = rect(1, (0.0, 0.0), (100.0, 50.0));
        let id = a.id.clone();
        store.add_annotation(a).unwrap();

        let patch = AnnotationPatch::points(vec![Point::new(1.0, 1.0)]);
        assert!(store.update_annotation(&id, &patch).is_err());
        assert_eq!(store.get(&id).unwrap().points.len(), 2);
        assert_eq!(store.history_len(), 2);
    }

    #[test]
    fn test_delete_selected_clears_selection() {
        let mut store = AnnotationStore::new();
        let a = rect(1, (0.0, 0.0), (10.0, 10.0));
        let b = rect(1, (20.0, 20.0), (30.0, 30.0));
        let a_id = a.id.clone();
        store.add_annotations(vec![a, b]).unwrap();

        store.select_annotations(&[a_id.clone()]);
        assert_eq!(store.delete_selected(), 1);
        assert!(store.selection().is_empty());
        assert!(!store.contains(&a_id));
        assert_eq!(store.delete_selected(), 0);
        assert_eq!(store.history_len(), 3);
    }

    #[test]
    fn test_bring_to_front_preserves_relative_order() {
        let mut store = AnnotationStore::new();
        let items: Vec<Annotation> = (0..4)
            .map(|i| rect(1, (i as f64, 0.0), (i as f64 + 10.0, 10.0)))
            .collect();
        let ids: Vec<AnnotationId> = items.iter().map(|a| a.id.clone()).collect();
        store.add_annotations(items).unwrap();

        assert!(store.bring_to_front(&[ids[2].clone(), ids[0].clone()]));
        assert_eq!(
            order(&store),
            vec![ids[1].clone(), ids[3].clone(), ids[0].clone(), ids[2].clone()]
        );

        assert!(store.send_to_back(&[ids[2].clone()]));
        assert_eq!(order(&store)[0], ids[2]);
    }

    #[test]
    fn test_z_order_noop_commits_nothing() {
        let mut store = AnnotationStore::new();
        let a = rect(1, (0.0, 0.0), (10.0, 10.0));
        let b = rect(1, (0.0, 0.0), (10.0, 10.0));
        let b_id = b.id.clone();
        store.add_annotations(vec![a, b]).unwrap();

        assert!(!store.bring_to_front(&[b_id]));
        assert!(!store.send_to_back(&[AnnotationId::from("missing")]));
        assert_eq!(store.history_len(), 2);
    }

    #[test]
    fn test_import_resets_history() {
        let mut store = AnnotationStore::new();
        store.add_annotation(rect(1, (0.0, 0.0), (10.0, 10.0))).unwrap();
        store
            .import_annotations(vec![rect(1, (0.0, 0.0), (5.0, 5.0)), rect(2, (1.0, 1.0), (5.0, 5.0))])
            .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.history_len(), 1);
        assert!(!store.can_undo());
    }

    #[test]
    fn test_import_rejects_duplicates_wholesale() {
        let mut store = AnnotationStore::new();
        let keep = rect(1, (0.0, 0.0), (10.0, 10.0));
        store.add_annotation(keep.clone()).unwrap();

        let dup = rect(1, (0.0, 0.0), (5.0, 5.0));
        let error = store.import_annotations(vec![dup.clone(), dup]).unwrap_err();
        assert!(matches!(
            error,
            EngineError::Validation(ValidationError::DuplicateId { index: 1, .. })
        ));
        assert_eq!(order(&store), vec![keep.id]);
        assert_eq!(store.history_len(), 2);
    }

    #[test]
    fn test_documents_have_isolated_histories() {
        let mut store = AnnotationStore::new();
        store.add_annotation(rect(1, (0.0, 0.0), (10.0, 10.0))).unwrap();

        store.open_document(DocumentId::from("b"));
        assert!(store.is_empty());
        store.add_annotation(rect(1, (0.0, 0.0), (10.0, 10.0))).unwrap();
        store.add_annotation(rect(1, (0.0, 0.0), (20.0, 20.0))).unwrap();
        assert!(store.undo());
        assert_eq!(store.len(), 1);

        store.open_document(DocumentId::default());
        assert_eq!(store.len(), 1);
        assert_eq!(store.history_index(), 1);
        assert_eq!(store.document_ids().len(), 2);

        assert!(store.close_document(&DocumentId::from("b")));
        store.open_document(DocumentId::from("b"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_selection_is_page_scoped() {
        let mut store = AnnotationStore::new();
        let a = rect(1, (0.0, 0.0), (10.0, 10.0));
        let b = rect(2, (0.0, 0.0), (10.0, 10.0));
        let (a_id, b_id) = (a.id.clone(), b.id.clone());
        store.add_annotations(vec![a, b]).unwrap();

        store.select_annotations(&[a_id.clone(), b_id.clone()]);
        assert_eq!(store.selected_ids(), vec![a_id.clone()]);
        assert_eq!(store.select_all(), 1);

        store.set_active_page(2);
        assert!(store.selection().is_empty());
        store.toggle_selection(&b_id);
        assert!(store.is_selected(&b_id));
        store.toggle_selection(&b_id);
        assert!(!store.is_selected(&b_id));
    }

    #[test]
    fn test_undo_prunes_selection() {
        let mut store = AnnotationStore::new();
        let a = rect(1, (0.0, 0.0), (10.0, 10.0));
        let id = a.id.clone();
        store.add_annotation(a).unwrap();
        store.set_selected_annotation(Some(&id));

        store.undo();
        assert!(store.selection().is_empty());
        store.redo();
        assert!(store.selection().is_empty());
    }

    #[test]
    fn test_tool_change_clears_selection() {
        let mut store = AnnotationStore::new();
        let a = rect(1, (0.0, 0.0), (10.0, 10.0));
        let id = a.id.clone();
        store.add_annotation(a).unwrap();

        store.set_current_tool(AnnotationType::Select);
        store.set_selected_annotation(Some(&id));
        store.set_current_tool(AnnotationType::Select);
        assert!(store.is_selected(&id));
        store.set_current_tool(AnnotationType::Line);
        assert!(store.selection().is_empty());
    }

    #[test]
    fn test_style_changes_are_not_historied() {
        let mut store = AnnotationStore::new();
        store.set_current_style(&StylePatch::color("#00FF00")).unwrap();
        assert_eq!(store.current_style().color, "#00FF00");
        assert!(store.set_current_style(&StylePatch::opacity(2.0)).is_err());
        assert_eq!(store.current_style().opacity, 1.0);
        assert_eq!(store.history_len(), 1);
    }

    #[test]
    fn test_restyle_is_one_snapshot() {
        let mut store = AnnotationStore::new();
        let a = rect(1, (0.0, 0.0), (10.0, 10.0));
        let b = rect(1, (0.0, 0.0), (10.0, 10.0));
        let ids = vec![a.id.clone(), b.id.clone()];
        store.add_annotations(vec![a, b]).unwrap();

        assert_eq!(store.restyle(&ids, &StylePatch::line_width(5)).unwrap(), 2);
        assert_eq!(store.history_len(), 3);
        assert!(store.annotations().iter().all(|a| a.style.line_width == 5));
    }

    #[test]
    fn test_annotations_with_selection_marks_selected() {
        let mut store = AnnotationStore::new();
        let a = rect(1, (0.0, 0.0), (10.0, 10.0));
        let id = a.id.clone();
        store.add_annotation(a).unwrap();
        store.set_selected_annotation(Some(&id));

        let marked = store.annotations_with_selection();
        assert!(marked[0].selected);
        assert!(!store.annotations()[0].selected);
    }
}
