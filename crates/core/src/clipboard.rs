//! Copy, cut and paste of annotations
//!
//! The buffer owns deep copies, so a paste still works after the originals
//! were edited, deleted or undone away.

use tracing::debug;

use crate::annotation::{Annotation, AnnotationId};
use crate::error::Result;
use crate::store::AnnotationStore;

/// Clipboard buffer plus the per-paste offset
#[derive(Debug, Clone)]
pub struct Clipboard {
    entries: Vec<Annotation>,
    /// Offset applied to both axes on every paste, document units
    offset: f64,
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::new(20.0)
    }
}

impl Clipboard {
    /// A zero offset would stack pastes on the originals, so it falls back to 1
    pub fn new(offset: f64) -> Self {
        let offset = if offset.is_finite() && offset != 0.0 { offset } else { 1.0 };
        Self {
            entries: Vec::new(),
            offset,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[Annotation] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Copy the selection in paint order. An empty selection returns 0 and keeps
    /// the previous buffer.
    pub fn copy(&mut self, store: &AnnotationStore) -> usize {
        let copied: Vec<Annotation> = store
            .annotations()
            .iter()
            .filter(|annotation| store.is_selected(&annotation.id))
            .map(|annotation| {
                let mut copy = annotation.clone();
                copy.selected = false;
                copy
            })
            .collect();
        if copied.is_empty() {
            return 0;
        }
        self.entries = copied;
        debug!(count = self.entries.len(), "copied to clipboard");
        self.entries.len()
    }

    /// Copy then delete the selection
    pub fn cut(&mut self, store: &mut AnnotationStore) -> usize {
        let count = self.copy(store);
        if count > 0 {
            store.delete_selected();
        }
        count
    }

    /// Add offset clones of the buffer to `page` as a single snapshot.
    ///
    /// Clones get fresh ids, `version = 1` and the given timestamp and user. They
    /// become the selection when `page` is the active page. The buffer itself is
    /// advanced by the offset so repeated pastes cascade.
    pub fn paste(
        &mut self,
        store: &mut AnnotationStore,
        page: u32,
        timestamp: u64,
        user_id: &str,
    ) -> Result<usize> {
        if self.entries.is_empty() {
            return Ok(0);
        }

        let offset = self.offset;
        let clones: Vec<Annotation> = self
            .entries
            .iter()
            .map(|entry| {
                let mut clone = Annotation::new(
                    entry.kind,
                    entry.points.iter().map(|p| p.translated(offset, offset)).collect(),
                    entry.style.clone(),
                    page.max(1),
                    timestamp,
                    user_id,
                );
                clone.text = entry.text.clone();
                clone
            })
            .collect();
        let ids: Vec<AnnotationId> = clones.iter().map(|clone| clone.id.clone()).collect();

        let count = store.add_annotations(clones)?;
        store.clear_selection();
        store.select_annotations(&ids);

        for entry in &mut self.entries {
            for point in &mut entry.points {
                *point = point.translated(offset, offset);
            }
        }
        debug!(count, page, "pasted from clipboard");
        Ok(count)
    }
}
