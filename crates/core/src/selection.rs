//! Selection and transform controller
//!
//! Routes pointer input while the select tool is active: click and shift-click
//! selection, marquee selection, drag-to-move and handle resizing. Drags only
//! keep a visual offset until release, which commits a single store mutation.

use tracing::debug;

use crate::annotation::{Annotation, AnnotationId, Point};
use crate::error::{EngineError, Result};
use crate::geometry::{self, Bounds};
use crate::hit_test::{annotations_in_rect, hit_test};
use crate::manipulation::{handle_at, ManipulationState};
use crate::store::AnnotationStore;

/// Gesture in progress under the select tool
#[derive(Debug, Clone, Default)]
pub enum SelectionGesture {
    #[default]
    Idle,
    /// Moving the selected annotations
    Dragging {
        ids: Vec<AnnotationId>,
        anchor: Point,
        current: Point,
    },
    /// Rubber-band rectangle
    Marquee {
        anchor: Point,
        current: Point,
        additive: bool,
    },
    Resizing(ManipulationState),
}

/// What a select-tool pointer event did
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    Ignored,
    /// Selection set changed without a store mutation
    SelectionChanged,
    DragStarted,
    ResizeStarted,
    MarqueeStarted,
    /// Preview changed; nothing committed
    Updated,
    /// Release committed a move of this many annotations
    Moved(usize),
    Resized(AnnotationId),
    /// Release without any effect
    Released,
}

/// Pointer handling for the select tool
#[derive(Debug, Clone)]
pub struct SelectionController {
    gesture: SelectionGesture,
    /// Minimum tap target in screen pixels
    min_tap_px: f64,
    /// Resize handle half-size in screen pixels
    handle_size_px: f64,
    /// Smallest endpoint distance a resized shape may keep
    min_shape_distance: f64,
}

impl SelectionController {
    pub fn new(min_tap_px: f64, handle_size_px: f64, min_shape_distance: f64) -> Self {
        Self {
            gesture: SelectionGesture::Idle,
            min_tap_px,
            handle_size_px,
            min_shape_distance,
        }
    }

    pub fn gesture(&self) -> &SelectionGesture {
        &self.gesture
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.gesture, SelectionGesture::Idle)
    }

    /// Handle size in document units at the given view scale
    pub fn handle_size(&self, scale: f64) -> f64 {
        self.handle_size_px / scale.max(f64::EPSILON)
    }

    /// Press at `point` (document space)
    pub fn pointer_down(
        &mut self,
        store: &mut AnnotationStore,
        point: Point,
        shift: bool,
        scale: f64,
    ) -> SelectionOutcome {
        if !self.is_idle() {
            return SelectionOutcome::Ignored;
        }

        // Resize handles only exist on a single selected annotation
        if !shift {
            if let [id] = store.selected_ids().as_slice() {
                if let Some(annotation) = store.get(id) {
                    if let Some(handle) = handle_at(annotation, &point, self.handle_size(scale)) {
                        self.gesture = SelectionGesture::Resizing(ManipulationState::new(
                            annotation.clone(),
                            handle,
                            point,
                        ));
                        return SelectionOutcome::ResizeStarted;
                    }
                }
            }
        }

        let page = store.active_page();
        let hit = hit_test(&point, store.page_annotations(page), scale, self.min_tap_px)
            .map(|annotation| annotation.id.clone());

        match hit {
            Some(id) if shift => {
                store.toggle_selection(&id);
                SelectionOutcome::SelectionChanged
            }
            Some(id) => {
                if !store.is_selected(&id) {
                    store.set_selected_annotation(Some(&id));
                }
                self.gesture = SelectionGesture::Dragging {
                    ids: store.selected_ids(),
                    anchor: point,
                    current: point,
                };
                SelectionOutcome::DragStarted
            }
            None => {
                if !shift {
                    store.clear_selection();
                }
                self.gesture = SelectionGesture::Marquee {
                    anchor: point,
                    current: point,
                    additive: shift,
                };
                SelectionOutcome::MarqueeStarted
            }
        }
    }

    /// Pointer moved; only the preview changes
    pub fn pointer_move(&mut self, point: Point) -> SelectionOutcome {
        match &mut self.gesture {
            SelectionGesture::Idle => SelectionOutcome::Ignored,
            SelectionGesture::Dragging { current, .. }
            | SelectionGesture::Marquee { current, .. } => {
                *current = point;
                SelectionOutcome::Updated
            }
            SelectionGesture::Resizing(state) => {
                state.update_position(point);
                SelectionOutcome::Updated
            }
        }
    }

    /// Release at `point`, committing at most one snapshot
    pub fn pointer_up(
        &mut self,
        store: &mut AnnotationStore,
        point: Point,
        scale: f64,
    ) -> Result<SelectionOutcome> {
        if self.is_idle() {
            return Ok(SelectionOutcome::Ignored);
        }
        self.pointer_move(point);
        self.release(store, scale)
    }

    /// Pointer left the surface; behaves like release at the last position
    pub fn pointer_leave(
        &mut self,
        store: &mut AnnotationStore,
        scale: f64,
    ) -> Result<SelectionOutcome> {
        self.release(store, scale)
    }

    /// Drop the gesture without committing
    pub fn cancel(&mut self) -> bool {
        let was_active = !self.is_idle();
        self.gesture = SelectionGesture::Idle;
        was_active
    }

    fn release(&mut self, store: &mut AnnotationStore, scale: f64) -> Result<SelectionOutcome> {
        match std::mem::take(&mut self.gesture) {
            SelectionGesture::Idle => Ok(SelectionOutcome::Ignored),
            SelectionGesture::Dragging { ids, anchor, current } => {
                let (dx, dy) = (current.x - anchor.x, current.y - anchor.y);
                let moved = store.move_annotations(&ids, dx, dy)?;
                if moved == 0 {
                    return Ok(SelectionOutcome::Released);
                }
                debug!(moved, dx, dy, "drag committed");
                Ok(SelectionOutcome::Moved(moved))
            }
            SelectionGesture::Marquee { anchor, current, additive } => {
                let rect = Bounds::from_corners(anchor, current);
                let tap = self.min_tap_px / scale.max(f64::EPSILON);
                if rect.width() < tap && rect.height() < tap {
                    return Ok(SelectionOutcome::Released);
                }
                let page = store.active_page();
                let ids = annotations_in_rect(&rect, store.page_annotations(page));
                debug!(count = ids.len(), additive, "marquee selection");
                if !additive {
                    store.clear_selection();
                }
                store.select_annotations(&ids);
                Ok(SelectionOutcome::SelectionChanged)
            }
            SelectionGesture::Resizing(state) => {
                if !state.has_moved() {
                    return Ok(SelectionOutcome::Released);
                }
                let kind = state.original.kind;
                if geometry::is_degenerate(kind, &state.resized_points(), self.min_shape_distance) {
                    debug!(id = %state.annotation_id, "resize collapsed the shape; discarded");
                    return Err(EngineError::DegenerateGeometry(kind));
                }
                store.update_annotation(&state.annotation_id, &state.to_patch())?;
                Ok(SelectionOutcome::Resized(state.annotation_id))
            }
        }
    }

    /// Current marquee rectangle, for the renderer
    pub fn marquee(&self) -> Option<Bounds> {
        match &self.gesture {
            SelectionGesture::Marquee { anchor, current, .. } => {
                Some(Bounds::from_corners(*anchor, *current))
            }
            _ => None,
        }
    }

    /// Visual-only copies of annotations being dragged or resized
    pub fn previews(&self, store: &AnnotationStore) -> Vec<Annotation> {
        match &self.gesture {
            SelectionGesture::Dragging { ids, anchor, current } => {
                let (dx, dy) = (current.x - anchor.x, current.y - anchor.y);
                ids.iter()
                    .filter_map(|id| store.get(id))
                    .map(|annotation| {
                        let mut preview = annotation.clone();
                        preview.points = annotation.points.iter().map(|p| p.translated(dx, dy)).collect();
                        preview
                    })
                    .collect()
            }
            SelectionGesture::Resizing(state) => vec![state.preview()],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationStyle, AnnotationType};

    fn filled_rect(a: (f64, f64), b: (f64, f64)) -> Annotation {
        let mut style = AnnotationStyle::new();
        style.filled = Some(true);
        Annotation::new(
            AnnotationType::Rectangle,
            vec![Point::new(a.0, a.1), Point::new(b.0, b.1)],
            style,
            1,
            0,
            "tester",
        )
    }

    fn setup() -> (AnnotationStore, SelectionController, AnnotationId, AnnotationId) {
        let mut store = AnnotationStore::new();
        store.set_current_tool(AnnotationType::Select);
        let a = filled_rect((0.0, 0.0), (100.0, 100.0));
        let b = filled_rect((200.0, 200.0), (300.0, 300.0));
        let ids = (a.id.clone(), b.id.clone());
        store.add_annotations(vec![a, b]).unwrap();
        (store, SelectionController::new(8.0, 6.0, 2.0), ids.0, ids.1)
    }

    #[test]
    fn test_click_selects_and_drag_moves_once() {
        let (mut store, mut controller, a, _) = setup();
        let before = store.history_len();

        assert_eq!(
            controller.pointer_down(&mut store, Point::new(50.0, 50.0), false, 1.0),
            SelectionOutcome::DragStarted
        );
        assert!(store.is_selected(&a));
        for i in 1..=10 {
            controller.pointer_move(Point::new(50.0 + i as f64, 50.0 + i as f64));
        }
        assert_eq!(controller.previews(&store)[0].points[0], Point::new(10.0, 10.0));
        assert_eq!(store.history_len(), before);

        let outcome = controller.pointer_up(&mut store, Point::new(60.0, 60.0), 1.0).unwrap();
        assert_eq!(outcome, SelectionOutcome::Moved(1));
        assert_eq!(store.history_len(), before + 1);
        assert_eq!(store.get(&a).unwrap().points[0], Point::new(10.0, 10.0));
    }

    #[test]
    fn test_click_without_drag_commits_nothing() {
        let (mut store, mut controller, _, _) = setup();
        controller.pointer_down(&mut store, Point::new(50.0, 50.0), false, 1.0);
        let outcome = controller.pointer_up(&mut store, Point::new(50.0, 50.0), 1.0).unwrap();
        assert_eq!(outcome, SelectionOutcome::Released);
        assert_eq!(store.history_len(), 2);
    }

    #[test]
    fn test_shift_click_toggles() {
        let (mut store, mut controller, a, b) = setup();
        controller.pointer_down(&mut store, Point::new(50.0, 50.0), false, 1.0);
        controller.pointer_up(&mut store, Point::new(50.0, 50.0), 1.0).unwrap();
        controller.pointer_down(&mut store, Point::new(250.0, 250.0), true, 1.0);
        assert!(store.is_selected(&a) && store.is_selected(&b));
        controller.pointer_down(&mut store, Point::new(250.0, 250.0), true, 1.0);
        assert!(!store.is_selected(&b));
    }

    #[test]
    fn test_marquee_selects_everything_it_touches() {
        let (mut store, mut controller, a, b) = setup();
        controller.pointer_down(&mut store, Point::new(-10.0, -10.0), false, 1.0);
        controller.pointer_move(Point::new(250.0, 250.0));
        assert!(controller.marquee().is_some());
        let outcome = controller.pointer_up(&mut store, Point::new(250.0, 250.0), 1.0).unwrap();
        assert_eq!(outcome, SelectionOutcome::SelectionChanged);
        assert!(store.is_selected(&a) && store.is_selected(&b));
    }

    #[test]
    fn test_tiny_marquee_is_a_click_on_empty_space() {
        let (mut store, mut controller, a, _) = setup();
        store.set_selected_annotation(Some(&a));
        controller.pointer_down(&mut store, Point::new(150.0, 150.0), false, 1.0);
        let outcome = controller.pointer_up(&mut store, Point::new(152.0, 151.0), 1.0).unwrap();
        assert_eq!(outcome, SelectionOutcome::Released);
        assert!(store.selection().is_empty());
    }

    #[test]
    fn test_resize_commits_one_update() {
        let (mut store, mut controller, a, _) = setup();
        store.set_selected_annotation(Some(&a));
        assert_eq!(
            controller.pointer_down(&mut store, Point::new(100.0, 100.0), false, 1.0),
            SelectionOutcome::ResizeStarted
        );
        controller.pointer_move(Point::new(150.0, 120.0));
        let outcome = controller.pointer_up(&mut store, Point::new(150.0, 150.0), 1.0).unwrap();
        assert_eq!(outcome, SelectionOutcome::Resized(a.clone()));
        assert_eq!(store.get(&a).unwrap().points[1], Point::new(150.0, 150.0));
        assert_eq!(store.history_len(), 3);
    }

    #[test]
    fn test_collapsing_resize_is_discarded() {
        let (mut store, mut controller, _, _) = setup();
        let line = Annotation::new(
            AnnotationType::Line,
            vec![Point::new(400.0, 0.0), Point::new(500.0, 0.0)],
            AnnotationStyle::new(),
            1,
            0,
            "tester",
        );
        let id = line.id.clone();
        store.add_annotation(line).unwrap();
        store.set_selected_annotation(Some(&id));
        let before = store.history_len();

        assert_eq!(
            controller.pointer_down(&mut store, Point::new(500.0, 0.0), false, 1.0),
            SelectionOutcome::ResizeStarted
        );
        controller.pointer_move(Point::new(450.0, 0.0));
        let error = controller.pointer_up(&mut store, Point::new(400.0, 0.0), 1.0).unwrap_err();

        assert!(matches!(error, EngineError::DegenerateGeometry(AnnotationType::Line)));
        assert!(controller.is_idle());
        assert_eq!(store.history_len(), before);
        assert_eq!(
            store.get(&id).unwrap().points,
            vec![Point::new(400.0, 0.0), Point::new(500.0, 0.0)]
        );
    }

    #[test]
    fn test_shift_marquee_extends_selection() {
        let (mut store, mut controller, a, b) = setup();
        controller.pointer_down(&mut store, Point::new(50.0, 50.0), false, 1.0);
        controller.pointer_up(&mut store, Point::new(50.0, 50.0), 1.0).unwrap();
        assert_eq!(store.selected_ids(), vec![a.clone()]);

        controller.pointer_down(&mut store, Point::new(150.0, 150.0), true, 1.0);
        let outcome = controller.pointer_up(&mut store, Point::new(350.0, 350.0), 1.0).unwrap();
        assert_eq!(outcome, SelectionOutcome::SelectionChanged);
        assert!(store.is_selected(&a) && store.is_selected(&b));
    }

    #[test]
    fn test_plain_marquee_replaces_selection() {
        let (mut store, mut controller, a, b) = setup();
        store.set_selected_annotation(Some(&a));
        controller.pointer_down(&mut store, Point::new(150.0, 150.0), false, 1.0);
        controller.pointer_up(&mut store, Point::new(350.0, 350.0), 1.0).unwrap();
        assert!(!store.is_selected(&a));
        assert!(store.is_selected(&b));
    }

    #[test]
    fn test_drag_of_vanished_annotation_is_dropped() {
        let (mut store, mut controller, a, _) = setup();
        controller.pointer_down(&mut store, Point::new(50.0, 50.0), false, 1.0);
        controller.pointer_move(Point::new(60.0, 60.0));
        store.remove_annotation(&a).unwrap();
        let outcome = controller.pointer_up(&mut store, Point::new(60.0, 60.0), 1.0).unwrap();
        assert_eq!(outcome, SelectionOutcome::Released);
        assert!(controller.is_idle());
    }
}
