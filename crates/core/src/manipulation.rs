//! Annotation manipulation handles and resize operations
//!
//! Handles are small control points drawn on a selected annotation. Dragging one
//! produces a live preview of the resized points; the selection controller
//! commits the final points as a single update on release.

use crate::annotation::{Annotation, AnnotationId, AnnotationPatch, AnnotationType, Point};
use crate::geometry::{self, Bounds};

/// Type of manipulation handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleType {
    /// Corner handles resize in both dimensions
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,

    /// Edge handles resize in one dimension
    Top,
    Bottom,
    Left,
    Right,

    /// Line family endpoints
    Start,
    End,
}

/// Manipulation handle with position and type
#[derive(Debug, Clone)]
pub struct ManipulationHandle {
    pub handle_type: HandleType,

    /// Position in document coordinates
    pub position: Point,

    /// Half the handle's side length in document units
    pub size: f64,

    pub annotation_id: AnnotationId,
}

impl ManipulationHandle {
    pub fn new(
        handle_type: HandleType,
        position: Point,
        size: f64,
        annotation_id: AnnotationId,
    ) -> Self {
        Self {
            handle_type,
            position,
            size,
            annotation_id,
        }
    }

    /// Check if a point hits this handle
    pub fn hit_test(&self, point: &Point, tolerance: f64) -> bool {
        let hit_radius = self.size + tolerance;
        point.distance_to(&self.position) <= hit_radius
    }
}

/// Generate manipulation handles for an annotation
///
/// Line family: both endpoints. Box shapes and strokes: four corners and four
/// edge midpoints of the drawn bounding box. Text, sticky notes and stamps have
/// fixed-size boxes and get no handles.
pub fn generate_handles(annotation: &Annotation, handle_size: f64) -> Vec<ManipulationHandle> {
    let id = &annotation.id;
    let handle = |handle_type, position| {
        ManipulationHandle::new(handle_type, position, handle_size, id.clone())
    };

    match annotation.kind {
        kind if kind.is_line_family() => match annotation.points.as_slice() {
            [start, end] => vec![handle(HandleType::Start, *start), handle(HandleType::End, *end)],
            _ => Vec::new(),
        },
        AnnotationType::Text
        | AnnotationType::StickyNote
        | AnnotationType::Stamp
        | AnnotationType::Select => Vec::new(),
        _ => match geometry::bounding_box(annotation) {
            Some(b) => {
                let center = b.center();
                vec![
                    handle(HandleType::TopLeft, Point::new(b.min_x, b.min_y)),
                    handle(HandleType::TopRight, Point::new(b.max_x, b.min_y)),
                    handle(HandleType::BottomLeft, Point::new(b.min_x, b.max_y)),
                    handle(HandleType::BottomRight, Point::new(b.max_x, b.max_y)),
                    handle(HandleType::Top, Point::new(center.x, b.min_y)),
                    handle(HandleType::Bottom, Point::new(center.x, b.max_y)),
                    handle(HandleType::Left, Point::new(b.min_x, center.y)),
                    handle(HandleType::Right, Point::new(b.max_x, center.y)),
                ]
            }
            None => Vec::new(),
        },
    }
}

/// Handle under `point` for the given annotation, if any
pub fn handle_at(
    annotation: &Annotation,
    point: &Point,
    handle_size: f64,
) -> Option<HandleType> {
    generate_handles(annotation, handle_size)
        .into_iter()
        .find(|handle| handle.hit_test(point, 0.0))
        .map(|handle| handle.handle_type)
}

/// Active resize drag
#[derive(Debug, Clone)]
pub struct ManipulationState {
    pub annotation_id: AnnotationId,

    pub handle_type: HandleType,

    /// Annotation as it was when the drag started
    pub original: Annotation,

    /// Drawn bounds of `original`
    pub original_bounds: Option<Bounds>,

    /// Drag start position in document coordinates
    pub drag_start: Point,

    /// Latest pointer position in document coordinates
    pub current_position: Point,
}

impl ManipulationState {
    pub fn new(original: Annotation, handle_type: HandleType, drag_start: Point) -> Self {
        Self {
            annotation_id: original.id.clone(),
            handle_type,
            original_bounds: geometry::bounding_box(&original),
            original,
            drag_start,
            current_position: drag_start,
        }
    }

    /// Update the current drag position
    pub fn update_position(&mut self, position: Point) {
        self.current_position = position;
    }

    /// Whether the pointer has moved since the drag started
    pub fn has_moved(&self) -> bool {
        self.current_position != self.drag_start
    }

    /// Points of the annotation as resized by the current drag
    pub fn resized_points(&self) -> Vec<Point> {
        let dx = self.current_position.x - self.drag_start.x;
        let dy = self.current_position.y - self.drag_start.y;
        let points = &self.original.points;

        match self.handle_type {
            HandleType::Start => points
                .iter()
                .enumerate()
                .map(|(i, p)| if i == 0 { p.translated(dx, dy) } else { *p })
                .collect(),
            HandleType::End => {
                let last = points.len().saturating_sub(1);
                points
                    .iter()
                    .enumerate()
                    .map(|(i, p)| if i == last { p.translated(dx, dy) } else { *p })
                    .collect()
            }
            handle => match self.original_bounds {
                Some(old) => {
                    let new = resized_bounds(&old, handle, dx, dy);
                    points.iter().map(|p| map_between(p, &old, &new)).collect()
                }
                None => points.clone(),
            },
        }
    }

    /// Preview annotation for live rendering; not a committed revision
    pub fn preview(&self) -> Annotation {
        let mut preview = self.original.clone();
        preview.points = self.resized_points();
        preview
    }

    /// Patch to commit on release
    pub fn to_patch(&self) -> AnnotationPatch {
        AnnotationPatch::points(self.resized_points())
    }
}

/// Box after dragging `handle` by `(dx, dy)`; may be inverted when dragged past
/// the opposite edge
fn resized_bounds(old: &Bounds, handle: HandleType, dx: f64, dy: f64) -> Bounds {
    let mut new = *old;
    match handle {
        HandleType::TopLeft => {
            new.min_x += dx;
            new.min_y += dy;
        }
        HandleType::TopRight => {
            new.max_x += dx;
            new.min_y += dy;
        }
        HandleType::BottomLeft => {
            new.min_x += dx;
            new.max_y += dy;
        }
        HandleType::BottomRight => {
            new.max_x += dx;
            new.max_y += dy;
        }
        HandleType::Top => new.min_y += dy,
        HandleType::Bottom => new.max_y += dy,
        HandleType::Left => new.min_x += dx,
        HandleType::Right => new.max_x += dx,
        HandleType::Start | HandleType::End => {}
    }
    new
}

/// Affine map of `point` from `old` onto `new`; a zero-extent axis is only shifted
fn map_between(point: &Point, old: &Bounds, new: &Bounds) -> Point {
    let map_axis = |value: f64, old_min: f64, old_max: f64, new_min: f64, new_max: f64| {
        let extent = old_max - old_min;
        if extent.abs() < 1e-9 {
            value + (new_min - old_min)
        } else {
            new_min + (value - old_min) * (new_max - new_min) / extent
        }
    };
    Point::new(
        map_axis(point.x, old.min_x, old.max_x, new.min_x, new.max_x),
        map_axis(point.y, old.min_y, old.max_y, new.min_y, new.max_y),
    )
}
