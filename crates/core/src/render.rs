//! Render primitive for annotations
//!
//! The engine does not own a canvas. Collaborators implement [`RenderSurface`]
//! and the engine describes each annotation in surface pixels (document
//! coordinates multiplied by the view scale). Rendering is a pure function of
//! the annotation and the scale, so it is safe to call every frame.

use crate::annotation::{Annotation, AnnotationType, Color, Point};
use crate::geometry::{
    self, arrow_head, arrow_head_size, circle_from_points, stamp_label, Bounds, STAMP_FONT_SIZE,
    TEXT_FONT_SIZE,
};
use crate::manipulation::generate_handles;

/// Highlight strokes are drawn at this fraction of the style opacity
pub const HIGHLIGHT_OPACITY: f64 = 0.35;
/// Sticky note background
pub const STICKY_NOTE_FILL: Color = Color { r: 255, g: 245, b: 157, a: 255 };
/// Padding between a sticky note's edge and its text, document units
pub const STICKY_NOTE_PADDING: f64 = 8.0;

/// Stroke parameters in surface pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f64,
}

impl StrokeStyle {
    pub fn new(color: Color, width: f64) -> Self {
        Self { color, width }
    }
}

/// Drawing target implemented by rendering collaborators. All coordinates are
/// surface pixels.
pub trait RenderSurface {
    /// Open or closed polyline with round caps and joins
    fn stroke_polyline(&mut self, points: &[Point], stroke: &StrokeStyle, closed: bool);

    fn fill_polygon(&mut self, points: &[Point], color: Color);

    fn stroke_circle(&mut self, center: Point, radius: f64, stroke: &StrokeStyle);

    fn fill_circle(&mut self, center: Point, radius: f64, color: Color);

    fn fill_rect(&mut self, rect: Bounds, color: Color);

    /// Text with its top-left corner at `origin`
    fn draw_text(&mut self, origin: Point, text: &str, font_size: f64, color: Color);
}

/// Draw one annotation at `scale`
pub fn render_annotation<S: RenderSurface + ?Sized>(
    surface: &mut S,
    annotation: &Annotation,
    scale: f64,
) {
    let color = annotation.style.paint_color();
    let width = annotation.style.line_width as f64 * scale;
    let stroke = StrokeStyle::new(color, width);
    let scaled: Vec<Point> = annotation.points.iter().map(|p| p.scaled(scale)).collect();

    match annotation.kind {
        AnnotationType::Select => {}
        AnnotationType::Freehand => draw_stroke(surface, &scaled, &stroke),
        AnnotationType::Highlight => {
            let highlight = StrokeStyle::new(
                annotation
                    .style
                    .paint_color()
                    .with_opacity(annotation.style.opacity * HIGHLIGHT_OPACITY),
                geometry::stroke_width(annotation) * scale,
            );
            draw_stroke(surface, &scaled, &highlight);
        }
        AnnotationType::Line | AnnotationType::Arrow | AnnotationType::DoubleArrow => {
            if let [start, end] = scaled.as_slice() {
                surface.stroke_polyline(&[*start, *end], &stroke, false);
                let head = arrow_head_size(annotation.style.line_width as f64) * scale;
                if annotation.kind != AnnotationType::Line {
                    draw_arrow_head(surface, *start, *end, head, &stroke);
                }
                if annotation.kind == AnnotationType::DoubleArrow {
                    draw_arrow_head(surface, *end, *start, head, &stroke);
                }
            }
        }
        AnnotationType::Circle => {
            if let [a, b] = annotation.points.as_slice() {
                let circle = circle_from_points(*a, *b, annotation.style.diameter_mode());
                let center = circle.center.scaled(scale);
                let radius = circle.radius * scale;
                if annotation.style.is_filled() {
                    surface.fill_circle(center, radius, color);
                }
                surface.stroke_circle(center, radius, &stroke);
            }
        }
        AnnotationType::Rectangle
        | AnnotationType::Triangle
        | AnnotationType::Star
        | AnnotationType::Tick
        | AnnotationType::Cross => {
            let closed = annotation.kind.is_closed_shape();
            for line in geometry::outline(annotation) {
                let line: Vec<Point> = line.iter().map(|p| p.scaled(scale)).collect();
                if closed && annotation.style.is_filled() {
                    surface.fill_polygon(&line, color);
                }
                surface.stroke_polyline(&line, &stroke, false);
            }
        }
        AnnotationType::Text => {
            if let Some(anchor) = scaled.first() {
                let text = annotation.text.as_deref().unwrap_or("");
                surface.draw_text(*anchor, text, TEXT_FONT_SIZE * scale, color);
            }
        }
        AnnotationType::StickyNote => {
            if let Some(bounds) = geometry::label_bounds(annotation) {
                let bounds = bounds.scaled(scale);
                surface.fill_rect(bounds, STICKY_NOTE_FILL.with_opacity(annotation.style.opacity));
                surface.stroke_polyline(&bounds.corners(), &StrokeStyle::new(color, scale), true);
                let padding = STICKY_NOTE_PADDING * scale;
                let origin = Point::new(bounds.min_x + padding, bounds.min_y + padding);
                let text = annotation.text.as_deref().unwrap_or("");
                surface.draw_text(origin, text, TEXT_FONT_SIZE * scale, Color::BLACK);
            }
        }
        AnnotationType::Stamp => {
            if let Some(bounds) = geometry::label_bounds(annotation) {
                let bounds = bounds.scaled(scale);
                let frame = StrokeStyle::new(color, (2.0 * scale).max(width));
                surface.stroke_polyline(&bounds.corners(), &frame, true);
                let font_size = STAMP_FONT_SIZE * scale;
                let origin = Point::new(bounds.min_x + 12.0 * scale, bounds.min_y + font_size / 2.0);
                surface.draw_text(origin, &stamp_label(annotation), font_size, color);
            }
        }
    }
}

/// Selection chrome: bounding box plus resize handles
pub fn render_selection<S: RenderSurface + ?Sized>(
    surface: &mut S,
    annotation: &Annotation,
    scale: f64,
    handle_size_px: f64,
) {
    let Some(bounds) = geometry::bounding_box(annotation) else {
        return;
    };
    let outline = bounds.scaled(scale).inflate(4.0);
    surface.stroke_polyline(&outline.corners(), &StrokeStyle::new(Color::SELECTION, 1.0), true);

    let handle_size = handle_size_px / scale.max(f64::EPSILON);
    for handle in generate_handles(annotation, handle_size) {
        let center = handle.position.scaled(scale);
        let rect = Bounds::new(
            center.x - handle_size_px,
            center.y - handle_size_px,
            center.x + handle_size_px,
            center.y + handle_size_px,
        );
        surface.fill_rect(rect, Color::WHITE);
        surface.stroke_polyline(&rect.corners(), &StrokeStyle::new(Color::SELECTION, 1.0), true);
    }
}

/// Marquee rectangle, given in document space
pub fn render_marquee<S: RenderSurface + ?Sized>(surface: &mut S, marquee: &Bounds, scale: f64) {
    let rect = marquee.scaled(scale);
    surface.fill_rect(rect, Color::SELECTION.with_opacity(0.1));
    surface.stroke_polyline(&rect.corners(), &StrokeStyle::new(Color::SELECTION, 1.0), true);
}

fn draw_stroke<S: RenderSurface + ?Sized>(surface: &mut S, points: &[Point], stroke: &StrokeStyle) {
    match points {
        [] => {}
        [dot] => surface.fill_circle(*dot, stroke.width / 2.0, stroke.color),
        _ => surface.stroke_polyline(points, stroke, false),
    }
}

fn draw_arrow_head<S: RenderSurface + ?Sized>(
    surface: &mut S,
    tail: Point,
    tip: Point,
    head_size: f64,
    stroke: &StrokeStyle,
) {
    if let Some((left, right)) = arrow_head(tail, tip, head_size) {
        surface.stroke_polyline(&[left, tip, right], stroke, false);
    }
}

/// One recorded drawing call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Polyline {
        points: Vec<Point>,
        stroke: StrokeStyle,
        closed: bool,
    },
    Polygon {
        points: Vec<Point>,
        color: Color,
    },
    StrokeCircle {
        center: Point,
        radius: f64,
        stroke: StrokeStyle,
    },
    FillCircle {
        center: Point,
        radius: f64,
        color: Color,
    },
    FillRect {
        rect: Bounds,
        color: Color,
    },
    Text {
        origin: Point,
        text: String,
        font_size: f64,
        color: Color,
    },
}

/// Surface that records calls instead of drawing them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayList {
    pub ops: Vec<DrawOp>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Replay the recording onto another surface
    pub fn replay<S: RenderSurface + ?Sized>(&self, surface: &mut S) {
        for op in &self.ops {
            match op {
                DrawOp::Polyline { points, stroke, closed } => {
                    surface.stroke_polyline(points, stroke, *closed)
                }
                DrawOp::Polygon { points, color } => surface.fill_polygon(points, *color),
                DrawOp::StrokeCircle { center, radius, stroke } => {
                    surface.stroke_circle(*center, *radius, stroke)
                }
                DrawOp::FillCircle { center, radius, color } => {
                    surface.fill_circle(*center, *radius, *color)
                }
                DrawOp::FillRect { rect, color } => surface.fill_rect(*rect, *color),
                DrawOp::Text { origin, text, font_size, color } => {
                    surface.draw_text(*origin, text, *font_size, *color)
                }
            }
        }
    }
}

impl RenderSurface for DisplayList {
    fn stroke_polyline(&mut self, points: &[Point], stroke: &StrokeStyle, closed: bool) {
        self.ops.push(DrawOp::Polyline {
            points: points.to_vec(),
            stroke: *stroke,
            closed,
        });
    }

    fn fill_polygon(&mut self, points: &[Point], color: Color) {
        self.ops.push(DrawOp::Polygon {
            points: points.to_vec(),
            color,
        });
    }

    fn stroke_circle(&mut self, center: Point, radius: f64, stroke: &StrokeStyle) {
        self.ops.push(DrawOp::StrokeCircle {
            center,
            radius,
            stroke: *stroke,
        });
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Color) {
        self.ops.push(DrawOp::FillCircle { center, radius, color });
    }

    fn fill_rect(&mut self, rect: Bounds, color: Color) {
        self.ops.push(DrawOp::FillRect { rect, color });
    }

    fn draw_text(&mut self, origin: Point, text: &str, font_size: f64, color: Color) {
        self.ops.push(DrawOp::Text {
            origin,
            text: text.to_string(),
            font_size,
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationStyle, StampType};

    fn make(kind: AnnotationType, points: &[(f64, f64)]) -> Annotation {
        Annotation::new(
            kind,
            points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            AnnotationStyle::new(),
            1,
            0,
            "tester",
        )
    }

    fn render(annotation: &Annotation, scale: f64) -> DisplayList {
        let mut list = DisplayList::new();
        render_annotation(&mut list, annotation, scale);
        list
    }

    #[test]
    fn test_render_is_idempotent() {
        let annotation = make(AnnotationType::Star, &[(0.0, 0.0), (50.0, 50.0)]);
        assert_eq!(render(&annotation, 1.5), render(&annotation, 1.5));
    }

    #[test]
    fn test_line_scales_points_and_width() {
        let annotation = make(AnnotationType::Line, &[(10.0, 10.0), (20.0, 10.0)]);
        let list = render(&annotation, 2.0);
        assert_eq!(
            list.ops,
            vec![DrawOp::Polyline {
                points: vec![Point::new(20.0, 20.0), Point::new(40.0, 20.0)],
                stroke: StrokeStyle::new(Color::RED, 4.0),
                closed: false,
            }]
        );
    }

    #[test]
    fn test_arrow_heads() {
        let arrow = make(AnnotationType::Arrow, &[(0.0, 0.0), (100.0, 0.0)]);
        assert_eq!(render(&arrow, 1.0).len(), 2);
        let double = make(AnnotationType::DoubleArrow, &[(0.0, 0.0), (100.0, 0.0)]);
        assert_eq!(render(&double, 1.0).len(), 3);
    }

    #[test]
    fn test_highlight_is_wide_and_translucent() {
        let highlight = make(AnnotationType::Highlight, &[(0.0, 0.0), (100.0, 0.0)]);
        match &render(&highlight, 1.0).ops[0] {
            DrawOp::Polyline { stroke, .. } => {
                assert_eq!(stroke.width, 10.0);
                assert_eq!(stroke.color.a, Color::RED.with_opacity(0.35).a);
            }
            other => panic!("unexpected op {other:?}"),
        }
    }

    #[test]
    fn test_single_point_stroke_is_a_dot() {
        let dot = make(AnnotationType::Freehand, &[(5.0, 5.0)]);
        assert!(matches!(render(&dot, 1.0).ops[0], DrawOp::FillCircle { .. }));
    }

    #[test]
    fn test_filled_shapes_fill_before_stroke() {
        let mut rect = make(AnnotationType::Rectangle, &[(0.0, 0.0), (10.0, 10.0)]);
        rect.style.filled = Some(true);
        let list = render(&rect, 1.0);
        assert!(matches!(list.ops[0], DrawOp::Polygon { .. }));
        assert!(matches!(list.ops[1], DrawOp::Polyline { .. }));

        let mut circle = make(AnnotationType::Circle, &[(0.0, 0.0), (10.0, 0.0)]);
        circle.style.filled = Some(true);
        let list = render(&circle, 2.0);
        assert_eq!(
            list.ops[0],
            DrawOp::FillCircle {
                center: Point::new(0.0, 0.0),
                radius: 20.0,
                color: Color::RED,
            }
        );
    }

    #[test]
    fn test_stamp_draws_label() {
        let mut stamp = make(AnnotationType::Stamp, &[(0.0, 0.0)]);
        stamp.style.stamp_type = Some(StampType::Reviewed);
        let list = render(&stamp, 1.0);
        assert!(list
            .ops
            .iter()
            .any(|op| matches!(op, DrawOp::Text { text, .. } if text == "REVIEWED")));
    }

    #[test]
    fn test_selection_chrome_has_handles() {
        let rect = make(AnnotationType::Rectangle, &[(0.0, 0.0), (10.0, 10.0)]);
        let mut list = DisplayList::new();
        render_selection(&mut list, &rect, 1.0, 6.0);
        // outline + 8 handles drawn as fill and border
        assert_eq!(list.len(), 17);
    }

    #[test]
    fn test_replay_reproduces_recording() {
        let note = make(AnnotationType::StickyNote, &[(0.0, 0.0)]).with_text("hi");
        let list = render(&note, 1.0);
        let mut copy = DisplayList::new();
        list.replay(&mut copy);
        assert_eq!(copy, list);
    }
}
