//! Shape geometry shared by hit-testing, selection and rendering
//!
//! Everything here is a pure function of an annotation's stored points and style.
//! Two-point shapes keep their raw (anchor, endpoint) pair; the functions in this
//! module interpret that pair per type.

use crate::annotation::{Annotation, AnnotationType, DrawMode, Point};

/// Arrowhead barb angle from the shaft (35 degrees)
pub const ARROW_HEAD_ANGLE: f64 = 0.610_865_238;
/// Smallest arrowhead barb length in document units
pub const MIN_ARROW_HEAD: f64 = 10.0;
/// Font size used for text annotations, document units
pub const TEXT_FONT_SIZE: f64 = 16.0;
/// Font size used for stamp labels, document units
pub const STAMP_FONT_SIZE: f64 = 20.0;
/// Sticky note box size, document units
pub const STICKY_NOTE_WIDTH: f64 = 160.0;
pub const STICKY_NOTE_HEIGHT: f64 = 100.0;
/// Star inner radius as a fraction of the outer radius
pub const STAR_INNER_RATIO: f64 = 0.4;
/// Highlight strokes are this much wider than the style line width
pub const HIGHLIGHT_WIDTH_FACTOR: f64 = 5.0;

/// Axis-aligned bounding box in document space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Normalized box spanned by two arbitrary corners
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    /// Smallest box containing every point, `None` for an empty slice
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Self::new(first.x, first.y, first.x, first.y);
        for point in points.iter().skip(1) {
            bounds.min_x = bounds.min_x.min(point.x);
            bounds.min_y = bounds.min_y.min(point.y);
            bounds.max_x = bounds.max_x.max(point.x);
            bounds.max_y = bounds.max_y.max(point.y);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    /// True when the boxes overlap or touch
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Box grown by `amount` on every side
    pub fn inflate(&self, amount: f64) -> Self {
        Self::new(
            self.min_x - amount,
            self.min_y - amount,
            self.max_x + amount,
            self.max_y + amount,
        )
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.min_x + dx, self.min_y + dy, self.max_x + dx, self.max_y + dy)
    }

    pub fn scaled(&self, scale: f64) -> Self {
        Self::new(
            self.min_x * scale,
            self.min_y * scale,
            self.max_x * scale,
            self.max_y * scale,
        )
    }

    /// Corners clockwise from top-left
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.max_x, self.max_y),
            Point::new(self.min_x, self.max_y),
        ]
    }
}

/// Circle resolved from the two stored points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleShape {
    pub center: Point,
    pub radius: f64,
}

impl CircleShape {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(
            self.center.x - self.radius,
            self.center.y - self.radius,
            self.center.x + self.radius,
            self.center.y + self.radius,
        )
    }
}

/// Interpret two circle points.
///
/// Radius mode: `(center, edge)`. Diameter mode: `(corner, opposite corner)` of a
/// bounding square with side `max(|dx|, |dy|)` growing in the drag direction.
pub fn circle_from_points(a: Point, b: Point, diameter_mode: bool) -> CircleShape {
    if diameter_mode {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let side = dx.abs().max(dy.abs());
        let half = side / 2.0;
        let center = Point::new(a.x + half * sign(dx), a.y + half * sign(dy));
        CircleShape { center, radius: half }
    } else {
        CircleShape { center: a, radius: a.distance_to(&b) }
    }
}

fn sign(value: f64) -> f64 {
    if value < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Isosceles triangle inscribed in the box, apex at top-centre
pub fn triangle_vertices(bounds: &Bounds) -> [Point; 3] {
    [
        Point::new(bounds.center().x, bounds.min_y),
        Point::new(bounds.max_x, bounds.max_y),
        Point::new(bounds.min_x, bounds.max_y),
    ]
}

/// Five-pointed star centred in the box, first tip pointing up
pub fn star_vertices(bounds: &Bounds) -> Vec<Point> {
    let center = bounds.center();
    let outer = bounds.width().min(bounds.height()) / 2.0;
    let inner = outer * STAR_INNER_RATIO;
    (0..10)
        .map(|i| {
            let radius = if i % 2 == 0 { outer } else { inner };
            let angle = -std::f64::consts::FRAC_PI_2 + i as f64 * std::f64::consts::PI / 5.0;
            Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect()
}

/// Check mark polyline inside the box
pub fn tick_vertices(bounds: &Bounds) -> [Point; 3] {
    [
        Point::new(bounds.min_x, bounds.min_y + bounds.height() * 0.55),
        Point::new(bounds.min_x + bounds.width() * 0.35, bounds.max_y),
        Point::new(bounds.max_x, bounds.min_y),
    ]
}

/// The two diagonals of the box
pub fn cross_segments(bounds: &Bounds) -> [(Point, Point); 2] {
    [
        (Point::new(bounds.min_x, bounds.min_y), Point::new(bounds.max_x, bounds.max_y)),
        (Point::new(bounds.max_x, bounds.min_y), Point::new(bounds.min_x, bounds.max_y)),
    ]
}

/// Barb length for an arrow of the given stroke width
pub fn arrow_head_size(line_width: f64) -> f64 {
    (line_width * 3.0).max(MIN_ARROW_HEAD)
}

/// Arrowhead barb endpoints at `tip` for a shaft coming from `tail`.
///
/// Returns `None` when the shaft has no direction.
pub fn arrow_head(tail: Point, tip: Point, head_size: f64) -> Option<(Point, Point)> {
    let dx = tip.x - tail.x;
    let dy = tip.y - tail.y;
    let length = (dx * dx + dy * dy).sqrt();
    if length < 1e-9 {
        return None;
    }
    let back = (-dx / length, -dy / length);
    let (sin_a, cos_a) = ARROW_HEAD_ANGLE.sin_cos();
    let left = Point::new(
        tip.x + (back.0 * cos_a - back.1 * sin_a) * head_size,
        tip.y + (back.0 * sin_a + back.1 * cos_a) * head_size,
    );
    let right = Point::new(
        tip.x + (back.0 * cos_a + back.1 * sin_a) * head_size,
        tip.y + (-back.0 * sin_a + back.1 * cos_a) * head_size,
    );
    Some((left, right))
}

/// Rendered box of a text, sticky note or stamp annotation anchored at its point
pub fn label_bounds(annotation: &Annotation) -> Option<Bounds> {
    let anchor = *annotation.points.first()?;
    let (width, height) = match annotation.kind {
        AnnotationType::Text => {
            let chars = annotation.text.as_deref().unwrap_or("").chars().count() as f64;
            ((TEXT_FONT_SIZE * 0.6 * chars).max(40.0), TEXT_FONT_SIZE * 1.2)
        }
        AnnotationType::StickyNote => (STICKY_NOTE_WIDTH, STICKY_NOTE_HEIGHT),
        AnnotationType::Stamp => {
            let label = stamp_label(annotation);
            let chars = label.chars().count() as f64;
            (STAMP_FONT_SIZE * 0.7 * chars + 24.0, STAMP_FONT_SIZE * 2.0)
        }
        _ => return None,
    };
    Some(Bounds::new(anchor.x, anchor.y, anchor.x + width, anchor.y + height))
}

/// Text drawn inside a stamp
pub fn stamp_label(annotation: &Annotation) -> String {
    match (&annotation.text, annotation.style.stamp_type) {
        (Some(text), _) if !text.trim().is_empty() => text.clone(),
        (_, stamp) => stamp.unwrap_or_default().label().to_string(),
    }
}

/// Geometric outline of a two-point box shape or line as polylines.
///
/// Circles are not included (see [`circle_from_points`]).
pub fn outline(annotation: &Annotation) -> Vec<Vec<Point>> {
    let points = &annotation.points;
    match annotation.kind {
        AnnotationType::Freehand | AnnotationType::Highlight => vec![points.clone()],
        kind if kind.is_line_family() => vec![points.clone()],
        AnnotationType::Rectangle => match shape_box(annotation) {
            Some(b) => {
                let mut ring = b.corners().to_vec();
                ring.push(ring[0]);
                vec![ring]
            }
            None => Vec::new(),
        },
        AnnotationType::Triangle => match shape_box(annotation) {
            Some(b) => {
                let mut ring = triangle_vertices(&b).to_vec();
                ring.push(ring[0]);
                vec![ring]
            }
            None => Vec::new(),
        },
        AnnotationType::Star => match shape_box(annotation) {
            Some(b) => {
                let mut ring = star_vertices(&b);
                ring.push(ring[0]);
                vec![ring]
            }
            None => Vec::new(),
        },
        AnnotationType::Tick => shape_box(annotation)
            .map(|b| vec![tick_vertices(&b).to_vec()])
            .unwrap_or_default(),
        AnnotationType::Cross => shape_box(annotation)
            .map(|b| {
                cross_segments(&b)
                    .iter()
                    .map(|(a, b)| vec![*a, *b])
                    .collect()
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Box spanned by the two stored points of a box shape
pub fn shape_box(annotation: &Annotation) -> Option<Bounds> {
    match annotation.points.as_slice() {
        [a, b] => Some(Bounds::from_corners(*a, *b)),
        _ => None,
    }
}

/// Bounding box of the shape as drawn, without stroke padding
pub fn bounding_box(annotation: &Annotation) -> Option<Bounds> {
    match annotation.kind {
        AnnotationType::Circle => match annotation.points.as_slice() {
            [a, b] => Some(circle_from_points(*a, *b, annotation.style.diameter_mode()).bounds()),
            _ => None,
        },
        AnnotationType::Star => shape_box(annotation)
            .and_then(|b| Bounds::from_points(&star_vertices(&b))),
        AnnotationType::Text | AnnotationType::StickyNote | AnnotationType::Stamp => {
            label_bounds(annotation)
        }
        _ => Bounds::from_points(&annotation.points),
    }
}

/// Whether `points` are too small to stand as an annotation of `kind`.
///
/// Two-point shapes need their endpoints at least `min_distance` apart.
pub fn is_degenerate(kind: AnnotationType, points: &[Point], min_distance: f64) -> bool {
    match kind.draw_mode() {
        DrawMode::Continuous => points.is_empty(),
        DrawMode::Shape => match points {
            [a, b] => a.distance_to(b) < min_distance,
            _ => true,
        },
        DrawMode::Single => points.len() != 1,
    }
}

/// Stroke width as drawn, in document units
pub fn stroke_width(annotation: &Annotation) -> f64 {
    let width = annotation.style.line_width as f64;
    if annotation.kind == AnnotationType::Highlight {
        width * HIGHLIGHT_WIDTH_FACTOR
    } else {
        width
    }
}

/// Shortest distance from `point` to the segment `a`-`b`
pub fn distance_to_segment(point: &Point, a: &Point, b: &Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx * dx + dy * dy;

    if length_sq < 1e-12 {
        return point.distance_to(a);
    }

    let t = (((point.x - a.x) * dx + (point.y - a.y) * dy) / length_sq).clamp(0.0, 1.0);
    let closest = Point::new(a.x + t * dx, a.y + t * dy);
    point.distance_to(&closest)
}

/// Shortest distance from `point` to an open polyline (a lone point counts as a dot)
pub fn distance_to_polyline(point: &Point, polyline: &[Point]) -> f64 {
    match polyline {
        [] => f64::INFINITY,
        [only] => point.distance_to(only),
        _ => polyline
            .windows(2)
            .map(|w| distance_to_segment(point, &w[0], &w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Even-odd point-in-polygon test
pub fn point_in_polygon(point: &Point, polygon: &[Point]) -> bool {
    let mut inside = false;
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > point.y) != (pj.y > point.y)
            && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}
