//! Annotation data model
//!
//! Annotations are plain values. All coordinates are stored in document space at
//! scale 1.0 and only multiplied by the view scale at render time. Once an
//! annotation has been committed to history it is never mutated; edits produce a
//! new value with a bumped `version`.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Document-space coordinate (scale 1.0, origin top-left, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Copy of this point shifted by `(dx, dy)`
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Copy of this point multiplied by `scale` (document space to surface space)
    pub fn scaled(&self, scale: f64) -> Self {
        Self::new(self.x * scale, self.y * scale)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// How a tool consumes pointer input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    /// Every sampled point is kept (freehand, highlight)
    Continuous,
    /// Anchor plus live endpoint (line, rectangle, circle, ...)
    Shape,
    /// A single click opens an editor (text, sticky note, stamp)
    Single,
}

/// Annotation kind. `Select` is a tool mode only and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnnotationType {
    Select,
    Freehand,
    Line,
    Arrow,
    DoubleArrow,
    Rectangle,
    Circle,
    Triangle,
    Star,
    Tick,
    Cross,
    Text,
    StickyNote,
    Highlight,
    Stamp,
}

impl AnnotationType {
    /// Every variant, in declaration order
    pub const ALL: [AnnotationType; 15] = [
        AnnotationType::Select,
        AnnotationType::Freehand,
        AnnotationType::Line,
        AnnotationType::Arrow,
        AnnotationType::DoubleArrow,
        AnnotationType::Rectangle,
        AnnotationType::Circle,
        AnnotationType::Triangle,
        AnnotationType::Star,
        AnnotationType::Tick,
        AnnotationType::Cross,
        AnnotationType::Text,
        AnnotationType::StickyNote,
        AnnotationType::Highlight,
        AnnotationType::Stamp,
    ];

    /// How this tool turns a pointer gesture into points.
    ///
    /// `Select` reports `Shape` but never produces a draft.
    pub fn draw_mode(self) -> DrawMode {
        match self {
            AnnotationType::Freehand | AnnotationType::Highlight => DrawMode::Continuous,
            AnnotationType::Text | AnnotationType::StickyNote | AnnotationType::Stamp => {
                DrawMode::Single
            }
            _ => DrawMode::Shape,
        }
    }

    /// Whether an annotation of this type may exist in the store
    pub fn is_persistable(self) -> bool {
        self != AnnotationType::Select
    }

    /// Two-point types rendered as open strokes between their points
    pub fn is_line_family(self) -> bool {
        matches!(
            self,
            AnnotationType::Line | AnnotationType::Arrow | AnnotationType::DoubleArrow
        )
    }

    /// Two-point types whose points span a box the shape is drawn into
    pub fn is_box_shape(self) -> bool {
        matches!(
            self,
            AnnotationType::Rectangle
                | AnnotationType::Circle
                | AnnotationType::Triangle
                | AnnotationType::Star
                | AnnotationType::Tick
                | AnnotationType::Cross
        )
    }

    /// Closed shapes that honour the `filled` style flag
    pub fn is_closed_shape(self) -> bool {
        matches!(
            self,
            AnnotationType::Rectangle
                | AnnotationType::Circle
                | AnnotationType::Triangle
                | AnnotationType::Star
        )
    }

    /// Number of points a committed annotation of this type carries.
    ///
    /// `None` means "one or more" (sampled strokes).
    pub fn expected_points(self) -> Option<usize> {
        match self.draw_mode() {
            DrawMode::Continuous => None,
            DrawMode::Shape => Some(2),
            DrawMode::Single => Some(1),
        }
    }

    /// Wire name used in exported JSON
    pub fn as_str(self) -> &'static str {
        match self {
            AnnotationType::Select => "select",
            AnnotationType::Freehand => "freehand",
            AnnotationType::Line => "line",
            AnnotationType::Arrow => "arrow",
            AnnotationType::DoubleArrow => "doubleArrow",
            AnnotationType::Rectangle => "rectangle",
            AnnotationType::Circle => "circle",
            AnnotationType::Triangle => "triangle",
            AnnotationType::Star => "star",
            AnnotationType::Tick => "tick",
            AnnotationType::Cross => "cross",
            AnnotationType::Text => "text",
            AnnotationType::StickyNote => "stickyNote",
            AnnotationType::Highlight => "highlight",
            AnnotationType::Stamp => "stamp",
        }
    }
}

impl fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stamp presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StampType {
    #[default]
    Approved,
    Rejected,
    Draft,
    Reviewed,
}

impl StampType {
    /// Text drawn inside the stamp frame
    pub fn label(self) -> &'static str {
        match self {
            StampType::Approved => "APPROVED",
            StampType::Rejected => "REJECTED",
            StampType::Draft => "DRAFT",
            StampType::Reviewed => "REVIEWED",
        }
    }
}

/// RGBA color representation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Create a new color
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#RRGGBB` or the `#RGB` shorthand (case-insensitive)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match digits.len() {
            6 => {
                let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
                let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
                let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
                Some(Self::rgb(r, g, b))
            }
            3 => {
                let mut channels = [0u8; 3];
                for (slot, c) in channels.iter_mut().zip(digits.chars()) {
                    let v = c.to_digit(16)? as u8;
                    *slot = v * 16 + v;
                }
                Some(Self::rgb(channels[0], channels[1], channels[2]))
            }
            _ => None,
        }
    }

    /// `#RRGGBB` (alpha is not part of the wire format)
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Same color with alpha derived from an opacity in `[0, 1]`
    pub fn with_opacity(self, opacity: f64) -> Self {
        let a = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self { a, ..self }
    }

    /// Convert to normalized RGBA values (0.0 to 1.0)
    pub fn to_normalized(&self) -> (f32, f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        )
    }
}

/// Common annotation colors
impl Color {
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const SELECTION: Color = Color { r: 0, g: 102, b: 255, a: 255 };
}

/// Visual styling captured when an annotation is created
///
/// Value object: changing the current style replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationStyle {
    /// `#RRGGBB`
    pub color: String,

    /// Stroke width in document units
    pub line_width: u32,

    /// 0.0 = transparent, 1.0 = opaque
    pub opacity: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stamp_type: Option<StampType>,

    /// Circle points are (corner, opposite corner) instead of (center, edge)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circle_diameter_mode: Option<bool>,

    /// Closed shapes are filled and hit-tested by area
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filled: Option<bool>,
}

impl AnnotationStyle {
    /// Red 2-unit stroke, fully opaque
    pub fn new() -> Self {
        Self {
            color: "#FF0000".to_string(),
            line_width: 2,
            opacity: 1.0,
            text: None,
            stamp_type: None,
            circle_diameter_mode: None,
            filled: None,
        }
    }

    /// Parsed stroke color with the style opacity applied; black if the hex is malformed
    pub fn paint_color(&self) -> Color {
        Color::from_hex(&self.color)
            .unwrap_or(Color::BLACK)
            .with_opacity(self.opacity)
    }

    pub fn is_filled(&self) -> bool {
        self.filled.unwrap_or(false)
    }

    pub fn diameter_mode(&self) -> bool {
        self.circle_diameter_mode.unwrap_or(false)
    }

    /// Copy of this style with every field set in `patch` overwritten
    pub fn merged(&self, patch: &StylePatch) -> Self {
        let mut style = self.clone();
        if let Some(color) = &patch.color {
            style.color = color.clone();
        }
        if let Some(line_width) = patch.line_width {
            style.line_width = line_width;
        }
        if let Some(opacity) = patch.opacity {
            style.opacity = opacity;
        }
        if let Some(text) = &patch.text {
            style.text = Some(text.clone());
        }
        if let Some(stamp_type) = patch.stamp_type {
            style.stamp_type = Some(stamp_type);
        }
        if let Some(mode) = patch.circle_diameter_mode {
            style.circle_diameter_mode = Some(mode);
        }
        if let Some(filled) = patch.filled {
            style.filled = Some(filled);
        }
        style
    }

    /// Check the style against the data model
    pub fn validate(&self) -> Result<(), InvalidAnnotation> {
        if Color::from_hex(&self.color).is_none() {
            return Err(InvalidAnnotation::Color(self.color.clone()));
        }
        if self.line_width == 0 {
            return Err(InvalidAnnotation::LineWidth);
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(InvalidAnnotation::Opacity(self.opacity));
        }
        Ok(())
    }
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self::new()
    }
}

/// Partial style update; unset fields keep their current value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StylePatch {
    pub color: Option<String>,
    pub line_width: Option<u32>,
    pub opacity: Option<f64>,
    pub text: Option<String>,
    pub stamp_type: Option<StampType>,
    pub circle_diameter_mode: Option<bool>,
    pub filled: Option<bool>,
}

impl StylePatch {
    pub fn color(color: impl Into<String>) -> Self {
        Self { color: Some(color.into()), ..Self::default() }
    }

    pub fn line_width(line_width: u32) -> Self {
        Self { line_width: Some(line_width), ..Self::default() }
    }

    pub fn opacity(opacity: f64) -> Self {
        Self { opacity: Some(opacity), ..Self::default() }
    }
}

/// Stable unique identifier for an annotation
///
/// Generated ids are UUID v7 strings, so they sort by creation time. Imported ids
/// are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(String);

impl AnnotationId {
    /// Fresh, collision-free id
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AnnotationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for AnnotationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Millisecond clock that never runs backwards within a session
#[derive(Debug, Clone, Default)]
pub struct SessionClock {
    last: u64,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current Unix time in milliseconds, clamped to be >= the previous reading
    pub fn now(&mut self) -> u64 {
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        self.last = self.last.max(wall);
        self.last
    }
}

/// Ways a single annotation value can violate the data model
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidAnnotation {
    #[error("annotation id is empty")]
    EmptyId,
    #[error("`select` is a tool mode and cannot be stored")]
    SelectType,
    #[error("page number must be >= 1")]
    PageNumber,
    #[error("{kind} annotation needs {expected} point(s), found {found}")]
    PointCount {
        kind: AnnotationType,
        expected: String,
        found: usize,
    },
    #[error("point {0} has a non-finite coordinate")]
    NonFinitePoint(usize),
    #[error("line width must be positive")]
    LineWidth,
    #[error("opacity {0} is outside [0, 1]")]
    Opacity(f64),
    #[error("`{0}` is not an #RRGGBB color")]
    Color(String),
}

/// One persisted drawable object anchored to a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: AnnotationId,

    #[serde(rename = "type")]
    pub kind: AnnotationType,

    /// Meaning depends on `kind`, see [`AnnotationType::expected_points`]
    pub points: Vec<Point>,

    pub style: AnnotationStyle,

    /// 1-based
    pub page_number: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Creation time in Unix milliseconds; ordering metadata only
    pub timestamp: u64,

    pub user_id: String,

    /// Derived from the session selection; never exported
    #[serde(skip)]
    pub selected: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

impl Annotation {
    /// Create a new annotation with a generated id and `version = 1`
    pub fn new(
        kind: AnnotationType,
        points: Vec<Point>,
        style: AnnotationStyle,
        page_number: u32,
        timestamp: u64,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            id: AnnotationId::generate(),
            kind,
            points,
            style,
            page_number,
            text: None,
            timestamp,
            user_id: user_id.into(),
            selected: false,
            version: Some(1),
        }
    }

    /// Builder-style text payload
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Next revision counter value
    fn next_version(&self) -> Option<u32> {
        Some(self.version.unwrap_or(1).saturating_add(1))
    }

    /// Copy with every point shifted by `(dx, dy)`
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        let mut moved = self.clone();
        moved.points = self.points.iter().map(|p| p.translated(dx, dy)).collect();
        moved.version = self.next_version();
        moved
    }

    /// Copy with `patch` merged in
    pub fn patched(&self, patch: &AnnotationPatch) -> Self {
        let mut edited = self.clone();
        if let Some(points) = &patch.points {
            edited.points = points.clone();
        }
        if let Some(style) = &patch.style {
            edited.style = self.style.merged(style);
        }
        if let Some(page_number) = patch.page_number {
            edited.page_number = page_number;
        }
        if let Some(text) = &patch.text {
            edited.text = Some(text.clone());
        }
        edited.version = self.next_version();
        edited
    }

    /// Check this value against the data model
    pub fn validate(&self) -> Result<(), InvalidAnnotation> {
        if self.id.as_str().is_empty() {
            return Err(InvalidAnnotation::EmptyId);
        }
        if !self.kind.is_persistable() {
            return Err(InvalidAnnotation::SelectType);
        }
        if self.page_number == 0 {
            return Err(InvalidAnnotation::PageNumber);
        }
        match self.kind.expected_points() {
            Some(expected) if self.points.len() != expected => {
                return Err(InvalidAnnotation::PointCount {
                    kind: self.kind,
                    expected: expected.to_string(),
                    found: self.points.len(),
                });
            }
            None if self.points.is_empty() => {
                return Err(InvalidAnnotation::PointCount {
                    kind: self.kind,
                    expected: "at least 1".to_string(),
                    found: 0,
                });
            }
            _ => {}
        }
        if let Some(index) = self.points.iter().position(|p| !p.is_finite()) {
            return Err(InvalidAnnotation::NonFinitePoint(index));
        }
        self.style.validate()
    }
}

/// Field-wise edit applied by `update_annotation`; `id` and `type` are immutable
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationPatch {
    pub points: Option<Vec<Point>>,
    pub style: Option<StylePatch>,
    pub page_number: Option<u32>,
    pub text: Option<String>,
}

impl AnnotationPatch {
    pub fn points(points: Vec<Point>) -> Self {
        Self { points: Some(points), ..Self::default() }
    }

    pub fn style(style: StylePatch) -> Self {
        Self { style: Some(style), ..Self::default() }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..Self::default() }
    }
}
