//! CPU raster backend for the render primitive using tiny-skia
//!
//! Used for thumbnails and for checking rendered output in tests. Glyph shaping
//! belongs to the host, so text is drawn as a translucent placeholder bar.

use tiny_skia::{FillRule, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, Stroke, Transform};

use crate::annotation::{Color, Point};
use crate::geometry::Bounds;
use crate::render::{RenderSurface, StrokeStyle};

/// [`RenderSurface`] drawing into an owned RGBA pixmap
pub struct PixmapSurface {
    pixmap: Pixmap,
}

impl PixmapSurface {
    /// Transparent surface; `None` for a zero-sized area
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Pixmap::new(width, height).map(|pixmap| Self { pixmap })
    }

    pub fn from_pixmap(pixmap: Pixmap) -> Self {
        Self { pixmap }
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    pub fn clear(&mut self, color: Color) {
        self.pixmap
            .fill(tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a));
    }

    /// Un-premultiplied color at `(x, y)`
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.pixmap.pixel(x, y).map(|pixel| {
            let c = pixel.demultiply();
            Color::new(c.red(), c.green(), c.blue(), c.alpha())
        })
    }
}

fn paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

fn polyline_path(points: &[Point], closed: bool) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for point in rest {
        pb.line_to(point.x as f32, point.y as f32);
    }
    if closed {
        pb.close();
    }
    pb.finish()
}

fn stroke(style: &StrokeStyle) -> Stroke {
    Stroke {
        width: style.width.max(0.5) as f32,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    }
}

impl RenderSurface for PixmapSurface {
    fn stroke_polyline(&mut self, points: &[Point], style: &StrokeStyle, closed: bool) {
        if let Some(path) = polyline_path(points, closed) {
            self.pixmap.stroke_path(
                &path,
                &paint(style.color),
                &stroke(style),
                Transform::identity(),
                None,
            );
        }
    }

    fn fill_polygon(&mut self, points: &[Point], color: Color) {
        if let Some(path) = polyline_path(points, true) {
            self.pixmap.fill_path(
                &path,
                &paint(color),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }

    fn stroke_circle(&mut self, center: Point, radius: f64, style: &StrokeStyle) {
        if let Some(path) = PathBuilder::from_circle(center.x as f32, center.y as f32, radius as f32)
        {
            self.pixmap.stroke_path(
                &path,
                &paint(style.color),
                &stroke(style),
                Transform::identity(),
                None,
            );
        }
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Color) {
        if let Some(path) = PathBuilder::from_circle(center.x as f32, center.y as f32, radius as f32)
        {
            self.pixmap.fill_path(
                &path,
                &paint(color),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }

    fn fill_rect(&mut self, rect: Bounds, color: Color) {
        if let Some(rect) = tiny_skia::Rect::from_ltrb(
            rect.min_x as f32,
            rect.min_y as f32,
            rect.max_x as f32,
            rect.max_y as f32,
        ) {
            self.pixmap
                .fill_rect(rect, &paint(color), Transform::identity(), None);
        }
    }

    fn draw_text(&mut self, origin: Point, text: &str, font_size: f64, color: Color) {
        let chars = text.chars().count() as f64;
        if chars == 0.0 {
            return;
        }
        let bar = Bounds::new(
            origin.x,
            origin.y,
            origin.x + font_size * 0.6 * chars,
            origin.y + font_size * 1.2,
        );
        let faded = color.with_opacity(color.a as f64 / 255.0 * 0.25);
        self.fill_rect(bar, faded);
    }
}
