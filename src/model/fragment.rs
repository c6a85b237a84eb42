//! Display lists produced by block layout and consumed by the rasterizer.
//!
//! Coordinates are CSS pixels relative to the top-left corner of the block
//! that owns the fragment; y grows downwards.

use std::sync::Arc;

/// An sRGB color with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Alpha channel (255 = opaque)
    pub a: u8,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    /// Create an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Create an opaque color from a `0xRRGGBB` literal.
    pub const fn hex(value: u32) -> Self {
        Self::rgb((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    /// Return the same color with the given alpha.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// `#rrggbb` form.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Alpha as a 0.0-1.0 opacity.
    pub fn opacity(self) -> f32 {
        f32::from(self.a) / 255.0
    }

    /// Check if the color is fully opaque.
    pub fn is_opaque(self) -> bool {
        self.a == 255
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Rect {
    /// Create a rectangle.
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    fn translated(self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }
}

/// Stroke paint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    /// Stroke color
    pub color: Color,
    /// Line width in pixels
    pub width: f32,
}

impl Stroke {
    /// Create a stroke.
    pub const fn new(color: Color, width: f32) -> Self {
        Self { color, width }
    }
}

/// Generic font family used by the block renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFamily {
    /// Proportional body font
    Sans,
    /// Monospaced font for code
    Mono,
}

/// Font selection for a text run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec {
    /// Family
    pub family: FontFamily,
    /// Size in pixels
    pub size: f32,
    /// Bold weight
    pub bold: bool,
    /// Italic style
    pub italic: bool,
}

impl FontSpec {
    /// Regular sans-serif font of the given size.
    pub const fn sans(size: f32) -> Self {
        Self {
            family: FontFamily::Sans,
            size,
            bold: false,
            italic: false,
        }
    }

    /// Regular monospaced font of the given size.
    pub const fn mono(size: f32) -> Self {
        Self {
            family: FontFamily::Mono,
            size,
            bold: false,
            italic: false,
        }
    }

    /// Same font in bold.
    pub const fn bold(self) -> Self {
        Self { bold: true, ..self }
    }

    /// Same font in italic.
    pub const fn italic(self) -> Self {
        Self {
            italic: true,
            ..self
        }
    }
}

/// Embedded raster or vector payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedded {
    /// MIME type of `data` (e.g. `image/png`, `image/svg+xml`)
    pub mime: String,
    /// Encoded bytes
    pub data: Arc<Vec<u8>>,
}

/// A single drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Filled and/or stroked rectangle
    Rect {
        /// Geometry
        rect: Rect,
        /// Fill paint
        fill: Option<Color>,
        /// Stroke paint
        stroke: Option<Stroke>,
    },

    /// Straight line
    Line {
        /// Start point
        from: (f32, f32),
        /// End point
        to: (f32, f32),
        /// Stroke paint
        stroke: Stroke,
    },

    /// Filled circle
    Circle {
        /// Center
        center: (f32, f32),
        /// Radius
        radius: f32,
        /// Fill paint
        fill: Color,
    },

    /// Filled closed polygon
    Polygon {
        /// Vertices
        points: Vec<(f32, f32)>,
        /// Fill paint
        fill: Color,
    },

    /// Single line of text
    Text {
        /// Left edge of the run
        x: f32,
        /// Baseline position
        baseline: f32,
        /// Text content
        text: String,
        /// Font selection
        font: FontSpec,
        /// Text color
        color: Color,
        /// Underline decoration
        underline: bool,
        /// Strikethrough decoration
        strikethrough: bool,
    },

    /// Embedded image or SVG drawn into `rect`
    Embed {
        /// Destination rectangle
        rect: Rect,
        /// Payload
        payload: Embedded,
    },
}

impl DrawOp {
    fn translate(&mut self, dx: f32, dy: f32) {
        match self {
            DrawOp::Rect { rect, .. } | DrawOp::Embed { rect, .. } => {
                *rect = rect.translated(dx, dy);
            }
            DrawOp::Line { from, to, .. } => {
                *from = (from.0 + dx, from.1 + dy);
                *to = (to.0 + dx, to.1 + dy);
            }
            DrawOp::Circle { center, .. } => {
                *center = (center.0 + dx, center.1 + dy);
            }
            DrawOp::Polygon { points, .. } => {
                for p in points.iter_mut() {
                    *p = (p.0 + dx, p.1 + dy);
                }
            }
            DrawOp::Text { x, baseline, .. } => {
                *x += dx;
                *baseline += dy;
            }
        }
    }
}

/// Ordered display list of a block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    /// Operations in painting order
    pub ops: Vec<DrawOp>,
}

impl Fragment {
    /// Create an empty fragment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation.
    pub fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }

    /// Append all operations of `other`, offset by `(dx, dy)`.
    pub fn append_translated(&mut self, other: Fragment, dx: f32, dy: f32) {
        self.ops.extend(other.ops.into_iter().map(|mut op| {
            op.translate(dx, dy);
            op
        }));
    }

    /// Check if the fragment draws nothing.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Count text runs in the fragment.
    pub fn text_run_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Text { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex() {
        assert_eq!(Color::hex(0xf9fafb).to_hex(), "#f9fafb");
        assert!(Color::BLACK.is_opaque());
        assert!((Color::BLACK.with_alpha(51).opacity() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_append_translated() {
        let mut inner = Fragment::new();
        inner.push(DrawOp::Rect {
            rect: Rect::new(1.0, 2.0, 3.0, 4.0),
            fill: Some(Color::BLACK),
            stroke: None,
        });
        inner.push(DrawOp::Text {
            x: 0.0,
            baseline: 10.0,
            text: "a".into(),
            font: FontSpec::sans(12.0),
            color: Color::BLACK,
            underline: false,
            strikethrough: false,
        });

        let mut outer = Fragment::new();
        outer.append_translated(inner, 10.0, 20.0);

        assert_eq!(outer.len(), 2);
        assert_eq!(outer.text_run_count(), 1);
        match &outer.ops[0] {
            DrawOp::Rect { rect, .. } => assert_eq!(*rect, Rect::new(11.0, 22.0, 3.0, 4.0)),
            other => panic!("unexpected op {other:?}"),
        }
        match &outer.ops[1] {
            DrawOp::Text { x, baseline, .. } => {
                assert_eq!(*x, 10.0);
                assert_eq!(*baseline, 30.0);
            }
            other => panic!("unexpected op {other:?}"),
        }
    }
}
