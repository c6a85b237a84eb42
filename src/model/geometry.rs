//! Page geometry: the virtual page template and its physical paper size.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Physical length unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    /// Millimeters
    Mm,
    /// Inches
    In,
    /// PostScript points (1/72 inch)
    Pt,
}

impl Unit {
    /// Convert a length in this unit to points.
    pub fn to_points(self, value: f32) -> f32 {
        match self {
            Unit::Mm => value * 72.0 / 25.4,
            Unit::In => value * 72.0,
            Unit::Pt => value,
        }
    }
}

/// Physical output page format (portrait).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaperSize {
    /// Page width in `unit`
    pub width: f32,
    /// Page height in `unit`
    pub height: f32,
    /// Unit of `width` and `height`
    pub unit: Unit,
}

impl PaperSize {
    /// ISO A4, 210 x 297 mm.
    pub const A4: PaperSize = PaperSize::new(210.0, 297.0, Unit::Mm);
    /// ISO A5, 148 x 210 mm.
    pub const A5: PaperSize = PaperSize::new(148.0, 210.0, Unit::Mm);
    /// US Letter, 8.5 x 11 in.
    pub const LETTER: PaperSize = PaperSize::new(8.5, 11.0, Unit::In);
    /// US Legal, 8.5 x 14 in.
    pub const LEGAL: PaperSize = PaperSize::new(8.5, 14.0, Unit::In);

    /// Create a paper size.
    pub const fn new(width: f32, height: f32, unit: Unit) -> Self {
        Self {
            width,
            height,
            unit,
        }
    }

    /// Look up a named format (`a4`, `a5`, `letter`, `legal`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "a4" => Some(Self::A4),
            "a5" => Some(Self::A5),
            "letter" => Some(Self::LETTER),
            "legal" => Some(Self::LEGAL),
            _ => None,
        }
    }

    /// Size in points as `(width, height)`.
    pub fn size_in_points(&self) -> (f32, f32) {
        (
            self.unit.to_points(self.width),
            self.unit.to_points(self.height),
        )
    }

    /// Height divided by width.
    pub fn aspect_ratio(&self) -> f32 {
        self.height / self.width
    }
}

impl Default for PaperSize {
    fn default() -> Self {
        Self::A4
    }
}

/// Immutable virtual page template.
///
/// The pixel height is derived from the pixel width and the paper's aspect
/// ratio, so a captured page maps onto the physical page without distortion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    width: f32,
    height: f32,
    padding: f32,
    oversample: f32,
    paper: PaperSize,
}

impl PageGeometry {
    /// Default virtual page width in pixels.
    pub const DEFAULT_WIDTH: f32 = 800.0;
    /// Default padding on every side in pixels.
    pub const DEFAULT_PADDING: f32 = 40.0;
    /// Default capture oversampling factor.
    pub const DEFAULT_OVERSAMPLE: f32 = 2.0;

    /// Create a geometry for `paper` at the given pixel width.
    pub fn new(paper: PaperSize, width: f32, padding: f32, oversample: f32) -> Result<Self> {
        let height = (width * paper.height / paper.width).floor();
        Self::with_height(paper, width, height, padding, oversample)
    }

    /// Create a geometry with an explicit pixel height.
    pub fn with_height(
        paper: PaperSize,
        width: f32,
        height: f32,
        padding: f32,
        oversample: f32,
    ) -> Result<Self> {
        let geometry = Self {
            width,
            height,
            padding,
            oversample,
            paper,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    fn validate(&self) -> Result<()> {
        let values = [self.width, self.height, self.padding, self.oversample];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidGeometry("non-finite dimension".into()));
        }
        if self.padding < 0.0 {
            return Err(Error::InvalidGeometry(format!(
                "negative padding {}",
                self.padding
            )));
        }
        if self.usable_width() <= 0.0 || self.usable_height() <= 0.0 {
            return Err(Error::InvalidGeometry(format!(
                "padding {} leaves no content area in a {}x{} page",
                self.padding, self.width, self.height
            )));
        }
        if self.oversample <= 0.0 {
            return Err(Error::InvalidGeometry(format!(
                "oversample factor must be positive, got {}",
                self.oversample
            )));
        }
        if self.paper.width <= 0.0 || self.paper.height <= 0.0 {
            return Err(Error::InvalidGeometry("empty paper size".into()));
        }
        Ok(())
    }

    /// Page width in pixels.
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Page height in pixels.
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Padding on every side in pixels.
    pub fn padding(&self) -> f32 {
        self.padding
    }

    /// Capture oversampling factor.
    pub fn oversample(&self) -> f32 {
        self.oversample
    }

    /// Physical output format.
    pub fn paper(&self) -> PaperSize {
        self.paper
    }

    /// Content width: width minus both paddings.
    pub fn usable_width(&self) -> f32 {
        self.width - 2.0 * self.padding
    }

    /// Content height: height minus both paddings.
    pub fn usable_height(&self) -> f32 {
        self.height - 2.0 * self.padding
    }

    /// Bitmap size of one captured page.
    pub fn capture_size(&self) -> (u32, u32) {
        (
            (self.width * self.oversample).round() as u32,
            (self.height * self.oversample).round() as u32,
        )
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        // 800 x floor(800 * 297 / 210) = 800 x 1131
        Self {
            width: Self::DEFAULT_WIDTH,
            height: (Self::DEFAULT_WIDTH * PaperSize::A4.height / PaperSize::A4.width).floor(),
            padding: Self::DEFAULT_PADDING,
            oversample: Self::DEFAULT_OVERSAMPLE,
            paper: PaperSize::A4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry() {
        let g = PageGeometry::default();
        assert_eq!(g.width(), 800.0);
        assert_eq!(g.height(), 1131.0);
        assert_eq!(g.usable_width(), 720.0);
        assert_eq!(g.usable_height(), 1051.0);
        assert_eq!(g.capture_size(), (1600, 2262));
    }

    #[test]
    fn test_new_matches_default() {
        let g = PageGeometry::new(PaperSize::A4, 800.0, 40.0, 2.0).unwrap();
        assert_eq!(g, PageGeometry::default());
    }

    #[test]
    fn test_rejects_oversized_padding() {
        let err = PageGeometry::new(PaperSize::A4, 100.0, 60.0, 2.0).unwrap_err();
        assert!(matches!(err, Error::InvalidGeometry(_)));
    }

    #[test]
    fn test_rejects_bad_oversample() {
        assert!(PageGeometry::new(PaperSize::A4, 800.0, 40.0, 0.0).is_err());
        assert!(PageGeometry::new(PaperSize::A4, f32::NAN, 40.0, 2.0).is_err());
    }

    #[test]
    fn test_paper_points() {
        let (w, h) = PaperSize::A4.size_in_points();
        assert!((w - 595.28).abs() < 0.01);
        assert!((h - 841.89).abs() < 0.01);

        let (w, h) = PaperSize::LETTER.size_in_points();
        assert_eq!((w, h), (612.0, 792.0));
    }

    #[test]
    fn test_paper_from_name() {
        assert_eq!(PaperSize::from_name("A4"), Some(PaperSize::A4));
        assert_eq!(PaperSize::from_name("letter"), Some(PaperSize::LETTER));
        assert_eq!(PaperSize::from_name("tabloid"), None);
    }
}
