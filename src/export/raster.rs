//! Page rasterization.

use super::stage::StagedPage;
use crate::error::{Error, Result};
use crate::model::{PageGeometry, RasterImage};
use crate::render::{fonts, svg};
use image::RgbImage;
use std::fmt::Write;
use std::sync::Arc;
use tiny_skia::{Pixmap, Transform};
use usvg::fontdb::Database;

/// Captures a staged page as a bitmap.
pub trait Rasterizer: Send + Sync {
    /// Rasterize `page` at the geometry's capture size.
    fn rasterize(&self, page: &StagedPage, geometry: &PageGeometry) -> Result<RasterImage>;
}

impl<R: Rasterizer + ?Sized> Rasterizer for Arc<R> {
    fn rasterize(&self, page: &StagedPage, geometry: &PageGeometry) -> Result<RasterImage> {
        (**self).rasterize(page, geometry)
    }
}

/// Rasterizer that composes each page as SVG and renders it with resvg.
#[derive(Clone)]
pub struct SvgRasterizer {
    fonts: Arc<Database>,
}

impl std::fmt::Debug for SvgRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgRasterizer")
            .field("faces", &self.fonts.len())
            .finish()
    }
}

impl SvgRasterizer {
    /// Rasterizer using the shared system font database.
    pub fn new() -> Self {
        Self::with_fonts(fonts::system_fonts())
    }

    /// Rasterizer using a specific font database.
    pub fn with_fonts(fonts: Arc<Database>) -> Self {
        Self { fonts }
    }

    /// Compose a page as an SVG document in page pixel coordinates.
    pub fn compose(&self, page: &StagedPage, geometry: &PageGeometry) -> String {
        let (width, height) = (geometry.width(), geometry.height());
        let padding = geometry.padding();

        let mut out = String::new();
        svg::open_document(&mut out, width, height);
        let _ = writeln!(
            out,
            r#"<defs><clipPath id="page"><rect x="0" y="0" width="{w}" height="{h}"/></clipPath></defs>"#,
            w = svg::num(width),
            h = svg::num(height)
        );
        let _ = writeln!(
            out,
            r##"<rect x="0" y="0" width="{w}" height="{h}" fill="#ffffff"/>"##,
            w = svg::num(width),
            h = svg::num(height)
        );
        out.push_str("<g clip-path=\"url(#page)\">\n");
        for slot in &page.slots {
            let _ = writeln!(
                out,
                r#"<g transform="translate({} {})">"#,
                svg::num(padding),
                svg::num(padding + slot.y)
            );
            if slot.block.is_rescaled() {
                let _ = writeln!(out, r#"<g transform="scale({})">"#, slot.block.scale());
                svg::write_fragment(&mut out, &slot.block.fragment);
                out.push_str("</g>\n");
            } else {
                svg::write_fragment(&mut out, &slot.block.fragment);
            }
            out.push_str("</g>\n");
        }
        out.push_str("</g>\n");
        svg::close_document(&mut out);
        out
    }
}

impl Default for SvgRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for SvgRasterizer {
    fn rasterize(&self, page: &StagedPage, geometry: &PageGeometry) -> Result<RasterImage> {
        let number = page.number;
        let document = self.compose(page, geometry);
        let tree = usvg::Tree::from_str(&document, &usvg::Options::default(), &self.fonts)
            .map_err(|e| Error::capture(number, e.to_string()))?;

        let (pw, ph) = geometry.capture_size();
        let mut pixmap = Pixmap::new(pw, ph)
            .ok_or_else(|| Error::capture(number, format!("cannot allocate {pw}x{ph} pixmap")))?;
        pixmap.fill(tiny_skia::Color::WHITE);

        let transform = Transform::from_scale(
            pw as f32 / geometry.width(),
            ph as f32 / geometry.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        let pixels = to_rgb(&pixmap)
            .ok_or_else(|| Error::capture(number, "pixel buffer size mismatch"))?;
        log::debug!(
            "captured page {} ({} blocks) at {}x{}",
            number,
            page.len(),
            pw,
            ph
        );
        Ok(RasterImage::new(
            number,
            pixels,
            (geometry.width(), geometry.height()),
            geometry.oversample(),
        ))
    }
}

/// Flatten a premultiplied RGBA pixmap onto white.
fn to_rgb(pixmap: &Pixmap) -> Option<RgbImage> {
    let mut rgb = Vec::with_capacity(pixmap.width() as usize * pixmap.height() as usize * 3);
    for px in pixmap.data().chunks_exact(4) {
        let inv = 255 - px[3];
        rgb.push(px[0].saturating_add(inv));
        rgb.push(px[1].saturating_add(inv));
        rgb.push(px[2].saturating_add(inv));
    }
    RgbImage::from_raw(pixmap.width(), pixmap.height(), rgb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Color, DrawOp, Fragment, PaperSize, Rect, VisualBlock};
    use crate::export::stage::Slot;

    fn geometry() -> PageGeometry {
        PageGeometry::with_height(PaperSize::A4, 100.0, 140.0, 10.0, 1.0).unwrap()
    }

    fn black_block(position: usize, height: f32) -> VisualBlock {
        let mut fragment = Fragment::new();
        fragment.push(DrawOp::Rect {
            rect: Rect::new(0.0, 0.0, 80.0, height),
            fill: Some(Color::BLACK),
            stroke: None,
        });
        VisualBlock::new(
            position,
            crate::model::BlockKind::CodeBlock,
            80.0,
            height,
            fragment,
        )
    }

    fn staged(slots: Vec<Slot>) -> StagedPage {
        StagedPage {
            number: 1,
            slots,
            used_height: 0.0,
        }
    }

    #[test]
    fn test_blank_page_is_white() {
        let rasterizer = SvgRasterizer::with_fonts(fonts::empty_fonts());
        let image = rasterizer.rasterize(&staged(vec![]), &geometry()).unwrap();
        assert_eq!((image.width(), image.height()), (100, 140));
        assert!(image.as_raw().iter().all(|&b| b == 255));
    }

    #[test]
    fn test_block_drawn_inside_padding() {
        let rasterizer = SvgRasterizer::with_fonts(fonts::empty_fonts());
        let page = staged(vec![Slot {
            y: 0.0,
            block: black_block(0, 20.0),
        }]);
        let image = rasterizer.rasterize(&page, &geometry()).unwrap();
        let pixels = image.pixels();

        assert_eq!(pixels.get_pixel(5, 5).0, [255, 255, 255]);
        assert_eq!(pixels.get_pixel(50, 20).0, [0, 0, 0]);
        assert_eq!(pixels.get_pixel(50, 35).0, [255, 255, 255]);
    }

    #[test]
    fn test_oversample_scales_capture() {
        let geometry = PageGeometry::with_height(PaperSize::A4, 100.0, 140.0, 10.0, 2.0).unwrap();
        let rasterizer = SvgRasterizer::with_fonts(fonts::empty_fonts());
        let image = rasterizer.rasterize(&staged(vec![]), &geometry).unwrap();
        assert_eq!((image.width(), image.height()), (200, 280));
        assert_eq!(image.nominal_size, (100.0, 140.0));
    }

    #[test]
    fn test_compose_wraps_rescaled_blocks() {
        let mut block = black_block(0, 400.0);
        block.rescale_to_fit(400.0, 120.0);
        let page = staged(vec![Slot { y: 0.0, block }]);
        let svg = SvgRasterizer::with_fonts(fonts::empty_fonts()).compose(&page, &geometry());
        assert!(svg.contains("scale(0.3)"));
        assert!(svg.contains("clip-path=\"url(#page)\""));
        assert!(svg.contains("translate(10 10)"));
    }
}
