//! Captured page bitmaps.

use image::RgbImage;

/// An opaque RGB capture of one virtual page.
#[derive(Debug, Clone)]
pub struct RasterImage {
    /// 1-indexed page number the image was captured from
    pub page: u32,

    /// Nominal page size in CSS pixels, before oversampling
    pub nominal_size: (f32, f32),

    /// Oversampling factor used for the capture
    pub oversample: f32,

    pixels: RgbImage,
}

impl RasterImage {
    /// Wrap a captured bitmap.
    pub fn new(page: u32, pixels: RgbImage, nominal_size: (f32, f32), oversample: f32) -> Self {
        Self {
            page,
            nominal_size,
            oversample,
            pixels,
        }
    }

    /// Bitmap width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Bitmap height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Check if the bitmap has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Borrow the bitmap.
    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    /// Raw interleaved RGB samples.
    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Take the bitmap.
    pub fn into_pixels(self) -> RgbImage {
        self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions() {
        let img = RasterImage::new(1, RgbImage::new(4, 6), (2.0, 3.0), 2.0);
        assert_eq!(img.width(), 4);
        assert_eq!(img.height(), 6);
        assert_eq!(img.as_raw().len(), 4 * 6 * 3);
        assert!(!img.is_empty());
        assert!(RasterImage::new(1, RgbImage::new(0, 0), (0.0, 0.0), 1.0).is_empty());
    }
}
