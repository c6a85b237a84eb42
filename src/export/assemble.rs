//! PDF assembly from captured page images.
//!
//! Each captured image becomes one page whose media box is the paper size in
//! points; the image is stretched to fill it. Pages are appended in the
//! order images arrive.

use crate::error::{Error, Result};
use crate::model::{Document, Metadata, PageGeometry, RasterImage};
use chrono::{Datelike, Timelike};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use pdf_writer::{Content, Date, Filter, Name, Pdf, Rect, Ref, TextStr};
use std::io::Write;

const IMAGE_NAME: Name<'static> = Name(b"Im0");

/// Builds a document one page image at a time.
pub trait PageSink: Send {
    /// Append `image` as the next page.
    fn append(&mut self, image: RasterImage) -> Result<()>;

    /// Pages appended so far.
    fn page_count(&self) -> u32;

    /// Finalize the document.
    fn finish(self: Box<Self>) -> Result<Document>;
}

/// Creates page sinks for a geometry.
pub trait DocumentAssembler: Send + Sync {
    /// Start a new document.
    fn begin(&self, geometry: &PageGeometry, metadata: &Metadata) -> Box<dyn PageSink>;

    /// Assemble a complete image list in order.
    fn assemble(
        &self,
        images: Vec<RasterImage>,
        geometry: &PageGeometry,
        metadata: &Metadata,
    ) -> Result<Document> {
        let mut sink = self.begin(geometry, metadata);
        for image in images {
            sink.append(image)?;
        }
        sink.finish()
    }
}

/// Image-per-page PDF writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfAssembler {
    compression: Option<u32>,
}

impl PdfAssembler {
    /// Create an assembler with default Flate compression.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the Flate compression level (0-9).
    pub fn with_compression(mut self, level: u32) -> Self {
        self.compression = Some(level.min(9));
        self
    }

    fn level(&self) -> Compression {
        self.compression
            .map(Compression::new)
            .unwrap_or_default()
    }
}

impl DocumentAssembler for PdfAssembler {
    fn begin(&self, geometry: &PageGeometry, metadata: &Metadata) -> Box<dyn PageSink> {
        Box::new(PdfSink::new(geometry, metadata.clone(), self.level()))
    }
}

struct PdfSink {
    pdf: Pdf,
    catalog: Ref,
    tree: Ref,
    next: i32,
    pages: Vec<Ref>,
    size: (f32, f32),
    metadata: Metadata,
    level: Compression,
}

impl PdfSink {
    fn new(geometry: &PageGeometry, metadata: Metadata, level: Compression) -> Self {
        Self {
            pdf: Pdf::new(),
            catalog: Ref::new(1),
            tree: Ref::new(2),
            next: 3,
            pages: Vec::new(),
            size: geometry.paper().size_in_points(),
            metadata,
            level,
        }
    }

    fn alloc(&mut self) -> Ref {
        let id = Ref::new(self.next);
        self.next += 1;
        id
    }

    fn deflate(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::new(), self.level);
        encoder
            .write_all(data)
            .and_then(|_| encoder.finish())
            .map_err(|e| Error::AssemblyFailure(format!("compression failed: {e}")))
    }

    fn write_info(&mut self) {
        let id = self.alloc();
        let meta = &self.metadata;
        let mut info = self.pdf.document_info(id);
        if let Some(title) = &meta.title {
            info.title(TextStr(title.as_str()));
        }
        if let Some(author) = &meta.author {
            info.author(TextStr(author.as_str()));
        }
        if let Some(subject) = &meta.subject {
            info.subject(TextStr(subject.as_str()));
        }
        if let Some(creator) = &meta.creator {
            info.creator(TextStr(creator.as_str()));
        }
        if let Some(producer) = &meta.producer {
            info.producer(TextStr(producer.as_str()));
        }
        if let Some(created) = meta.created {
            let year = created.year().clamp(0, 9999) as u16;
            info.creation_date(
                Date::new(year)
                    .month(created.month() as u8)
                    .day(created.day() as u8)
                    .hour(created.hour() as u8)
                    .minute(created.minute() as u8)
                    .second(created.second() as u8)
                    .utc_offset_hour(0)
                    .utc_offset_minute(0),
            );
        }
    }
}

impl PageSink for PdfSink {
    fn append(&mut self, image: RasterImage) -> Result<()> {
        if image.is_empty() {
            return Err(Error::AssemblyFailure(format!(
                "page {} image is empty",
                image.page
            )));
        }

        let image_id = self.alloc();
        let content_id = self.alloc();
        let page_id = self.alloc();
        let (width, height) = (image.width(), image.height());
        let data = self.deflate(image.as_raw())?;
        drop(image);

        {
            let mut xobject = self.pdf.image_xobject(image_id, &data);
            xobject.filter(Filter::FlateDecode);
            xobject.width(width as i32);
            xobject.height(height as i32);
            xobject.color_space().device_rgb();
            xobject.bits_per_component(8);
        }

        let (pt_w, pt_h) = self.size;
        let mut content = Content::new();
        content.save_state();
        content.transform([pt_w, 0.0, 0.0, pt_h, 0.0, 0.0]);
        content.x_object(IMAGE_NAME);
        content.restore_state();
        self.pdf.stream(content_id, &content.finish());

        {
            let mut page = self.pdf.page(page_id);
            page.media_box(Rect::new(0.0, 0.0, pt_w, pt_h));
            page.parent(self.tree);
            page.contents(content_id);
            page.resources().x_objects().pair(IMAGE_NAME, image_id);
        }

        self.pages.push(page_id);
        log::debug!(
            "appended page {} ({}x{} px, {} bytes compressed)",
            self.pages.len(),
            width,
            height,
            data.len()
        );
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn finish(mut self: Box<Self>) -> Result<Document> {
        if self.pages.is_empty() {
            return Err(Error::AssemblyFailure("no pages to assemble".into()));
        }

        self.pdf.catalog(self.catalog).pages(self.tree);
        let count = self.pages.len() as i32;
        self.pdf
            .pages(self.tree)
            .kids(self.pages.iter().copied())
            .count(count);
        self.write_info();

        let page_count = self.page_count();
        let PdfSink { pdf, metadata, .. } = *self;
        let bytes = pdf.finish();
        log::info!("assembled {} pages into {} bytes", page_count, bytes.len());
        Ok(Document::new(bytes, page_count, metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use image::{Rgb, RgbImage};

    fn image(page: u32, w: u32, h: u32) -> RasterImage {
        RasterImage::new(page, RgbImage::from_pixel(w, h, Rgb([255, 255, 255])), (w as f32, h as f32), 1.0)
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn test_one_page_per_image() {
        let geometry = PageGeometry::default();
        let doc = PdfAssembler::new()
            .assemble(
                vec![image(1, 16, 22), image(2, 16, 22), image(3, 16, 22)],
                &geometry,
                &Metadata::default(),
            )
            .unwrap();

        assert_eq!(doc.page_count, 3);
        let bytes = doc.as_bytes();
        assert!(bytes.starts_with(b"%PDF-"));
        assert_eq!(count(bytes, b"/Type /Page\n"), 3);
        assert_eq!(count(bytes, b"/Subtype /Image"), 3);
        assert_eq!(count(bytes, b"/MediaBox"), 3);
    }

    #[test]
    fn test_empty_list_fails() {
        let err = PdfAssembler::new()
            .assemble(vec![], &PageGeometry::default(), &Metadata::default())
            .unwrap_err();
        assert!(matches!(err, Error::AssemblyFailure(_)));
    }

    #[test]
    fn test_zero_sized_image_fails() {
        let err = PdfAssembler::new()
            .assemble(
                vec![image(1, 0, 0)],
                &PageGeometry::default(),
                &Metadata::default(),
            )
            .unwrap_err();
        assert!(err.to_string().contains("page 1"));
    }

    #[test]
    fn test_metadata_written() {
        let metadata = Metadata {
            title: Some("Weekly Notes".into()),
            author: Some("Docs Team".into()),
            created: Some(chrono::Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap()),
            ..Default::default()
        };
        let doc = PdfAssembler::new()
            .with_compression(1)
            .assemble(vec![image(1, 4, 4)], &PageGeometry::default(), &metadata)
            .unwrap();

        let bytes = doc.as_bytes();
        assert_eq!(count(bytes, b"(Weekly Notes)"), 1);
        assert_eq!(count(bytes, b"(Docs Team)"), 1);
        assert_eq!(count(bytes, b"D:20240309140500"), 1);
        assert_eq!(doc.metadata, metadata);
    }

    #[test]
    fn test_incremental_sink() {
        let mut sink = PdfAssembler::new().begin(&PageGeometry::default(), &Metadata::default());
        sink.append(image(1, 8, 8)).unwrap();
        sink.append(image(2, 8, 8)).unwrap();
        assert_eq!(sink.page_count(), 2);
        assert_eq!(sink.finish().unwrap().page_count, 2);
    }
}
