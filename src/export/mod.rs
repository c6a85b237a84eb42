//! Paginated export: pack, capture, assemble, emit.
//!
//! The [`Exporter`] resolves a rendered tree on a [`Surface`], mounts it into
//! a staging area at the page's usable width, packs the blocks into pages,
//! rasterizes each page strictly in order and appends it to the document.
//! The staging area is detached on every exit path.
//!
//! # Example
//!
//! ```no_run
//! use mdpress::export::{ExportOptions, Exporter, Surface};
//! use mdpress::render::RenderOptions;
//!
//! let surface = Surface::new(RenderOptions::new());
//! surface.render_markdown("notes", "# Notes\n\nHello.");
//!
//! let exporter = Exporter::new(ExportOptions::new().with_title("Notes"));
//! let doc = exporter.export(&surface, "notes", "out/notes")?;
//! println!("{} pages", doc.page_count);
//! # Ok::<(), mdpress::Error>(())
//! ```

mod assemble;
mod events;
pub mod packer;
mod raster;
mod stage;

pub use assemble::{DocumentAssembler, PageSink, PdfAssembler};
pub use events::{EventLog, ExportEvent, ExportObserver};
pub use packer::{pack, pack_with, Measure, NaturalHeight};
pub use raster::{Rasterizer, SvgRasterizer};
pub use stage::{Slot, StagedPage, StagingArea, StagingGuard, Surface};

use crate::error::{Error, Result};
use crate::model::{Document, Metadata, Page, PageGeometry, PageSummary, PaperSize, RasterImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Output name used when none is given.
pub const DEFAULT_OUTPUT_NAME: &str = "document.pdf";

/// Options for a paginated export.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Virtual page template
    pub geometry: PageGeometry,

    /// Document metadata; producer and creation date are filled in if unset
    pub metadata: Metadata,

    /// Directory to also write each captured page to as PNG
    pub pages_dir: Option<PathBuf>,
}

impl ExportOptions {
    /// Create new export options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page geometry.
    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Use `paper` at the current pixel width, padding and oversampling.
    pub fn with_paper(mut self, paper: PaperSize) -> Result<Self> {
        let g = self.geometry;
        self.geometry = PageGeometry::new(paper, g.width(), g.padding(), g.oversample())?;
        Ok(self)
    }

    /// Set the document metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Set the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.metadata.title = Some(title.into());
        self
    }

    /// Set the document author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.metadata.author = Some(author.into());
        self
    }

    /// Also write every captured page as a PNG into `dir`.
    pub fn with_pages_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.pages_dir = Some(dir.into());
        self
    }
}

/// Drives the export pipeline.
#[derive(Clone)]
pub struct Exporter {
    options: ExportOptions,
    rasterizer: Arc<dyn Rasterizer>,
    assembler: Arc<dyn DocumentAssembler>,
    observer: Option<Arc<dyn ExportObserver>>,
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("options", &self.options)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl Exporter {
    /// Create an exporter with the SVG rasterizer and PDF assembler.
    pub fn new(options: ExportOptions) -> Self {
        Self {
            options,
            rasterizer: Arc::new(SvgRasterizer::new()),
            assembler: Arc::new(PdfAssembler::new()),
            observer: None,
        }
    }

    /// Replace the page rasterizer.
    pub fn with_rasterizer(mut self, rasterizer: impl Rasterizer + 'static) -> Self {
        self.rasterizer = Arc::new(rasterizer);
        self
    }

    /// Replace the document assembler.
    pub fn with_assembler(mut self, assembler: impl DocumentAssembler + 'static) -> Self {
        self.assembler = Arc::new(assembler);
        self
    }

    /// Report progress to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn ExportObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Export options.
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Export the tree mounted under `source_id` and write it to `output`.
    ///
    /// `.pdf` is appended to `output` if missing; an empty name becomes
    /// [`DEFAULT_OUTPUT_NAME`].
    pub fn export(
        &self,
        surface: &Surface,
        source_id: &str,
        output: impl AsRef<Path>,
    ) -> Result<Document> {
        let mut document = self.export_document(surface, source_id)?;
        let path = output_path(output);
        document.save(&path)?;
        log::info!("wrote {} ({} bytes)", path.display(), document.len());
        self.notify(ExportEvent::Emitted { path: path.clone() });
        document.path = Some(path);
        Ok(document)
    }

    /// Export the tree mounted under `source_id` without writing it.
    pub fn export_document(&self, surface: &Surface, source_id: &str) -> Result<Document> {
        let staging = self.stage(surface, source_id)?;
        let geometry = &self.options.geometry;
        let total = staging.pages().len() as u32;

        let mut sink = self.assembler.begin(geometry, &self.metadata());
        for page in staging.pages() {
            let image = self.rasterizer.rasterize(page, geometry)?;
            self.captured(&image, total)?;
            sink.append(image)?;
        }
        let document = sink.finish()?;
        self.notify(ExportEvent::Assembled {
            bytes: document.len(),
        });
        Ok(document)
    }

    /// Export with each capture on tokio's blocking pool.
    ///
    /// Captures still run one at a time, in page order.
    #[cfg(feature = "async")]
    pub async fn export_async(
        &self,
        surface: &Surface,
        source_id: &str,
        output: impl AsRef<Path>,
    ) -> Result<Document> {
        let staging = self.stage(surface, source_id)?;
        let geometry = self.options.geometry;
        let total = staging.pages().len() as u32;

        let mut sink = self.assembler.begin(&geometry, &self.metadata());
        for page in staging.pages() {
            let number = page.number;
            let rasterizer = Arc::clone(&self.rasterizer);
            let page = page.clone();
            let image = tokio::task::spawn_blocking(move || rasterizer.rasterize(&page, &geometry))
                .await
                .map_err(|e| Error::capture(number, e.to_string()))??;
            self.captured(&image, total)?;
            sink.append(image)?;
        }
        let mut document = sink.finish()?;
        drop(staging);
        self.notify(ExportEvent::Assembled {
            bytes: document.len(),
        });

        let path = output_path(output);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&path, document.as_bytes()).await?;
        log::info!("wrote {} ({} bytes)", path.display(), document.len());
        self.notify(ExportEvent::Emitted { path: path.clone() });
        document.path = Some(path);
        Ok(document)
    }

    /// Pack the tree mounted under `source_id` without capturing it.
    pub fn paginate(&self, surface: &Surface, source_id: &str) -> Result<Vec<Page>> {
        let tree = resolve(surface, source_id)?;
        let mut staging = surface.attach_staging(self.options.geometry.usable_width());
        staging.mount(tree.blocks());
        let blocks = staging.take_mounted();
        Ok(pack_with(blocks, &self.options.geometry, &mut *staging))
    }

    /// Serializable pagination plan for the tree mounted under `source_id`.
    pub fn plan(&self, surface: &Surface, source_id: &str) -> Result<Vec<PageSummary>> {
        Ok(self
            .paginate(surface, source_id)?
            .iter()
            .map(Page::summary)
            .collect())
    }

    fn stage<'s>(&self, surface: &'s Surface, source_id: &str) -> Result<StagingGuard<'s>> {
        let tree = resolve(surface, source_id)?;
        let geometry = &self.options.geometry;
        let mut staging = surface.attach_staging(geometry.usable_width());
        self.notify(ExportEvent::Started {
            source: source_id.to_string(),
            blocks: tree.len(),
        });

        staging.mount(tree.blocks());
        let blocks = staging.take_mounted();
        let pages = pack_with(blocks, geometry, &mut *staging);
        let rescaled = pages
            .iter()
            .flat_map(|p| &p.blocks)
            .filter(|b| b.is_rescaled())
            .count();
        let count = pages.len() as u32;
        staging.materialize(pages);

        log::info!(
            "'{}': {} blocks packed into {} pages ({} rescaled)",
            source_id,
            tree.len(),
            count,
            rescaled
        );
        self.notify(ExportEvent::Packed {
            pages: count,
            rescaled,
        });
        Ok(staging)
    }

    fn captured(&self, image: &RasterImage, total: u32) -> Result<()> {
        if let Some(dir) = &self.options.pages_dir {
            save_page(dir, image)?;
        }
        self.notify(ExportEvent::PageCaptured {
            page: image.page,
            total,
        });
        Ok(())
    }

    fn metadata(&self) -> Metadata {
        self.options.metadata.clone().stamped()
    }

    fn notify(&self, event: ExportEvent) {
        if let Some(observer) = &self.observer {
            observer.on_event(&event);
        }
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(ExportOptions::default())
    }
}

/// Resolve the file an export named `name` is written to.
pub fn output_path(name: impl AsRef<Path>) -> PathBuf {
    let name = name.as_ref();
    if name.as_os_str().is_empty() {
        return PathBuf::from(DEFAULT_OUTPUT_NAME);
    }
    let is_pdf = name
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        name.to_path_buf()
    } else {
        let mut with_ext = name.as_os_str().to_os_string();
        with_ext.push(".pdf");
        PathBuf::from(with_ext)
    }
}

fn resolve(surface: &Surface, source_id: &str) -> Result<Arc<crate::render::RenderedTree>> {
    surface.tree(source_id).ok_or_else(|| {
        log::warn!("no tree mounted under '{}'", source_id);
        Error::SourceNotFound(source_id.to_string())
    })
}

fn save_page(dir: &Path, image: &RasterImage) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("page-{:03}.png", image.page));
    image.pixels().save(&path)?;
    log::debug!("saved {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::fonts;

    #[test]
    fn test_output_path() {
        assert_eq!(output_path(""), PathBuf::from("document.pdf"));
        assert_eq!(output_path("report"), PathBuf::from("report.pdf"));
        assert_eq!(output_path("report.PDF"), PathBuf::from("report.PDF"));
        assert_eq!(output_path("a/b.md"), PathBuf::from("a/b.md.pdf"));
    }

    #[test]
    fn test_with_paper_keeps_width() {
        let options = ExportOptions::new().with_paper(PaperSize::LETTER).unwrap();
        assert_eq!(options.geometry.width(), 800.0);
        assert_eq!(options.geometry.height(), 1035.0);
    }

    #[test]
    fn test_missing_source_creates_no_staging() {
        let surface = Surface::default();
        let log = Arc::new(EventLog::new());
        let exporter = Exporter::default().with_observer(log.clone());

        let err = exporter.export_document(&surface, "nope").unwrap_err();
        assert!(matches!(err, Error::SourceNotFound(ref id) if id == "nope"));
        assert_eq!(surface.staging_count(), 0);
        assert!(log.events().is_empty());
    }

    #[test]
    fn test_export_document_events() {
        let surface = Surface::default();
        surface.render_markdown("doc", "# Title\n\nSome text.");
        let log = Arc::new(EventLog::new());
        let exporter = Exporter::default()
            .with_rasterizer(SvgRasterizer::with_fonts(fonts::empty_fonts()))
            .with_observer(log.clone());

        let doc = exporter.export_document(&surface, "doc").unwrap();
        assert_eq!(doc.page_count, 1);
        assert!(doc.path.is_none());
        assert_eq!(surface.staging_count(), 0);

        let events = log.events();
        assert!(matches!(events[0], ExportEvent::Started { blocks: 2, .. }));
        assert!(matches!(events[1], ExportEvent::Packed { pages: 1, rescaled: 0 }));
        assert_eq!(log.captured_pages(), vec![1]);
        assert!(matches!(events.last(), Some(ExportEvent::Assembled { .. })));
    }
}
