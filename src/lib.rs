//! # mdpress
//!
//! Markdown rendering and paginated PDF export.
//!
//! Markdown is laid out into visual blocks at a fixed width, packed greedily
//! into fixed-size virtual pages, each page is rasterized, and the page
//! images are assembled into a PDF with one image per page.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mdpress::convert_file;
//!
//! fn main() -> mdpress::Result<()> {
//!     let doc = convert_file("notes.md", "notes.pdf")?;
//!     println!("{} pages", doc.page_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **GFM rendering**: tables, strikethrough, task lists, footnotes
//! - **Diagrams**: SVG blocks built in, other languages via pluggable renderers
//! - **Greedy pagination**: oversized blocks are rescaled to fit one page
//! - **Raster export**: resvg capture, Flate-compressed PDF pages
//! - **Parallel layout**: uses Rayon for per-block layout

pub mod detect;
pub mod error;
pub mod export;
pub mod model;
pub mod parser;
pub mod render;

// Re-export commonly used types
pub use error::{Error, Result};
pub use export::{
    DocumentAssembler, EventLog, ExportEvent, ExportObserver, ExportOptions, Exporter,
    PdfAssembler, Rasterizer, SvgRasterizer, Surface,
};
pub use model::{
    BlockKind, Document, Element, Metadata, Page, PageGeometry, PageSummary, PaperSize,
    RasterImage, VisualBlock,
};
pub use parser::{HtmlMode, ParseOptions};
pub use render::{DiagramRenderer, RenderOptions, RenderedTree, Renderer, Theme};

use render::fonts;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Identifier the convenience functions mount Markdown under.
pub const PREVIEW_ID: &str = "markdown-preview-content";

/// Convert a Markdown file to a PDF written to `output`.
///
/// Relative image paths resolve against the input file's directory.
///
/// # Example
///
/// ```no_run
/// use mdpress::convert_file;
///
/// let doc = convert_file("README.md", "README.pdf").unwrap();
/// assert!(doc.page_count >= 1);
/// ```
pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<Document> {
    Mdpress::new().convert_file(input, output)
}

/// Convert Markdown text to a PDF written to `output`.
///
/// # Example
///
/// ```no_run
/// use mdpress::convert_str;
///
/// let doc = convert_str("# Hello\n\nWorld", "hello").unwrap();
/// assert_eq!(doc.path.as_deref(), Some(std::path::Path::new("hello.pdf")));
/// ```
pub fn convert_str<Q: AsRef<Path>>(markdown: &str, output: Q) -> Result<Document> {
    Mdpress::new().convert_str(markdown, output)
}

/// Builder for rendering and exporting Markdown documents.
///
/// # Example
///
/// ```no_run
/// use mdpress::{Mdpress, PaperSize};
///
/// let doc = Mdpress::new()
///     .with_paper(PaperSize::LETTER)
///     .with_title("Release Notes")
///     .with_system_fonts()
///     .convert_file("CHANGELOG.md", "out/changelog.pdf")?;
/// # Ok::<(), mdpress::Error>(())
/// ```
#[derive(Clone)]
pub struct Mdpress {
    paper: PaperSize,
    page_width: f32,
    padding: f32,
    oversample: f32,
    metadata: Metadata,
    render_options: RenderOptions,
    pages_dir: Option<PathBuf>,
    observer: Option<Arc<dyn ExportObserver>>,
    rasterizer: Option<Arc<dyn Rasterizer>>,
}

impl std::fmt::Debug for Mdpress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mdpress")
            .field("paper", &self.paper)
            .field("page_width", &self.page_width)
            .field("padding", &self.padding)
            .field("oversample", &self.oversample)
            .field("metadata", &self.metadata)
            .field("render_options", &self.render_options)
            .finish()
    }
}

impl Mdpress {
    /// Create a new builder with the default A4 page.
    pub fn new() -> Self {
        Self {
            paper: PaperSize::A4,
            page_width: PageGeometry::DEFAULT_WIDTH,
            padding: PageGeometry::DEFAULT_PADDING,
            oversample: PageGeometry::DEFAULT_OVERSAMPLE,
            metadata: Metadata::default(),
            render_options: RenderOptions::default(),
            pages_dir: None,
            observer: None,
            rasterizer: None,
        }
    }

    /// Set the paper format.
    pub fn with_paper(mut self, paper: PaperSize) -> Self {
        self.paper = paper;
        self
    }

    /// Set the virtual page width in pixels.
    pub fn with_page_width(mut self, width: f32) -> Self {
        self.page_width = width;
        self
    }

    /// Set the page padding in pixels.
    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }

    /// Set the capture oversampling factor.
    pub fn with_oversample(mut self, factor: f32) -> Self {
        self.oversample = factor;
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

    /// Replace the render options.
    ///
    /// The layout width is always taken from the page geometry.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    /// Register a renderer for a fenced diagram language.
    pub fn with_diagram_renderer(
        mut self,
        language: &str,
        renderer: impl DiagramRenderer + 'static,
    ) -> Self {
        self.render_options = self.render_options.with_diagram_renderer(language, renderer);
        self
    }

    /// Measure and draw text with installed system fonts.
    pub fn with_system_fonts(mut self) -> Self {
        self.render_options = self.render_options.with_system_fonts();
        self
    }

    /// Load additional fonts from `dir`.
    ///
    /// Text measurement only sees directories added before
    /// [`Mdpress::with_system_fonts`]; page capture always sees all of them.
    pub fn with_font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.render_options = self.render_options.with_font_dir(dir);
        self
    }

    /// Disable parallel block layout.
    pub fn sequential(mut self) -> Self {
        self.render_options = self.render_options.sequential();
        self
    }

    /// Also write each captured page as PNG into `dir`.
    pub fn with_pages_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.pages_dir = Some(dir.into());
        self
    }

    /// Report export progress to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn ExportObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Replace the page rasterizer.
    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    /// Page geometry described by this builder.
    pub fn geometry(&self) -> Result<PageGeometry> {
        PageGeometry::new(self.paper, self.page_width, self.padding, self.oversample)
    }

    /// Convert a Markdown file to a PDF written to `output`.
    pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
    ) -> Result<Document> {
        let (surface, exporter) = self.pipeline_for(Some(input.as_ref()))?;
        surface.render_file(PREVIEW_ID, input)?;
        exporter.export(&surface, PREVIEW_ID, output)
    }

    /// Convert Markdown text to a PDF written to `output`.
    pub fn convert_str<Q: AsRef<Path>>(&self, markdown: &str, output: Q) -> Result<Document> {
        let (surface, exporter) = self.pipeline_for(None)?;
        surface.render_markdown(PREVIEW_ID, markdown);
        exporter.export(&surface, PREVIEW_ID, output)
    }

    /// Convert Markdown text to an in-memory PDF.
    pub fn render_str(&self, markdown: &str) -> Result<Document> {
        let (surface, exporter) = self.pipeline_for(None)?;
        surface.render_markdown(PREVIEW_ID, markdown);
        exporter.export_document(&surface, PREVIEW_ID)
    }

    /// Pagination plan for Markdown text.
    pub fn plan_str(&self, markdown: &str) -> Result<Vec<PageSummary>> {
        let (surface, exporter) = self.pipeline_for(None)?;
        surface.render_markdown(PREVIEW_ID, markdown);
        exporter.plan(&surface, PREVIEW_ID)
    }

    /// Pagination plan for a Markdown file.
    pub fn plan_file<P: AsRef<Path>>(&self, input: P) -> Result<Vec<PageSummary>> {
        let (surface, exporter) = self.pipeline_for(Some(input.as_ref()))?;
        surface.render_file(PREVIEW_ID, input)?;
        exporter.plan(&surface, PREVIEW_ID)
    }

    /// Build a surface and exporter for this configuration.
    ///
    /// When `input` is given and no base directory is set, relative image
    /// paths resolve against the input's directory.
    pub fn pipeline_for(&self, input: Option<&Path>) -> Result<(Surface, Exporter)> {
        let geometry = self.geometry()?;
        let mut render_options = self.render_options.clone().for_geometry(&geometry);
        if render_options.base_dir.is_none() {
            if let Some(parent) = input.and_then(Path::parent) {
                render_options = render_options.with_base_dir(parent);
            }
        }

        let rasterizer: Arc<dyn Rasterizer> = match &self.rasterizer {
            Some(r) => Arc::clone(r),
            None => Arc::new(SvgRasterizer::with_fonts(fonts::load_fonts(
                &render_options.font_dirs,
            ))),
        };

        let export_options = ExportOptions {
            geometry,
            metadata: self.metadata.clone(),
            pages_dir: self.pages_dir.clone(),
        };
        let mut exporter = Exporter::new(export_options).with_rasterizer(rasterizer);
        if let Some(observer) = &self.observer {
            exporter = exporter.with_observer(Arc::clone(observer));
        }

        Ok((Surface::new(render_options), exporter))
    }
}

impl Default for Mdpress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = Mdpress::default();
        assert_eq!(builder.geometry().unwrap(), PageGeometry::default());
        assert!(builder.metadata.title.is_none());
    }

    #[test]
    fn test_builder_invalid_geometry() {
        let err = Mdpress::new().with_padding(500.0).render_str("x").unwrap_err();
        assert!(matches!(err, Error::InvalidGeometry(_)));
    }

    #[test]
    fn test_pipeline_uses_usable_width() {
        let (surface, exporter) = Mdpress::new()
            .with_page_width(600.0)
            .with_padding(50.0)
            .pipeline_for(None)
            .unwrap();
        assert_eq!(surface.renderer().options().width, 500.0);
        assert_eq!(exporter.options().geometry.usable_width(), 500.0);
    }

    #[test]
    fn test_pipeline_base_dir_from_input() {
        let (surface, _) = Mdpress::new()
            .pipeline_for(Some(Path::new("docs/guide.md")))
            .unwrap();
        assert_eq!(
            surface.renderer().options().base_dir.as_deref(),
            Some(Path::new("docs"))
        );
    }

    #[test]
    fn test_plan_str_pages() {
        let markdown = (0..40)
            .map(|i| format!("Paragraph number {i} with a few words of text."))
            .collect::<Vec<_>>()
            .join("\n\n");
        let plan = Mdpress::new().plan_str(&markdown).unwrap();
        assert!(plan.len() > 1);
        let positions: Vec<usize> = plan
            .iter()
            .flat_map(|p| p.blocks.iter().map(|b| b.position))
            .collect();
        assert_eq!(positions, (0..40).collect::<Vec<_>>());
    }

    #[test]
    fn test_version_set() {
        assert!(!VERSION.is_empty());
    }
}
