//! Rendering options and configuration.

use super::diagram::{DiagramRegistry, DiagramRenderer};
use super::fonts;
use super::text::{FontMeasurer, HeuristicMeasurer, TextMeasurer};
use super::theme::Theme;
use crate::model::PageGeometry;
use crate::parser::ParseOptions;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Options for laying out Markdown into visual blocks.
#[derive(Clone)]
pub struct RenderOptions {
    /// Layout width in pixels
    pub width: f32,

    /// Visual theme
    pub theme: Theme,

    /// Markdown parsing options
    pub parse: ParseOptions,

    /// Lay out blocks in parallel
    pub parallel: bool,

    /// Directory relative image paths resolve against
    pub base_dir: Option<PathBuf>,

    /// Diagram renderers by language
    pub diagrams: DiagramRegistry,

    /// Text measurement backend
    pub measurer: Arc<dyn TextMeasurer>,

    /// Extra font directories
    pub font_dirs: Vec<PathBuf>,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the layout width.
    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    /// Match the layout width to a page geometry's usable width.
    pub fn for_geometry(mut self, geometry: &PageGeometry) -> Self {
        self.width = geometry.usable_width();
        self
    }

    /// Set the theme.
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Set Markdown parsing options.
    pub fn with_parse_options(mut self, parse: ParseOptions) -> Self {
        self.parse = parse;
        self
    }

    /// Enable or disable parallel layout.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel layout.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set the base directory for relative image paths.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Register a diagram renderer for `language`.
    ///
    /// The language is also registered with the parser so fenced blocks in
    /// it become diagrams.
    pub fn with_diagram_renderer(
        mut self,
        language: &str,
        renderer: impl DiagramRenderer + 'static,
    ) -> Self {
        self.diagrams.register(language, renderer);
        self.parse = self.parse.with_diagram_language(language);
        self
    }

    /// Set the text measurer.
    pub fn with_measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        self.measurer = measurer;
        self
    }

    /// Add a font directory.
    pub fn with_font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.font_dirs.push(dir.into());
        self
    }

    /// Measure text with real font metrics from system fonts and the
    /// configured font directories.
    pub fn with_system_fonts(mut self) -> Self {
        self.measurer = Arc::new(FontMeasurer::new(fonts::load_fonts(&self.font_dirs)));
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: PageGeometry::default().usable_width(),
            theme: Theme::default(),
            parse: ParseOptions::default(),
            parallel: true,
            base_dir: None,
            diagrams: DiagramRegistry::new(),
            measurer: Arc::new(HeuristicMeasurer),
            font_dirs: Vec::new(),
        }
    }
}

impl fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderOptions")
            .field("width", &self.width)
            .field("theme", &self.theme)
            .field("parse", &self.parse)
            .field("parallel", &self.parallel)
            .field("base_dir", &self.base_dir)
            .field("diagrams", &self.diagrams)
            .field("font_dirs", &self.font_dirs)
            .finish_non_exhaustive()
    }
}
