//! Diagram renderers for fenced diagram blocks.
//!
//! A diagram language maps to a [`DiagramRenderer`] that turns source text
//! into SVG markup. `svg` is built in; other languages such as `mermaid`
//! need a renderer supplied by the host, otherwise the block renders as a
//! failure panel.

use super::fonts;
use crate::error::{Error, Result};
use crate::model::Embedded;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Converts diagram source into SVG markup.
pub trait DiagramRenderer: Send + Sync {
    /// Render `source` to a standalone SVG document.
    fn render(&self, source: &str) -> Result<String>;
}

impl<F> DiagramRenderer for F
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    fn render(&self, source: &str) -> Result<String> {
        self(source)
    }
}

/// Passthrough renderer for inline SVG.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgDiagram;

impl DiagramRenderer for SvgDiagram {
    fn render(&self, source: &str) -> Result<String> {
        let trimmed = source.trim();
        if !trimmed.contains("<svg") {
            return Err(Error::Diagram("source is not an <svg> document".into()));
        }
        Ok(trimmed.to_string())
    }
}

/// A rendered diagram with its intrinsic size.
#[derive(Debug, Clone)]
pub struct RenderedDiagram {
    /// SVG payload
    pub payload: Embedded,
    /// Intrinsic width in pixels
    pub width: f32,
    /// Intrinsic height in pixels
    pub height: f32,
}

/// Prepare the diagram subsystem.
///
/// Loads the shared font database used to parse diagram text. Idempotent;
/// only the first call in a process does any work.
pub fn ensure_initialized() {
    let _ = fonts::system_fonts();
}

/// Parse SVG markup and measure its intrinsic size.
pub fn probe_svg(svg: &str) -> Result<RenderedDiagram> {
    ensure_initialized();
    let db = fonts::system_fonts();
    let tree = usvg::Tree::from_str(svg, &usvg::Options::default(), &db)?;
    let size = tree.size();
    if size.width() <= 0.0 || size.height() <= 0.0 {
        return Err(Error::Diagram("diagram has an empty viewport".into()));
    }
    Ok(RenderedDiagram {
        payload: Embedded {
            mime: "image/svg+xml".to_string(),
            data: Arc::new(svg.as_bytes().to_vec()),
        },
        width: size.width(),
        height: size.height(),
    })
}

/// Diagram renderers keyed by lowercase language name.
#[derive(Clone)]
pub struct DiagramRegistry {
    renderers: HashMap<String, Arc<dyn DiagramRenderer>>,
}

impl DiagramRegistry {
    /// Registry with the built-in `svg` renderer.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("svg", SvgDiagram);
        registry
    }

    /// Registry without any renderer.
    pub fn empty() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }

    /// Register a renderer, replacing any previous one for `language`.
    pub fn register(&mut self, language: &str, renderer: impl DiagramRenderer + 'static) {
        self.renderers
            .insert(language.to_ascii_lowercase(), Arc::new(renderer));
    }

    /// Register a shared renderer.
    pub fn register_shared(&mut self, language: &str, renderer: Arc<dyn DiagramRenderer>) {
        self.renderers.insert(language.to_ascii_lowercase(), renderer);
    }

    /// Check if a renderer exists for `language`.
    pub fn supports(&self, language: &str) -> bool {
        self.renderers.contains_key(&language.to_ascii_lowercase())
    }

    /// Registered language names, sorted.
    pub fn languages(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.renderers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Render `source` in `language` and measure the result.
    pub fn render(&self, language: &str, source: &str) -> Result<RenderedDiagram> {
        let renderer = self
            .renderers
            .get(&language.to_ascii_lowercase())
            .ok_or_else(|| {
                Error::Diagram(format!("no renderer registered for '{language}'"))
            })?;
        let svg = renderer.render(source)?;
        probe_svg(&svg)
    }
}

impl Default for DiagramRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DiagramRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagramRegistry")
            .field("languages", &self.languages())
            .finish()
    }
}
