//! Visual block source: Markdown to laid-out visual blocks.
//!
//! Parsing and layout happen before export. Each top-level element becomes
//! one [`VisualBlock`] whose height includes the theme's block gap.

pub mod diagram;
pub mod fonts;
mod layout;
mod options;
pub mod svg;
pub mod text;
mod theme;
mod tree;

pub use diagram::{DiagramRegistry, DiagramRenderer, SvgDiagram};
pub use layout::{BlockLayout, DIAGRAM_FAILURE_LABEL};
pub use options::RenderOptions;
pub use text::{FontMeasurer, HeuristicMeasurer, TextMeasurer};
pub use theme::Theme;
pub use tree::RenderedTree;

use crate::detect;
use crate::error::Result;
use crate::model::{BlockKind, Element, VisualBlock};
use crate::parser::MarkdownParser;
use rayon::prelude::*;
use std::path::Path;
use std::sync::Arc;

/// Renders Markdown into [`RenderedTree`]s.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    options: RenderOptions,
}

impl Renderer {
    /// Create a renderer.
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Render options.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Parse Markdown into top-level elements.
    pub fn parse(&self, markdown: &str) -> Vec<Element> {
        let text = detect::normalize(markdown);
        MarkdownParser::new(self.options.parse.clone()).parse(&text)
    }

    /// Parse and lay out Markdown text.
    pub fn render(&self, markdown: &str) -> RenderedTree {
        self.render_elements(self.parse(markdown))
    }

    /// Read, parse and lay out a Markdown file.
    pub fn render_file(&self, path: impl AsRef<Path>) -> Result<RenderedTree> {
        let text = detect::read_markdown(path)?;
        Ok(self.render(&text))
    }

    /// Lay out parsed elements at the configured width.
    pub fn render_elements(&self, elements: Vec<Element>) -> RenderedTree {
        if elements.iter().any(Element::is_diagram) {
            diagram::ensure_initialized();
        }

        let width = self.options.width;
        let elements: Vec<Arc<Element>> = elements.into_iter().map(Arc::new).collect();
        let blocks: Vec<VisualBlock> = if self.options.parallel {
            elements
                .into_par_iter()
                .enumerate()
                .map(|(i, element)| self.layout_block(element, i, width))
                .collect()
        } else {
            elements
                .into_iter()
                .enumerate()
                .map(|(i, element)| self.layout_block(element, i, width))
                .collect()
        };

        log::debug!("rendered {} blocks at {}px", blocks.len(), width);
        RenderedTree::new(blocks, width)
    }

    /// Lay out one element as a block at `width`.
    ///
    /// The block's height is its content height plus the theme's block gap.
    pub fn layout_block(&self, element: Arc<Element>, position: usize, width: f32) -> VisualBlock {
        let opts = &self.options;
        let layout = BlockLayout::new(
            &opts.theme,
            opts.measurer.as_ref(),
            &opts.diagrams,
            opts.base_dir.as_deref(),
        );
        let (fragment, height) = layout.layout(&element, width);
        let kind = BlockKind::from(element.as_ref());
        VisualBlock::new(position, kind, width, height + opts.theme.block_gap, fragment)
            .with_source(element)
    }

    /// Lay out `block`'s source again at a new width.
    ///
    /// Blocks without a source element are returned with only their width
    /// updated.
    pub fn relayout(&self, block: &VisualBlock, width: f32) -> VisualBlock {
        match &block.source {
            Some(source) => self.layout_block(Arc::clone(source), block.position, width),
            None => {
                let mut copy = block.clone();
                copy.width = width;
                copy
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_preserves_order() {
        let md = "# One\n\nTwo\n\n- three\n\n---\n\n```\nfive\n```";
        let tree = Renderer::default().render(md);
        let kinds: Vec<_> = tree.blocks().iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BlockKind::Heading,
                BlockKind::Paragraph,
                BlockKind::List,
                BlockKind::Rule,
                BlockKind::CodeBlock
            ]
        );
        for (i, block) in tree.blocks().iter().enumerate() {
            assert_eq!(block.position, i);
            assert!(block.height > 16.0);
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let md = "para one\n\n## heading\n\n> quote\n\n| a | b |\n|---|---|\n| 1 | 2 |";
        let parallel = Renderer::new(RenderOptions::new()).render(md);
        let sequential = Renderer::new(RenderOptions::new().sequential()).render(md);
        let heights = |t: &RenderedTree| t.blocks().iter().map(|b| b.height).collect::<Vec<_>>();
        assert_eq!(heights(&parallel), heights(&sequential));
    }

    #[test]
    fn test_block_gap_added() {
        let tree = Renderer::default().render("---");
        assert_eq!(tree.blocks()[0].height, 32.0 + 16.0);
    }

    #[test]
    fn test_relayout_changes_width() {
        let renderer = Renderer::default();
        let tree = renderer.render(&"long paragraph text ".repeat(40));
        let block = &tree.blocks()[0];
        let narrow = renderer.relayout(block, 300.0);
        assert_eq!(narrow.width, 300.0);
        assert_eq!(narrow.position, block.position);
        assert!(narrow.height > block.height);
    }
}
