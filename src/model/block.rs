//! Visual blocks: laid-out, measurable units of rendered content.

use super::element::Element;
use super::fragment::Fragment;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Kind of content a visual block renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// Heading
    Heading,
    /// Paragraph
    Paragraph,
    /// List
    List,
    /// Code block
    CodeBlock,
    /// Diagram panel
    Diagram,
    /// Table
    Table,
    /// Block quote
    BlockQuote,
    /// Standalone image
    Image,
    /// Horizontal rule
    Rule,
    /// Raw HTML shown verbatim
    Html,
}

impl From<&Element> for BlockKind {
    fn from(element: &Element) -> Self {
        match element {
            Element::Heading { .. } => BlockKind::Heading,
            Element::Paragraph { .. } => BlockKind::Paragraph,
            Element::List(_) => BlockKind::List,
            Element::CodeBlock { .. } => BlockKind::CodeBlock,
            Element::Diagram { .. } => BlockKind::Diagram,
            Element::Table(_) => BlockKind::Table,
            Element::BlockQuote { .. } => BlockKind::BlockQuote,
            Element::Image { .. } => BlockKind::Image,
            Element::Rule => BlockKind::Rule,
            Element::Html { .. } => BlockKind::Html,
        }
    }
}

/// A single renderable unit laid out at a fixed width.
///
/// `height` is the natural height measured at `width`, including the
/// block's bottom margin. The packer never changes it; oversized blocks are
/// shrunk through [`VisualBlock::rescale_to_fit`], which records a uniform
/// scale factor and pins the occupied height.
#[derive(Debug, Clone)]
pub struct VisualBlock {
    /// Position in source order (0-indexed)
    pub position: usize,

    /// Content kind
    pub kind: BlockKind,

    /// Width the block was laid out at
    pub width: f32,

    /// Natural height at `width`
    pub height: f32,

    /// Display list, relative to the block's top-left corner
    pub fragment: Fragment,

    /// Source element, used to re-mount the block at another width
    pub source: Option<Arc<Element>>,

    scale: f32,
    pinned_height: Option<f32>,
}

impl VisualBlock {
    /// Create a block from a laid-out fragment.
    pub fn new(position: usize, kind: BlockKind, width: f32, height: f32, fragment: Fragment) -> Self {
        Self {
            position,
            kind,
            width,
            height,
            fragment,
            source: None,
            scale: 1.0,
            pinned_height: None,
        }
    }

    /// Create an empty block of the given size.
    pub fn sized(position: usize, width: f32, height: f32) -> Self {
        Self::new(position, BlockKind::Paragraph, width, height, Fragment::new())
    }

    /// Attach the source element.
    pub fn with_source(mut self, source: Arc<Element>) -> Self {
        self.source = Some(source);
        self
    }

    /// Uniform scale factor applied when drawing (1.0 unless rescaled).
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Check if rescale-to-fit was applied.
    pub fn is_rescaled(&self) -> bool {
        self.pinned_height.is_some()
    }

    /// Height the block occupies on its page.
    pub fn effective_height(&self) -> f32 {
        self.pinned_height.unwrap_or(self.height)
    }

    /// Shrink the block so that `measured` becomes exactly `target`.
    ///
    /// The scale is anchored at the top-left corner and the occupied height
    /// is pinned to `target`.
    pub fn rescale_to_fit(&mut self, measured: f32, target: f32) {
        self.scale = if measured > 0.0 { target / measured } else { 1.0 };
        self.pinned_height = Some(target);
    }

    /// Drop any rescale directive.
    pub fn reset_scale(&mut self) {
        self.scale = 1.0;
        self.pinned_height = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rescale_to_fit_pins_height() {
        let mut block = VisualBlock::sized(0, 720.0, 800.0);
        assert!(!block.is_rescaled());
        assert_eq!(block.effective_height(), 800.0);

        block.rescale_to_fit(800.0, 700.0);
        assert!(block.is_rescaled());
        assert_eq!(block.scale(), 0.875);
        assert_eq!(block.effective_height(), 700.0);
        assert_eq!(block.height, 800.0);

        block.reset_scale();
        assert_eq!(block.scale(), 1.0);
        assert_eq!(block.effective_height(), 800.0);
    }

    #[test]
    fn test_kind_from_element() {
        assert_eq!(BlockKind::from(&Element::Rule), BlockKind::Rule);
        assert_eq!(
            BlockKind::from(&Element::heading("x", 2)),
            BlockKind::Heading
        );
    }
}
