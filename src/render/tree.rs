//! Rendered visual trees.

use crate::model::{BlockKind, VisualBlock};
use std::collections::HashMap;

/// A fully laid-out document: top-level visual blocks in source order.
///
/// Every block is settled when the tree is built; diagram and image
/// rendering complete during layout, so the tree never changes size after
/// construction.
#[derive(Debug, Clone, Default)]
pub struct RenderedTree {
    blocks: Vec<VisualBlock>,
    width: f32,
}

impl RenderedTree {
    /// Build a tree from blocks laid out at `width`.
    pub fn new(blocks: Vec<VisualBlock>, width: f32) -> Self {
        Self { blocks, width }
    }

    /// Blocks in source order.
    pub fn blocks(&self) -> &[VisualBlock] {
        &self.blocks
    }

    /// Width the blocks were laid out at.
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Number of top-level blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Check if the tree has no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Sum of natural block heights.
    pub fn total_height(&self) -> f32 {
        self.blocks.iter().map(|b| b.height).sum()
    }

    /// Count blocks per kind.
    pub fn kind_counts(&self) -> HashMap<BlockKind, usize> {
        let mut counts = HashMap::new();
        for block in &self.blocks {
            *counts.entry(block.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Take the blocks.
    pub fn into_blocks(self) -> Vec<VisualBlock> {
        self.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals() {
        let tree = RenderedTree::new(
            vec![
                VisualBlock::sized(0, 720.0, 100.0),
                VisualBlock::sized(1, 720.0, 50.5),
            ],
            720.0,
        );
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.total_height(), 150.5);
        assert_eq!(tree.kind_counts()[&BlockKind::Paragraph], 2);
        assert!(RenderedTree::default().is_empty());
    }
}
