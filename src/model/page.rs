//! Page-level types.

use super::block::{BlockKind, VisualBlock};
use serde::{Deserialize, Serialize};

/// A packed page: the blocks assigned to one virtual page.
#[derive(Debug, Clone)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,

    /// Blocks on the page, in source order
    pub blocks: Vec<VisualBlock>,

    /// Accumulated occupied height in pixels
    pub used_height: f32,
}

impl Page {
    /// Create a new empty page.
    pub fn new(number: u32) -> Self {
        Self {
            number,
            blocks: Vec::new(),
            used_height: 0.0,
        }
    }

    /// Commit a block occupying `height` pixels.
    pub fn commit(&mut self, block: VisualBlock, height: f32) {
        self.used_height += height;
        self.blocks.push(block);
    }

    /// Commit a rescaled block; the page is full afterwards.
    pub fn commit_pinned(&mut self, block: VisualBlock, usable_height: f32) {
        self.used_height = usable_height;
        self.blocks.push(block);
    }

    /// Check if the page holds no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Get the number of blocks on the page.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Space left below the last block.
    pub fn remaining(&self, usable_height: f32) -> f32 {
        (usable_height - self.used_height).max(0.0)
    }

    /// Check if any block on the page was rescaled.
    pub fn has_rescaled_block(&self) -> bool {
        self.blocks.iter().any(VisualBlock::is_rescaled)
    }

    /// Serializable summary of this page.
    pub fn summary(&self) -> PageSummary {
        PageSummary {
            number: self.number,
            used_height: self.used_height,
            blocks: self
                .blocks
                .iter()
                .map(|b| BlockSummary {
                    position: b.position,
                    kind: b.kind,
                    height: b.height,
                    scale: b.scale(),
                })
                .collect(),
        }
    }
}

/// Serializable view of a packed page, used for pagination plans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSummary {
    /// Page number (1-indexed)
    pub number: u32,
    /// Occupied height in pixels
    pub used_height: f32,
    /// Blocks on the page
    pub blocks: Vec<BlockSummary>,
}

/// Serializable view of a block placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSummary {
    /// Source position
    pub position: usize,
    /// Block kind
    pub kind: BlockKind,
    /// Natural height
    pub height: f32,
    /// Applied scale factor
    pub scale: f32,
}
