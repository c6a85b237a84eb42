//! Greedy page packer.
//!
//! Blocks are placed in source order. A block that does not fit on the
//! current page opens a new one; a block taller than a whole page is shrunk
//! with [`VisualBlock::rescale_to_fit`] so its occupied height equals the
//! usable height exactly. Equality counts as fitting.

use crate::model::{Page, PageGeometry, VisualBlock};

/// Measures a block once it is mounted for capture.
pub trait Measure {
    /// Height in pixels `block` occupies when laid out alone.
    fn measure(&mut self, block: &VisualBlock, geometry: &PageGeometry) -> f32;
}

/// Uses each block's own natural height.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalHeight;

impl Measure for NaturalHeight {
    fn measure(&mut self, block: &VisualBlock, _geometry: &PageGeometry) -> f32 {
        block.height
    }
}

impl<F> Measure for F
where
    F: FnMut(&VisualBlock) -> f32,
{
    fn measure(&mut self, block: &VisualBlock, _geometry: &PageGeometry) -> f32 {
        self(block)
    }
}

/// Pack blocks by their natural heights.
pub fn pack<I>(blocks: I, geometry: &PageGeometry) -> Vec<Page>
where
    I: IntoIterator<Item = VisualBlock>,
{
    pack_with(blocks, geometry, &mut NaturalHeight)
}

/// Pack blocks, measuring each through `measure`.
///
/// Always returns at least one page; empty input yields one empty page.
pub fn pack_with<I, M>(blocks: I, geometry: &PageGeometry, measure: &mut M) -> Vec<Page>
where
    I: IntoIterator<Item = VisualBlock>,
    M: Measure + ?Sized,
{
    let usable = geometry.usable_height();
    let mut pages = Vec::new();
    let mut page = Page::new(1);

    for mut block in blocks {
        block.reset_scale();
        let height = sanitize(measure.measure(&block, geometry), &block);

        if page.used_height + height <= usable {
            page.commit(block, height);
        } else if !page.is_empty() {
            let next = Page::new(page.number + 1);
            let full = std::mem::replace(&mut page, next);
            log::debug!(
                "page {} closed with {} blocks ({:.1}px)",
                full.number,
                full.block_count(),
                full.used_height
            );
            pages.push(full);

            let height = sanitize(measure.measure(&block, geometry), &block);
            if height > usable {
                rescale(&mut page, block, height, usable);
            } else {
                page.commit(block, height);
            }
        } else {
            rescale(&mut page, block, height, usable);
        }
    }

    pages.push(page);
    log::debug!("packed into {} pages", pages.len());
    pages
}

fn rescale(page: &mut Page, mut block: VisualBlock, measured: f32, usable: f32) {
    block.rescale_to_fit(measured, usable);
    log::debug!(
        "block {} rescaled by {:.3} to fit page {}",
        block.position,
        block.scale(),
        page.number
    );
    page.commit_pinned(block, usable);
}

fn sanitize(height: f32, block: &VisualBlock) -> f32 {
    if height.is_finite() && height >= 0.0 {
        height
    } else {
        log::warn!(
            "block {} measured {} px; treating as 0",
            block.position,
            height
        );
        0.0
    }
}
