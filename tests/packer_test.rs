//! Integration tests for the page packer.

use mdpress::export::{pack, pack_with};
use mdpress::model::{Page, PageGeometry, PaperSize, VisualBlock};
use proptest::prelude::*;

fn geometry(usable: f32) -> PageGeometry {
    PageGeometry::with_height(PaperSize::A4, 800.0, usable, 0.0, 1.0).unwrap()
}

fn blocks(heights: &[f32]) -> Vec<VisualBlock> {
    heights
        .iter()
        .enumerate()
        .map(|(i, h)| VisualBlock::sized(i, 800.0, *h))
        .collect()
}

fn heights(pages: &[Page]) -> Vec<Vec<f32>> {
    pages
        .iter()
        .map(|p| p.blocks.iter().map(|b| b.height).collect())
        .collect()
}

#[test]
fn test_three_blocks_split_two_and_one() {
    let pages = pack(blocks(&[300.0, 300.0, 300.0]), &geometry(700.0));
    assert_eq!(heights(&pages), vec![vec![300.0, 300.0], vec![300.0]]);
    assert_eq!(pages[0].used_height, 600.0);
    assert_eq!(pages[1].used_height, 300.0);
}

#[test]
fn test_single_oversized_block_rescaled() {
    let pages = pack(blocks(&[800.0]), &geometry(700.0));
    assert_eq!(pages.len(), 1);
    let block = &pages[0].blocks[0];
    assert_eq!(block.scale(), 0.875);
    assert_eq!(block.effective_height(), 700.0);
    assert_eq!(pages[0].used_height, 700.0);
}

#[test]
fn test_two_large_blocks_each_own_page() {
    let pages = pack(blocks(&[400.0, 400.0]), &geometry(700.0));
    assert_eq!(heights(&pages), vec![vec![400.0], vec![400.0]]);
    assert!(pages.iter().all(|p| !p.has_rescaled_block()));
}

#[test]
fn test_empty_input_yields_one_empty_page() {
    let pages = pack(Vec::new(), &geometry(700.0));
    assert_eq!(pages.len(), 1);
    assert!(pages[0].is_empty());
    assert_eq!(pages[0].number, 1);
}

#[test]
fn test_default_geometry_usable_height() {
    let g = PageGeometry::default();
    let pages = pack(blocks(&[1051.0, 1052.0]), &g);
    assert_eq!(pages.len(), 2);
    assert!(!pages[0].blocks[0].is_rescaled());
    assert!(pages[1].blocks[0].is_rescaled());
}

#[test]
fn test_rescaled_page_takes_no_more_blocks() {
    let pages = pack(blocks(&[900.0, 1.0]), &geometry(700.0));
    assert_eq!(heights(&pages), vec![vec![900.0], vec![1.0]]);
}

#[test]
fn test_previous_scale_is_reset() {
    let mut block = VisualBlock::sized(0, 800.0, 100.0);
    block.rescale_to_fit(1000.0, 100.0);
    let pages = pack(vec![block], &geometry(700.0));
    assert_eq!(pages[0].blocks[0].scale(), 1.0);
}

#[test]
fn test_measure_closure_overrides_natural_height() {
    let mut measure = |b: &VisualBlock| b.height * 2.0;
    let pages = pack_with(blocks(&[200.0, 200.0]), &geometry(700.0), &mut measure);
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].used_height, 400.0);
}

#[test]
fn test_zero_height_blocks_join_rescaled_page() {
    let pages = pack(blocks(&[900.0, 0.0, f32::NAN, 10.0]), &geometry(700.0));
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].block_count(), 3);
    assert!(pages[0].blocks[0].is_rescaled());
    assert_eq!(pages[0].used_height, 700.0);
    assert_eq!(pages[1].block_count(), 1);
    assert_eq!(pages[1].blocks[0].position, 3);
}

proptest! {
    #[test]
    fn prop_order_and_count_preserved(hs in prop::collection::vec(0.0f32..2000.0, 0..40)) {
        let pages = pack(blocks(&hs), &geometry(700.0));
        let positions: Vec<usize> = pages
            .iter()
            .flat_map(|p| p.blocks.iter().map(|b| b.position))
            .collect();
        prop_assert_eq!(positions, (0..hs.len()).collect::<Vec<_>>());
    }

    #[test]
    fn prop_pages_never_overflow(hs in prop::collection::vec(0.0f32..2000.0, 0..40)) {
        let pages = pack(blocks(&hs), &geometry(700.0));
        prop_assert!(!pages.is_empty());
        for (i, page) in pages.iter().enumerate() {
            prop_assert_eq!(page.number as usize, i + 1);
            prop_assert!(page.used_height <= 700.0 + 1e-3);
            if page.has_rescaled_block() {
                // Only zero-height blocks still fit beside a rescaled one.
                let tall = page.blocks.iter().filter(|b| b.height > 0.0).count();
                prop_assert_eq!(tall, 1);
                prop_assert_eq!(page.used_height, 700.0);
            }
        }
    }

    #[test]
    fn prop_no_rescale_when_all_fit(hs in prop::collection::vec(0.0f32..=700.0, 1..30)) {
        let pages = pack(blocks(&hs), &geometry(700.0));
        prop_assert!(pages.iter().all(|p| !p.has_rescaled_block()));
    }

    #[test]
    fn prop_deterministic(hs in prop::collection::vec(0.0f32..2000.0, 0..30)) {
        let a = pack(blocks(&hs), &geometry(700.0));
        let b = pack(blocks(&hs), &geometry(700.0));
        prop_assert_eq!(heights(&a), heights(&b));
    }
}
