//! Live layout surface and staging areas.
//!
//! A [`Surface`] holds rendered trees by identifier. An export attaches a
//! [`StagingArea`] to it, mounts clones of a tree's blocks there at the
//! page's usable width, measures them, and captures pages from it. The
//! [`StagingGuard`] detaches the area when dropped, so staging never
//! outlives the export that created it.

use super::packer::Measure;
use crate::error::Result;
use crate::model::{Page, PageGeometry, VisualBlock};
use crate::render::{RenderOptions, RenderedTree, Renderer};
use std::collections::{BTreeSet, HashMap};
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

const WIDTH_TOLERANCE: f32 = 0.01;

/// Live layout tree: mounted rendered trees plus attached staging areas.
#[derive(Debug)]
pub struct Surface {
    renderer: Arc<Renderer>,
    trees: RwLock<HashMap<String, Arc<RenderedTree>>>,
    staging: Mutex<BTreeSet<u64>>,
    next_staging: AtomicU64,
}

impl Surface {
    /// Create a surface laying out Markdown with `options`.
    pub fn new(options: RenderOptions) -> Self {
        Self::with_renderer(Arc::new(Renderer::new(options)))
    }

    /// Create a surface sharing an existing renderer.
    pub fn with_renderer(renderer: Arc<Renderer>) -> Self {
        Self {
            renderer,
            trees: RwLock::new(HashMap::new()),
            staging: Mutex::new(BTreeSet::new()),
            next_staging: AtomicU64::new(1),
        }
    }

    /// Renderer used for Markdown and re-layout.
    pub fn renderer(&self) -> &Arc<Renderer> {
        &self.renderer
    }

    /// Render Markdown and mount it under `id`, replacing any previous tree.
    ///
    /// Returns the number of top-level blocks.
    pub fn render_markdown(&self, id: impl Into<String>, markdown: &str) -> usize {
        let tree = self.renderer.render(markdown);
        let blocks = tree.len();
        self.mount(id, tree);
        blocks
    }

    /// Read a Markdown file, render it and mount it under `id`.
    pub fn render_file(&self, id: impl Into<String>, path: impl AsRef<Path>) -> Result<usize> {
        let tree = self.renderer.render_file(path)?;
        let blocks = tree.len();
        self.mount(id, tree);
        Ok(blocks)
    }

    /// Mount a rendered tree under `id`.
    pub fn mount(&self, id: impl Into<String>, tree: RenderedTree) {
        let id = id.into();
        log::debug!("mounting '{}' with {} blocks", id, tree.len());
        self.trees_mut().insert(id, Arc::new(tree));
    }

    /// Remove the tree mounted under `id`.
    pub fn unmount(&self, id: &str) -> Option<Arc<RenderedTree>> {
        self.trees_mut().remove(id)
    }

    /// Tree mounted under `id`.
    pub fn tree(&self, id: &str) -> Option<Arc<RenderedTree>> {
        self.trees().get(id).cloned()
    }

    /// Check if a tree is mounted under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.tree(id).is_some()
    }

    /// Mounted tree identifiers, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.trees().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of staging areas currently attached.
    pub fn staging_count(&self) -> usize {
        self.staging().len()
    }

    /// Attach a staging area laid out at `width`.
    pub fn attach_staging(&self, width: f32) -> StagingGuard<'_> {
        let id = self.next_staging.fetch_add(1, Ordering::Relaxed);
        self.staging().insert(id);
        log::debug!("attached staging area {} at {}px", id, width);
        StagingGuard {
            surface: self,
            area: StagingArea::new(id, width, Arc::clone(&self.renderer)),
        }
    }

    fn detach(&self, id: u64) {
        self.staging().remove(&id);
        log::debug!("detached staging area {}", id);
    }

    // A panic while holding a lock leaves the maps themselves intact.
    fn trees(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<RenderedTree>>> {
        self.trees.read().unwrap_or_else(|e| recover("tree registry", e))
    }

    fn trees_mut(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<RenderedTree>>> {
        self.trees.write().unwrap_or_else(|e| recover("tree registry", e))
    }

    fn staging(&self) -> MutexGuard<'_, BTreeSet<u64>> {
        self.staging.lock().unwrap_or_else(|e| recover("staging registry", e))
    }
}

fn recover<G>(what: &str, err: PoisonError<G>) -> G {
    log::warn!("{} lock poisoned, recovering", what);
    err.into_inner()
}

impl Default for Surface {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

/// Attached staging area; detaches from its surface on drop.
#[derive(Debug)]
pub struct StagingGuard<'a> {
    surface: &'a Surface,
    area: StagingArea,
}

impl Deref for StagingGuard<'_> {
    type Target = StagingArea;

    fn deref(&self) -> &StagingArea {
        &self.area
    }
}

impl DerefMut for StagingGuard<'_> {
    fn deref_mut(&mut self) -> &mut StagingArea {
        &mut self.area
    }
}

impl Drop for StagingGuard<'_> {
    fn drop(&mut self) {
        self.surface.detach(self.area.id);
    }
}

/// Off-screen region used to measure and capture pages.
#[derive(Debug)]
pub struct StagingArea {
    id: u64,
    width: f32,
    renderer: Arc<Renderer>,
    mounted: Vec<VisualBlock>,
    pages: Vec<StagedPage>,
}

impl StagingArea {
    fn new(id: u64, width: f32, renderer: Arc<Renderer>) -> Self {
        Self {
            id,
            width,
            renderer,
            mounted: Vec::new(),
            pages: Vec::new(),
        }
    }

    /// Staging area identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Layout width of the area.
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Mount clones of `blocks`, re-laying out any whose width differs.
    pub fn mount(&mut self, blocks: &[VisualBlock]) {
        self.mounted = blocks
            .iter()
            .map(|block| {
                if self.fits_width(block) {
                    block.clone()
                } else {
                    self.renderer.relayout(block, self.width)
                }
            })
            .collect();
    }

    /// Mounted blocks, in source order.
    pub fn mounted(&self) -> &[VisualBlock] {
        &self.mounted
    }

    /// Take the mounted blocks, leaving the area empty.
    pub fn take_mounted(&mut self) -> Vec<VisualBlock> {
        std::mem::take(&mut self.mounted)
    }

    /// Materialize packed pages into the area.
    pub fn materialize(&mut self, pages: Vec<Page>) -> &[StagedPage] {
        self.pages = pages.into_iter().map(StagedPage::from).collect();
        &self.pages
    }

    /// Materialized pages.
    pub fn pages(&self) -> &[StagedPage] {
        &self.pages
    }

    fn fits_width(&self, block: &VisualBlock) -> bool {
        (block.width - self.width).abs() <= WIDTH_TOLERANCE
    }
}

impl Measure for StagingArea {
    fn measure(&mut self, block: &VisualBlock, _geometry: &PageGeometry) -> f32 {
        if self.fits_width(block) {
            block.height
        } else {
            self.renderer.relayout(block, self.width).height
        }
    }
}

/// A block placed on a staged page.
#[derive(Debug, Clone)]
pub struct Slot {
    /// Offset from the top of the content box
    pub y: f32,
    /// The mounted block
    pub block: VisualBlock,
}

/// A page materialized in a staging area, ready for capture.
#[derive(Debug, Clone)]
pub struct StagedPage {
    /// Page number (1-indexed)
    pub number: u32,
    /// Placed blocks, in source order
    pub slots: Vec<Slot>,
    /// Occupied height
    pub used_height: f32,
}

impl StagedPage {
    /// Check if the page is blank.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of placed blocks.
    pub fn len(&self) -> usize {
        self.slots.len()
    }
}

impl From<Page> for StagedPage {
    fn from(page: Page) -> Self {
        let mut y = 0.0;
        let slots = page
            .blocks
            .into_iter()
            .map(|block| {
                let slot = Slot { y, block };
                let h = slot.block.effective_height();
                if h.is_finite() && h > 0.0 {
                    y += h;
                }
                slot
            })
            .collect();
        Self {
            number: page.number,
            slots,
            used_height: page.used_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_detaches_on_drop() {
        let surface = Surface::default();
        {
            let _a = surface.attach_staging(720.0);
            let _b = surface.attach_staging(720.0);
            assert_eq!(surface.staging_count(), 2);
        }
        assert_eq!(surface.staging_count(), 0);
    }

    #[test]
    fn test_poisoned_locks_recover() {
        use std::panic::{catch_unwind, AssertUnwindSafe};

        let surface = Surface::default();
        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _trees = surface.trees.write().unwrap();
            let _staging = surface.staging.lock().unwrap();
            panic!("layout panicked");
        }));
        assert!(surface.trees.is_poisoned());
        assert!(surface.staging.is_poisoned());

        surface.render_markdown("doc", "Body");
        assert!(surface.contains("doc"));
        assert_eq!(surface.ids(), vec!["doc".to_string()]);

        let guard = surface.attach_staging(720.0);
        assert_eq!(surface.staging_count(), 1);
        drop(guard);
        assert_eq!(surface.staging_count(), 0);
    }

    #[test]
    fn test_render_and_lookup() {
        let surface = Surface::default();
        let n = surface.render_markdown("doc", "# Title\n\nBody");
        assert_eq!(n, 2);
        assert!(surface.contains("doc"));
        assert!(surface.tree("missing").is_none());
        assert_eq!(surface.ids(), vec!["doc".to_string()]);

        assert!(surface.unmount("doc").is_some());
        assert!(!surface.contains("doc"));
    }

    #[test]
    fn test_mount_relayouts_other_widths() {
        let surface = Surface::new(RenderOptions::new().with_width(1000.0));
        surface.render_markdown("doc", &"some words ".repeat(80));
        let tree = surface.tree("doc").unwrap();

        let mut staging = surface.attach_staging(400.0);
        staging.mount(tree.blocks());
        let mounted = &staging.mounted()[0];
        assert_eq!(mounted.width, 400.0);
        assert!(mounted.height > tree.blocks()[0].height);
    }

    #[test]
    fn test_staged_slots_stack() {
        let mut page = Page::new(1);
        page.commit(VisualBlock::sized(0, 720.0, 100.0), 100.0);
        page.commit(VisualBlock::sized(1, 720.0, 50.0), 50.0);
        page.commit(VisualBlock::sized(2, 720.0, 10.0), 10.0);

        let staged = StagedPage::from(page);
        let ys: Vec<f32> = staged.slots.iter().map(|s| s.y).collect();
        assert_eq!(ys, vec![0.0, 100.0, 150.0]);
        assert_eq!(staged.used_height, 160.0);
    }
}
