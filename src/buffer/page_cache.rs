//! Page Cache - bounded cache of pages in front of the data file.
//!
//! The [`PageCache`] provides:
//! - Page caching between disk and memory
//! - Deferred write-back: dirty pages reach the data file only in
//!   [`PageCache::flush_all`]
//! - FIFO eviction of clean pages once `capacity` pages are cached

use std::collections::HashMap;

use log::debug;

use crate::buffer::replacer::FifoReplacer;
use crate::buffer::{Frame, PageStoreStats};
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;
use crate::storage::DiskManager;

/// Caches pages of one data file.
///
/// # Architecture
/// ```text
/// ┌───────────────────────────────────────────────┐
/// │                  PageCache                    │
/// │  ┌──────────────────────┐  ┌──────────────┐   │
/// │  │ frames               │  │   replacer   │   │
/// │  │ PageId → Frame       │  │ FifoReplacer │   │
/// │  └──────────────────────┘  └──────────────┘   │
/// └───────────────────────────────────────────────┘
///                     │ miss / flush
///                     ▼
///               DiskManager
/// ```
///
/// # Dirty pages
/// A dirty frame is pinned in the replacer until the next flush. Eviction
/// only drops clean frames, so the data file never holds page contents newer
/// than the last metadata write. When every cached page is dirty the cache
/// grows past `capacity`; `flush_all` shrinks it back.
///
/// The cache does not own the [`DiskManager`]; callers pass it in, which
/// lets the page store keep the two behind separate borrows.
pub struct PageCache {
    frames: HashMap<PageId, Frame>,
    replacer: FifoReplacer,
    capacity: usize,
}

impl PageCache {
    /// Create an empty cache.
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        Self {
            frames: HashMap::with_capacity(capacity),
            replacer: FifoReplacer::new(),
            capacity,
        }
    }

    /// Return the frame of `page_id`, reading it from disk on a miss.
    ///
    /// # Errors
    /// - `Error::PageNotFound` if the page doesn't exist on disk
    /// - I/O errors from the read
    pub fn fetch(
        &mut self,
        page_id: PageId,
        disk: &mut DiskManager,
        stats: &PageStoreStats,
    ) -> Result<&Frame> {
        self.load(page_id, disk, stats)?;
        self.frames
            .get(&page_id)
            .ok_or(Error::PageNotFound(page_id))
    }

    /// Return the page for modification, marking it dirty and pinning it
    /// until the next flush.
    pub fn fetch_mut(
        &mut self,
        page_id: PageId,
        disk: &mut DiskManager,
        stats: &PageStoreStats,
    ) -> Result<&mut Page> {
        self.load(page_id, disk, stats)?;
        self.replacer.set_evictable(page_id, false);
        let frame = self
            .frames
            .get_mut(&page_id)
            .ok_or(Error::PageNotFound(page_id))?;
        Ok(frame.page_mut())
    }

    /// Cache a zeroed, dirty page for a freshly allocated id.
    ///
    /// Any stale frame of the same id is replaced without write-back.
    pub fn insert_blank(&mut self, page_id: PageId, page_size: usize, stats: &PageStoreStats) {
        if !self.frames.contains_key(&page_id) {
            self.make_room(stats);
        }
        self.frames.insert(page_id, Frame::dirty(Page::new(page_size)));
        self.replacer.record_access(page_id);
        self.replacer.set_evictable(page_id, false);
    }

    /// Drop a page without writing it back.
    pub fn discard(&mut self, page_id: PageId) -> Option<Frame> {
        self.replacer.remove(page_id);
        self.frames.remove(&page_id)
    }

    /// Write every dirty page to disk, mark it clean, then evict clean pages
    /// down to `capacity`.
    ///
    /// Returns the number of pages written.
    pub fn flush_all(&mut self, disk: &mut DiskManager, stats: &PageStoreStats) -> Result<usize> {
        let mut dirty: Vec<PageId> = self
            .frames
            .iter()
            .filter(|(_, frame)| frame.is_dirty())
            .map(|(&page_id, _)| page_id)
            .collect();
        // Ascending ids give sequential file writes.
        dirty.sort_unstable();

        for page_id in &dirty {
            if let Some(frame) = self.frames.get_mut(page_id) {
                disk.write_page(*page_id, frame.page())?;
                frame.clear_dirty();
                self.replacer.set_evictable(*page_id, true);
                PageStoreStats::bump(&stats.pages_written);
            }
        }

        while self.frames.len() > self.capacity && self.evict_one(stats) {}
        Ok(dirty.len())
    }

    /// Number of cached pages.
    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of cached pages not yet written back.
    pub fn dirty_count(&self) -> usize {
        self.frames.values().filter(|f| f.is_dirty()).count()
    }

    #[inline]
    pub fn contains(&self, page_id: PageId) -> bool {
        self.frames.contains_key(&page_id)
    }

    /// Bring `page_id` into the cache if it is not there yet.
    fn load(&mut self, page_id: PageId, disk: &mut DiskManager, stats: &PageStoreStats) -> Result<()> {
        if self.frames.contains_key(&page_id) {
            PageStoreStats::bump(&stats.cache_hits);
            return Ok(());
        }
        PageStoreStats::bump(&stats.cache_misses);
        let page = disk.read_page(page_id)?;
        PageStoreStats::bump(&stats.pages_read);

        self.make_room(stats);
        self.frames.insert(page_id, Frame::clean(page));
        self.replacer.record_access(page_id);
        self.replacer.set_evictable(page_id, true);
        Ok(())
    }

    /// Evict clean pages until there is room for one more page, or until
    /// only dirty pages remain.
    fn make_room(&mut self, stats: &PageStoreStats) {
        while self.frames.len() >= self.capacity {
            if !self.evict_one(stats) {
                debug!(
                    "page cache over capacity: {} dirty pages pinned until flush",
                    self.frames.len()
                );
                break;
            }
        }
    }

    fn evict_one(&mut self, stats: &PageStoreStats) -> bool {
        let Some(victim) = self.replacer.evict() else {
            return false;
        };
        self.frames.remove(&victim);
        PageStoreStats::bump(&stats.evictions);
        debug!("evicted {} from page cache", victim);
        true
    }
}
