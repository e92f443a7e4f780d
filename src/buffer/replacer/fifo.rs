//! FIFO (First-In-First-Out) replacement policy.

use std::collections::{HashSet, VecDeque};

use crate::common::PageId;

/// A simple FIFO eviction policy.
///
/// Evicts pages in the order they were added to the cache. Re-accessing a
/// cached page does not move it. Pages marked non-evictable (dirty pages
/// waiting for a flush) are skipped but keep their place in the queue.
#[derive(Debug, Default)]
pub struct FifoReplacer {
    /// Queue of page IDs in insertion order (front = oldest).
    queue: VecDeque<PageId>,

    /// Set for O(1) membership check. Mirrors `queue` exactly.
    in_queue: HashSet<PageId>,

    /// Tracked pages that may be evicted.
    evictable: HashSet<PageId>,
}

impl FifoReplacer {
    /// Create a new FIFO replacer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a page was accessed.
    ///
    /// For FIFO, only adds to queue if not already present. New pages start
    /// out non-evictable.
    pub fn record_access(&mut self, page_id: PageId) {
        if self.in_queue.insert(page_id) {
            self.queue.push_back(page_id);
        }
    }

    /// Allow or forbid evicting a tracked page.
    pub fn set_evictable(&mut self, page_id: PageId, evictable: bool) {
        if evictable && self.in_queue.contains(&page_id) {
            self.evictable.insert(page_id);
        } else {
            self.evictable.remove(&page_id);
        }
    }

    /// Select a victim page for eviction.
    ///
    /// Returns the oldest evictable page, or None if every tracked page is
    /// pinned.
    pub fn evict(&mut self) -> Option<PageId> {
        let at = self
            .queue
            .iter()
            .position(|page_id| self.evictable.contains(page_id))?;
        let page_id = self.queue.remove(at)?;
        self.in_queue.remove(&page_id);
        self.evictable.remove(&page_id);
        Some(page_id)
    }

    /// Stop tracking a page.
    ///
    /// Called when a page is freed. A later `record_access` re-adds it at the
    /// back of the queue.
    pub fn remove(&mut self, page_id: PageId) {
        if self.in_queue.remove(&page_id) {
            self.queue.retain(|&queued| queued != page_id);
        }
        self.evictable.remove(&page_id);
    }

    /// Number of evictable pages.
    pub fn size(&self) -> usize {
        self.evictable.len()
    }

    /// Number of tracked pages, evictable or not.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
