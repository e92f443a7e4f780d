//! Frame - a slot in the page cache.
//!
//! A [`Frame`] holds a [`Page`] plus the dirty flag that tells the cache
//! whether the page must be written back before it is dropped.

use crate::storage::page::Page;

/// A cached page.
///
/// Frames are owned by the [`PageCache`](super::PageCache) and accessed
/// through `&`/`&mut` borrows, so no interior locking is needed here.
pub struct Frame {
    page: Page,
    /// Whether the page has been modified since it was read or written.
    is_dirty: bool,
}

impl Frame {
    /// Wrap a page just read from disk.
    pub fn clean(page: Page) -> Self {
        Self {
            page,
            is_dirty: false,
        }
    }

    /// Wrap a page that exists only in memory so far.
    pub fn dirty(page: Page) -> Self {
        Self {
            page,
            is_dirty: true,
        }
    }

    #[inline]
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Mutable page access. Marks the frame dirty.
    #[inline]
    pub fn page_mut(&mut self) -> &mut Page {
        self.is_dirty = true;
        &mut self.page
    }

    // ========================================================================
    // Dirty flag operations
    // ========================================================================

    #[inline]
    pub fn clear_dirty(&mut self) {
        self.is_dirty = false;
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }
}
