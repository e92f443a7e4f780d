//! Page identifier type.

use std::fmt;

/// Identifies a page of the data file.
///
/// Page `N` starts at byte offset `N × page_size`. Using `u32` keeps index
/// entries and free-list slots at four bytes on disk.
///
/// # Example
/// ```
/// use pagetable::PageId;
///
/// let page_id = PageId::new(3);
/// assert_eq!(page_id.0, 3);
/// assert_eq!(page_id.file_offset(4096), 12288);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl PageId {
    /// Create a new PageId.
    #[inline]
    pub fn new(id: u32) -> Self {
        PageId(id)
    }

    /// Byte offset of this page in a file of `page_size`-byte pages.
    #[inline]
    pub fn file_offset(&self, page_size: usize) -> u64 {
        (self.0 as u64) * (page_size as u64)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page({})", self.0)
    }
}
