//! Page - the unit of storage and I/O.
//!
//! A [`Page`] is a raw byte buffer of the table's page size, viewed as an
//! array of fixed-width record slots. Slots `[0, used)` hold records in
//! logical order; the tail past `used` is kept zeroed.

/// A page of data.
///
/// # Memory Layout
/// ```text
/// ┌──────────┬──────────┬─────┬────────────┬───────────────┐
/// │ slot 0   │ slot 1   │ ... │ slot used-1│ zeroed tail   │
/// │ (R bytes)│ (R bytes)│     │            │               │
/// └──────────┴──────────┴─────┴────────────┴───────────────┘
/// ```
///
/// # Clone Implementation
/// `Page` does NOT implement `Clone` in production code; copying a page
/// should be explicit. A `#[cfg(test)]` Clone is provided for tests.
///
/// # Example
/// ```
/// use pagetable::storage::page::Page;
///
/// let mut page = Page::new(64);
/// page.write_records(0, 16, &[7u8; 16]);
/// assert_eq!(page.record(0, 16), &[7u8; 16]);
/// ```
pub struct Page {
    data: Box<[u8]>,
}

impl Page {
    /// Create a new zeroed page of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0u8; size].into_boxed_slice(),
        }
    }

    /// Get immutable slice of page data.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Get mutable slice of page data.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Page size in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Bytes of record slot `slot`.
    #[inline]
    pub fn record(&self, slot: usize, width: usize) -> &[u8] {
        let start = slot * width;
        &self.data[start..start + width]
    }

    /// Bytes of `count` consecutive slots starting at `slot`.
    #[inline]
    pub fn records(&self, slot: usize, count: usize, width: usize) -> &[u8] {
        &self.data[slot * width..(slot + count) * width]
    }

    /// Copy whole records into consecutive slots starting at `slot`.
    ///
    /// # Panics
    /// Panics if the records do not fit into the page.
    pub fn write_records(&mut self, slot: usize, width: usize, bytes: &[u8]) {
        let start = slot * width;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
    }

    /// Move slots `[at, used)` up by `count` slots, opening a gap at `at`.
    ///
    /// # Panics
    /// Panics if `used + count` slots do not fit into the page.
    pub fn open_gap(&mut self, at: usize, count: usize, used: usize, width: usize) {
        let src = at * width..used * width;
        self.data.copy_within(src, (at + count) * width);
    }

    /// Move slots `[at + count, used)` down over `[at, at + count)` and zero
    /// the `count` slots freed at the end.
    pub fn close_gap(&mut self, at: usize, count: usize, used: usize, width: usize) {
        let src = (at + count) * width..used * width;
        self.data.copy_within(src, at * width);
        self.data[(used - count) * width..used * width].fill(0);
    }

    /// Zero slots `[from, used)`.
    pub fn clear_tail(&mut self, from: usize, used: usize, width: usize) {
        self.data[from * width..used * width].fill(0);
    }
}

// Clone only available in tests - forces explicit copying in production
#[cfg(test)]
impl Clone for Page {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTH: usize = 4;

    /// Page of 8 four-byte slots, the first `used` holding `[i; 4]`.
    fn filled_page(used: usize) -> Page {
        let mut page = Page::new(32);
        for i in 0..used {
            page.write_records(i, WIDTH, &[i as u8 + 1; WIDTH]);
        }
        page
    }

    #[test]
    fn test_page_new() {
        let page = Page::new(256);
        assert_eq!(page.size(), 256);
        assert!(page.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_record_access() {
        let page = filled_page(3);
        assert_eq!(page.record(0, WIDTH), &[1; WIDTH]);
        assert_eq!(page.record(2, WIDTH), &[3; WIDTH]);
        assert_eq!(page.records(1, 2, WIDTH), &[2, 2, 2, 2, 3, 3, 3, 3]);
    }

    #[test]
    fn test_open_gap() {
        let mut page = filled_page(4);
        page.open_gap(1, 2, 4, WIDTH);
        page.write_records(1, WIDTH, &[9; 2 * WIDTH]);

        assert_eq!(page.record(0, WIDTH), &[1; WIDTH]);
        assert_eq!(page.record(1, WIDTH), &[9; WIDTH]);
        assert_eq!(page.record(2, WIDTH), &[9; WIDTH]);
        assert_eq!(page.record(3, WIDTH), &[2; WIDTH]);
        assert_eq!(page.record(5, WIDTH), &[4; WIDTH]);
    }

    #[test]
    fn test_open_gap_at_end_moves_nothing() {
        let mut page = filled_page(3);
        page.open_gap(3, 2, 3, WIDTH);
        assert_eq!(page.records(0, 3, WIDTH), filled_page(3).records(0, 3, WIDTH));
    }

    #[test]
    fn test_close_gap() {
        let mut page = filled_page(5);
        page.close_gap(1, 2, 5, WIDTH);

        assert_eq!(page.record(0, WIDTH), &[1; WIDTH]);
        assert_eq!(page.record(1, WIDTH), &[4; WIDTH]);
        assert_eq!(page.record(2, WIDTH), &[5; WIDTH]);
        // Vacated slots are zeroed
        assert_eq!(page.records(3, 2, WIDTH), &[0; 2 * WIDTH]);
    }

    #[test]
    fn test_clear_tail() {
        let mut page = filled_page(4);
        page.clear_tail(2, 4, WIDTH);
        assert_eq!(page.record(1, WIDTH), &[2; WIDTH]);
        assert_eq!(page.records(2, 2, WIDTH), &[0; 2 * WIDTH]);
    }

    #[test]
    fn test_page_clone_in_tests() {
        let page = filled_page(1);
        let cloned = page.clone();
        assert_eq!(cloned.as_slice(), page.as_slice());
    }
}
