//! Position-indexed page directory.
//!
//! The [`PageIndex`] maps a logical record position to the page holding it.
//! It is an ordered list of `(page_id, count)` entries plus a parallel array
//! of logical start offsets (prefix sums of `count`).
//!
//! # Example
//! ```text
//! entries:  [(P4, 3), (P0, 5), (P2, 2)]
//! starts:   [0,       3,       8      ]     size = 10
//!
//! locate(6) → entry 1, offset 3   (record lives in P0, slot 3)
//! ```
//!
//! Mutations update only the starts of entries after the one changed, so a
//! step costs `O(entries after it)` and never a full recomputation.

use crate::common::{Error, PageId, Result};

/// One page in the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Page holding the records.
    pub page_id: PageId,
    /// Number of used record slots (`0 < count <= M` outside of a mutation).
    pub count: usize,
}

impl IndexEntry {
    pub fn new(page_id: PageId, count: usize) -> Self {
        Self { page_id, count }
    }
}

/// Resolved position: directory entry and slot within its page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub entry: usize,
    pub offset: usize,
}

/// Ordered directory of pages with prefix-sum lookup.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageIndex {
    entries: Vec<IndexEntry>,
    /// `starts[i]` = sum of `entries[..i].count`.
    starts: Vec<u64>,
    size: u64,
}

impl PageIndex {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from entries in logical order.
    pub fn from_entries(entries: Vec<IndexEntry>) -> Self {
        let mut starts = Vec::with_capacity(entries.len());
        let mut size = 0u64;
        for entry in &entries {
            starts.push(size);
            size += entry.count as u64;
        }
        Self {
            entries,
            starts,
            size,
        }
    }

    /// Total number of records.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Number of pages in the directory.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn entry(&self, index: usize) -> IndexEntry {
        self.entries[index]
    }

    #[inline]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    #[cfg(test)]
    fn start(&self, index: usize) -> u64 {
        self.starts[index]
    }

    /// Resolve a record position in `[0, size)`.
    ///
    /// # Errors
    /// Returns `Error::PositionOutOfRange` if `pos >= size`.
    pub fn locate(&self, pos: u64) -> Result<Location> {
        if pos >= self.size {
            return Err(Error::PositionOutOfRange {
                pos,
                size: self.size,
            });
        }
        // Last entry whose start is <= pos. Entries are non-empty, so the
        // record lies inside it.
        let entry = self.starts.partition_point(|&start| start <= pos) - 1;
        Ok(Location {
            entry,
            offset: (pos - self.starts[entry]) as usize,
        })
    }

    /// Resolve an insertion point in `[0, size]`.
    ///
    /// `pos == size` resolves to the end of the last page; an empty
    /// directory resolves to entry 0, offset 0.
    ///
    /// # Errors
    /// Returns `Error::PositionOutOfRange` if `pos > size`.
    pub fn locate_insert(&self, pos: u64) -> Result<Location> {
        if pos > self.size {
            return Err(Error::PositionOutOfRange {
                pos,
                size: self.size,
            });
        }
        if pos < self.size {
            return self.locate(pos);
        }
        Ok(match self.entries.last() {
            Some(last) => Location {
                entry: self.entries.len() - 1,
                offset: last.count,
            },
            None => Location {
                entry: 0,
                offset: 0,
            },
        })
    }

    /// Splice a new entry in at `index`, shifting later entries back.
    pub fn insert_at(&mut self, index: usize, page_id: PageId, count: usize) {
        let start = if index < self.starts.len() {
            self.starts[index]
        } else {
            self.size
        };
        self.entries.insert(index, IndexEntry::new(page_id, count));
        self.starts.insert(index, start);
        self.shift_after(index, count as i64);
    }

    /// Splice a new entry in directly after entry `index`.
    pub fn insert_after(&mut self, index: usize, page_id: PageId, count: usize) {
        self.insert_at(index + 1, page_id, count);
    }

    /// Remove entry `index` and return it.
    pub fn remove_entry(&mut self, index: usize) -> IndexEntry {
        let removed = self.entries.remove(index);
        self.starts.remove(index);
        // Entries that followed now sit at `index..`.
        self.shift_from(index, -(removed.count as i64));
        removed
    }

    /// Change the used count of entry `index`.
    pub fn set_count(&mut self, index: usize, count: usize) {
        let delta = count as i64 - self.entries[index].count as i64;
        self.entries[index].count = count;
        self.shift_after(index, delta);
    }

    fn shift_after(&mut self, index: usize, delta: i64) {
        self.shift_from(index + 1, delta);
    }

    fn shift_from(&mut self, index: usize, delta: i64) {
        if delta == 0 {
            return;
        }
        for start in &mut self.starts[index..] {
            *start = (*start as i64 + delta) as u64;
        }
        self.size = (self.size as i64 + delta) as u64;
    }
}
