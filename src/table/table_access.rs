//! Table Access - the public record-store API.
//!
//! A [`TableAccess`] presents the pages of a table as one dense sequence of
//! fixed-width records addressed by position `0..size()`, and supports
//! inserting and deleting whole records anywhere in that sequence.
//!
//! # Insert
//! Records are placed into the target page while it has free slots. A full
//! page is split at the insertion point: its tail moves to a new page spliced
//! in directly after it, and placement continues at the front of that new
//! page. Capacity is re-checked before every placement step, so one insert
//! may split several times and no page ever exceeds `M` records.
//!
//! # Delete
//! Records are removed page by page, compacting each page in place. A page
//! whose count reaches zero leaves the directory and its id goes to the free
//! list. Under-filled pages are never merged.

use std::path::Path;

use log::{debug, error, info, warn};

use crate::buffer::PageStoreStats;
use crate::common::{Error, Result, StoreOptions, TableConfig};
use crate::index::{IndexEntry, Location, PageIndex};
use crate::storage::PageStore;
use crate::table::TableBuilder;

/// An open table.
///
/// # Lifecycle
/// ```text
/// open / create ──▶ Open ──close()──▶ (handle consumed)
///                    │
///                    └── dropped without close(): flushed by Drop
/// ```
/// There is no closed handle value: `close` takes `self`, so using a closed
/// table does not compile.
///
/// # Example
/// ```no_run
/// use pagetable::{TableAccess, TableConfig};
///
/// let config = TableConfig::new(4, 12, 0.75)?;
/// let mut table = TableAccess::create("/tmp", "nodes", config, &[0u8; 64])?;
/// table.insert(2, &[7u8; 16])?;
/// assert_eq!(table.size(), 5);
/// assert_eq!(table.read(2, 0)?, 7);
/// table.close()?;
/// # Ok::<(), pagetable::Error>(())
/// ```
pub struct TableAccess {
    name: String,
    store: PageStore,
    index: PageIndex,
    closed: bool,
}

impl TableAccess {
    /// Open an existing table with default [`StoreOptions`].
    ///
    /// # Errors
    /// `Error::Corrupt` if the persisted state cannot be trusted.
    pub fn open<P: AsRef<Path>>(dir: P, name: &str) -> Result<Self> {
        Self::open_with(dir, name, StoreOptions::default())
    }

    /// Open an existing table.
    pub fn open_with<P: AsRef<Path>>(dir: P, name: &str, options: StoreOptions) -> Result<Self> {
        let (store, index) = PageStore::open(dir, name, options).inspect_err(|e| {
            if matches!(e, Error::Corrupt(_)) {
                error!("refusing to open table {}: {}", name, e);
            }
        })?;
        Ok(Self::from_parts(name, store, index))
    }

    /// Create a table holding `records` and open it.
    ///
    /// See [`TableBuilder`] for control over store options.
    pub fn create<P: AsRef<Path>>(
        dir: P,
        name: &str,
        config: TableConfig,
        records: &[u8],
    ) -> Result<Self> {
        TableBuilder::new(config).build(dir, name, records)
    }

    pub(crate) fn from_parts(name: &str, store: PageStore, index: PageIndex) -> Self {
        Self {
            name: name.to_string(),
            store,
            index,
            closed: false,
        }
    }

    // ========================================================================
    // Info
    // ========================================================================

    /// Number of records.
    #[inline]
    pub fn size(&self) -> u64 {
        self.index.size()
    }

    /// Number of pages referenced by the directory.
    #[inline]
    pub fn page_count(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn config(&self) -> &TableConfig {
        self.store.config()
    }

    /// The page directory: `(page_id, count)` in logical order.
    #[inline]
    pub fn entries(&self) -> &[IndexEntry] {
        self.index.entries()
    }

    /// Number of reclaimed pages waiting for reuse.
    #[inline]
    pub fn free_pages(&self) -> usize {
        self.store.free_list().len()
    }

    #[inline]
    pub fn stats(&self) -> &PageStoreStats {
        self.store.stats()
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    // ========================================================================
    // Record access
    // ========================================================================

    /// Byte `offset` of the record at `pos`.
    ///
    /// # Errors
    /// Out of range if `pos >= size()` or `offset >= R`.
    pub fn read(&self, pos: u64, offset: usize) -> Result<u8> {
        let (loc, byte) = self.resolve_bytes(pos, offset, 1)?;
        let page_id = self.index.entry(loc.entry).page_id;
        self.store.with_page(page_id, |page| page.as_slice()[byte])
    }

    /// Big-endian `u32` at byte `offset` of the record at `pos`.
    pub fn read_u32(&self, pos: u64, offset: usize) -> Result<u32> {
        let (loc, byte) = self.resolve_bytes(pos, offset, 4)?;
        let page_id = self.index.entry(loc.entry).page_id;
        self.store.with_page(page_id, |page| {
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(&page.as_slice()[byte..byte + 4]);
            u32::from_be_bytes(bytes)
        })
    }

    /// Copy of the whole record at `pos`.
    pub fn read_record(&self, pos: u64) -> Result<Vec<u8>> {
        let width = self.config().record_width();
        let loc = self.index.locate(pos)?;
        let page_id = self.index.entry(loc.entry).page_id;
        self.store
            .with_page(page_id, |page| page.record(loc.offset, width).to_vec())
    }

    /// Overwrite byte `offset` of the record at `pos`.
    pub fn write(&mut self, pos: u64, offset: usize, value: u8) -> Result<()> {
        let (loc, byte) = self.resolve_bytes(pos, offset, 1)?;
        let page_id = self.index.entry(loc.entry).page_id;
        self.store
            .with_page_mut(page_id, |page| page.as_mut_slice()[byte] = value)
    }

    /// Overwrite a big-endian `u32` at byte `offset` of the record at `pos`.
    pub fn write_u32(&mut self, pos: u64, offset: usize, value: u32) -> Result<()> {
        let (loc, byte) = self.resolve_bytes(pos, offset, 4)?;
        let page_id = self.index.entry(loc.entry).page_id;
        self.store.with_page_mut(page_id, |page| {
            page.as_mut_slice()[byte..byte + 4].copy_from_slice(&value.to_be_bytes())
        })
    }

    /// Locate `pos` and turn `offset` into a byte offset within its page,
    /// checking that `len` bytes fit into the record.
    fn resolve_bytes(&self, pos: u64, offset: usize, len: usize) -> Result<(Location, usize)> {
        let width = self.config().record_width();
        if offset.checked_add(len).map_or(true, |end| end > width) {
            return Err(Error::ByteOffsetOutOfRange { offset, width });
        }
        let loc = self.index.locate(pos)?;
        Ok((loc, loc.offset * width + offset))
    }

    // ========================================================================
    // Structural updates
    // ========================================================================

    /// Insert whole records before position `pos` (`0 <= pos <= size()`).
    ///
    /// Records at `pos` and after move back by `records.len() / R`.
    ///
    /// # Errors
    /// - `Error::RecordLength` if `records` is not a multiple of `R`
    /// - `Error::PositionOutOfRange` if `pos > size()`
    ///
    /// Both are checked before anything is modified.
    pub fn insert(&mut self, pos: u64, records: &[u8]) -> Result<()> {
        let width = self.config().record_width();
        let max = self.config().max_records();
        if records.len() % width != 0 {
            return Err(Error::RecordLength {
                len: records.len(),
                width,
            });
        }
        let mut loc = self.index.locate_insert(pos)?;
        let total = records.len() / width;
        if total == 0 {
            return Ok(());
        }

        // At a page boundary in front of a full page, prefer the room left at
        // the end of the previous page.
        if loc.offset == 0 && loc.entry > 0 && loc.entry < self.index.len() {
            let prev = self.index.entry(loc.entry - 1);
            if self.index.entry(loc.entry).count == max && prev.count < max {
                loc = Location {
                    entry: loc.entry - 1,
                    offset: prev.count,
                };
            }
        }

        let mut placed = 0;
        while placed < total {
            let remaining = total - placed;

            if self.index.is_empty() {
                let n = remaining.min(max);
                self.place_in_new_page(0, &records[..n * width])?;
                loc = Location { entry: 0, offset: n };
                placed += n;
                continue;
            }

            let entry = self.index.entry(loc.entry);
            let free = max - entry.count;

            if free > 0 {
                let n = free.min(remaining);
                let chunk = &records[placed * width..(placed + n) * width];
                self.store.with_page_mut(entry.page_id, |page| {
                    page.open_gap(loc.offset, n, entry.count, width);
                    page.write_records(loc.offset, width, chunk);
                })?;
                self.index.set_count(loc.entry, entry.count + n);
                loc.offset += n;
                placed += n;
                continue;
            }

            // Target page is full and records remain.
            if loc.offset == entry.count || loc.offset == 0 {
                // Nothing to carry over: start a fresh page after (at the
                // page's end) or before (at its front) the full one.
                let at = if loc.offset == 0 { loc.entry } else { loc.entry + 1 };
                let n = remaining.min(max);
                let chunk = &records[placed * width..(placed + n) * width];
                self.place_in_new_page(at, chunk)?;
                loc = Location { entry: at, offset: n };
                placed += n;
            } else {
                self.split(loc)?;
                loc = Location {
                    entry: loc.entry + 1,
                    offset: 0,
                };
            }
        }

        debug!(
            "inserted {} records at {} into {} (now {} records, {} pages)",
            total,
            pos,
            self.name,
            self.index.size(),
            self.index.len()
        );
        Ok(())
    }

    /// Delete `count` records starting at `pos` (`pos + count <= size()`).
    ///
    /// # Errors
    /// `Error::DeleteOutOfRange` if the range runs past the end, checked
    /// before anything is modified.
    pub fn delete(&mut self, pos: u64, count: u64) -> Result<()> {
        let size = self.index.size();
        if pos.checked_add(count).map_or(true, |end| end > size) {
            return Err(Error::DeleteOutOfRange { pos, count, size });
        }
        if count == 0 {
            return Ok(());
        }

        let width = self.config().record_width();
        let mut loc = self.index.locate(pos)?;
        let mut remaining = count;

        while remaining > 0 {
            let entry = self.index.entry(loc.entry);
            let available = (entry.count - loc.offset) as u64;
            let n = remaining.min(available) as usize;

            if n == entry.count {
                // Whole page goes; the next entry slides into `loc.entry`.
                self.index.remove_entry(loc.entry);
                self.store.free(entry.page_id);
                debug!("reclaimed {} from {}", entry.page_id, self.name);
            } else {
                self.store.with_page_mut(entry.page_id, |page| {
                    page.close_gap(loc.offset, n, entry.count, width);
                })?;
                self.index.set_count(loc.entry, entry.count - n);
                loc.entry += 1;
            }

            remaining -= n as u64;
            loc.offset = 0;
        }

        debug!(
            "deleted {} records at {} from {} (now {} records, {} pages)",
            count,
            pos,
            self.name,
            self.index.size(),
            self.index.len()
        );
        Ok(())
    }

    /// Allocate a page holding `chunk` and splice it in at directory slot
    /// `at`.
    fn place_in_new_page(&mut self, at: usize, chunk: &[u8]) -> Result<()> {
        let width = self.config().record_width();
        let page_id = self.store.allocate()?;
        self.store
            .with_page_mut(page_id, |page| page.write_records(0, width, chunk))?;
        self.index.insert_at(at, page_id, chunk.len() / width);
        Ok(())
    }

    /// Move records `[loc.offset, count)` of a page into a new page spliced
    /// in directly after it.
    fn split(&mut self, loc: Location) -> Result<()> {
        let width = self.config().record_width();
        let entry = self.index.entry(loc.entry);
        let moved = entry.count - loc.offset;

        let new_id = self.store.allocate()?;
        let tail = self.store.with_page(entry.page_id, |page| {
            page.records(loc.offset, moved, width).to_vec()
        })?;
        self.store
            .with_page_mut(new_id, |page| page.write_records(0, width, &tail))?;
        self.store.with_page_mut(entry.page_id, |page| {
            page.clear_tail(loc.offset, entry.count, width)
        })?;

        self.index.set_count(loc.entry, loc.offset);
        self.index.insert_after(loc.entry, new_id, moved);

        debug!(
            "split {} at slot {}: {} records moved to {}",
            entry.page_id, loc.offset, moved, new_id
        );
        Ok(())
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Write dirty pages and metadata without closing.
    pub fn flush(&mut self) -> Result<()> {
        self.store.flush(&self.index)
    }

    /// Flush everything and release the table files.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.store.flush(&self.index)?;
        info!(
            "closed table {} ({} records, {} pages)",
            self.name,
            self.index.size(),
            self.index.len()
        );
        Ok(())
    }
}

impl Drop for TableAccess {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        warn!("table {} dropped without close, flushing", self.name);
        if let Err(e) = self.store.flush(&self.index) {
            error!("flush of table {} on drop failed: {}", self.name, e);
        }
    }
}
