//! Page Store - page allocation, access and persistence for one table.
//!
//! The [`PageStore`] owns the data file, the page cache and the free list,
//! and writes the metadata file on flush.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::buffer::{PageCache, PageStoreStats};
use crate::common::config::{DATA_EXTENSION, META_EXTENSION};
use crate::common::{Error, PageId, Result, StoreOptions, TableConfig};
use crate::index::PageIndex;
use crate::storage::meta::TableMeta;
use crate::storage::page::Page;
use crate::storage::{DiskManager, FreeList};

/// Page-granular storage for one table.
///
/// # Architecture
/// ```text
/// ┌──────────────────────────────────────────────────────┐
/// │                     PageStore                        │
/// │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐   │
/// │  │  free_list  │  │    cache    │  │    disk     │   │
/// │  │  FreeList   │  │  PageCache  │  │ DiskManager │   │
/// │  └─────────────┘  └─────────────┘  └─────────────┘   │
/// └──────────────────────────────────────────────────────┘
///        <name>.meta                      <name>.tbl
/// ```
///
/// # Locking
/// `cache` and `disk` sit behind mutexes only so that reads can go through
/// `&self`; every mutating method takes `&mut self` and bypasses the locks
/// with `get_mut`. Callers sharing a store across threads must serialize
/// mutation themselves. Lock order is always `cache` then `disk`.
pub struct PageStore {
    config: TableConfig,
    options: StoreOptions,
    meta_path: PathBuf,
    cache: Mutex<PageCache>,
    disk: Mutex<DiskManager>,
    free_list: FreeList,
    stats: PageStoreStats,
}

impl PageStore {
    /// Create the data file for a new, empty table.
    ///
    /// The metadata file is written by the first [`PageStore::flush`].
    ///
    /// # Errors
    /// - `Error::AlreadyExists` if either file is already present
    /// - `Error::InvalidConfig` for rejected configuration or options
    pub fn create<P: AsRef<Path>>(
        dir: P,
        name: &str,
        config: TableConfig,
        options: StoreOptions,
    ) -> Result<Self> {
        config.validate()?;
        options.validate()?;

        let (data_path, meta_path) = table_paths(dir.as_ref(), name);
        for path in [&data_path, &meta_path] {
            if path.exists() {
                return Err(Error::AlreadyExists(path.clone()));
            }
        }

        let disk = DiskManager::create(&data_path, config.page_size())?;
        info!(
            "created table {} (record width {}, page size {})",
            data_path.display(),
            config.record_width(),
            config.page_size()
        );

        Ok(Self {
            config,
            options,
            meta_path,
            cache: Mutex::new(PageCache::new(options.cache_pages)),
            disk: Mutex::new(disk),
            free_list: FreeList::new(),
            stats: PageStoreStats::new(),
        })
    }

    /// Open an existing table and rebuild its page directory.
    ///
    /// # Errors
    /// `Error::Corrupt` if the metadata or data file is missing, malformed
    /// or inconsistent. No repair is attempted.
    pub fn open<P: AsRef<Path>>(
        dir: P,
        name: &str,
        options: StoreOptions,
    ) -> Result<(Self, PageIndex)> {
        options.validate()?;

        let (data_path, meta_path) = table_paths(dir.as_ref(), name);
        let meta = TableMeta::load(&meta_path)?;
        let config = meta.config;

        let disk = DiskManager::open(&data_path, config.page_size()).map_err(|e| match e {
            Error::Io(io) => Error::corrupt(format!(
                "cannot open data file {}: {}",
                data_path.display(),
                io
            )),
            other => other,
        })?;

        if disk.page_count() < meta.file_pages {
            return Err(Error::corrupt(format!(
                "data file holds {} pages, metadata expects {}",
                disk.page_count(),
                meta.file_pages
            )));
        }

        let mut free_list: FreeList = meta.free.iter().copied().collect();
        // Pages appended after the last flush are referenced by nothing.
        if disk.page_count() > meta.file_pages {
            warn!(
                "{} unreferenced trailing pages in {}, adding them to the free list",
                disk.page_count() - meta.file_pages,
                data_path.display()
            );
            for id in meta.file_pages..disk.page_count() {
                free_list.push(PageId::new(id));
            }
        }

        let index = PageIndex::from_entries(meta.entries);
        info!(
            "opened table {} ({} records in {} pages, {} free)",
            data_path.display(),
            index.size(),
            index.len(),
            free_list.len()
        );

        let store = Self {
            config,
            options,
            meta_path,
            cache: Mutex::new(PageCache::new(options.cache_pages)),
            disk: Mutex::new(disk),
            free_list,
            stats: PageStoreStats::new(),
        };
        Ok((store, index))
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    /// Hand out a page id, reusing a freed one before extending the file.
    ///
    /// The page starts zeroed and dirty in the cache.
    pub fn allocate(&mut self) -> Result<PageId> {
        let page_id = match self.free_list.pop() {
            Some(page_id) => page_id,
            None => self.disk.get_mut().allocate_page()?,
        };
        self.cache
            .get_mut()
            .insert_blank(page_id, self.config.page_size(), &self.stats);

        PageStoreStats::bump(&self.stats.pages_allocated);
        debug!("allocated {}", page_id);
        Ok(page_id)
    }

    /// Return a page id to the free list and drop its cached contents.
    pub fn free(&mut self, page_id: PageId) {
        self.cache.get_mut().discard(page_id);
        let newly_freed = self.free_list.push(page_id);
        debug_assert!(newly_freed, "{} freed twice", page_id);
        PageStoreStats::bump(&self.stats.pages_freed);
        debug!("freed {}", page_id);
    }

    // ========================================================================
    // Page access
    // ========================================================================

    /// Run `f` on the contents of a page.
    pub fn with_page<R>(&self, page_id: PageId, f: impl FnOnce(&Page) -> R) -> Result<R> {
        let mut cache = self.cache.lock();
        let mut disk = self.disk.lock();
        let frame = cache.fetch(page_id, &mut disk, &self.stats)?;
        Ok(f(frame.page()))
    }

    /// Run `f` on the mutable contents of a page and mark it dirty.
    ///
    /// The change reaches the data file at the next [`PageStore::flush`].
    pub fn with_page_mut<R>(
        &mut self,
        page_id: PageId,
        f: impl FnOnce(&mut Page) -> R,
    ) -> Result<R> {
        let page = self
            .cache
            .get_mut()
            .fetch_mut(page_id, self.disk.get_mut(), &self.stats)?;
        Ok(f(page))
    }

    /// Copy of the raw bytes of a page.
    pub fn read(&self, page_id: PageId) -> Result<Vec<u8>> {
        self.with_page(page_id, |page| page.as_slice().to_vec())
    }

    /// Replace the raw bytes of a page. Written to disk on flush.
    ///
    /// # Errors
    /// `Error::PageLength` if `data` is not exactly one page long.
    pub fn write(&mut self, page_id: PageId, data: &[u8]) -> Result<()> {
        let page_size = self.config.page_size();
        if data.len() != page_size {
            return Err(Error::PageLength {
                len: data.len(),
                page_size,
            });
        }
        self.with_page_mut(page_id, |page| page.as_mut_slice().copy_from_slice(data))
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Write all dirty pages, then the metadata describing `index` and the
    /// free list.
    ///
    /// Pages go first so that the metadata never references page contents
    /// that are not yet on disk.
    pub fn flush(&mut self, index: &PageIndex) -> Result<()> {
        let disk = self.disk.get_mut();
        let written = self.cache.get_mut().flush_all(disk, &self.stats)?;
        if self.options.sync_on_flush {
            disk.sync()?;
        }

        let meta = TableMeta {
            config: self.config,
            size: index.size(),
            file_pages: disk.page_count(),
            entries: index.entries().to_vec(),
            free: self.free_list.iter().collect(),
        };
        meta.store(&self.meta_path, self.options.sync_on_flush)?;

        debug!(
            "flushed {} pages and metadata ({} entries, {} free)",
            written,
            meta.entries.len(),
            meta.free.len()
        );
        Ok(())
    }

    // ========================================================================
    // Info
    // ========================================================================

    #[inline]
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    #[inline]
    pub fn stats(&self) -> &PageStoreStats {
        &self.stats
    }

    #[inline]
    pub fn free_list(&self) -> &FreeList {
        &self.free_list
    }

    /// Number of pages in the data file, in use or free.
    pub fn file_pages(&self) -> u32 {
        self.disk.lock().page_count()
    }
}

/// Data and metadata file paths of table `name` in `dir`.
pub fn table_paths(dir: &Path, name: &str) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("{}.{}", name, DATA_EXTENSION)),
        dir.join(format!("{}.{}", name, META_EXTENSION)),
    )
}
