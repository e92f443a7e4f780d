//! Disk Manager - low-level file I/O for table pages.
//!
//! The [`DiskManager`] handles all direct operations on the data file:
//! - Reading and writing whole pages
//! - Extending the file by one zeroed page
//! - Syncing the file to stable storage

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;

/// Manages disk I/O for a single data file.
///
/// # File Layout
/// The table is stored as a single file with pages laid out sequentially:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0        P        2P     ...      N×P
/// ```
///
/// Page N is located at file offset `N × page_size`. A page is written with a
/// single `write_all` of the full page; there are no partial page writes.
///
/// # Durability
/// Writes are not synced individually. [`DiskManager::sync`] is called by
/// the page store once per flush.
pub struct DiskManager {
    file: File,
    page_size: usize,
    /// Number of pages in the file.
    page_count: u32,
}

impl DiskManager {
    /// Create a new, empty data file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P, page_size: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        Ok(Self {
            file,
            page_size,
            page_count: 0,
        })
    }

    /// Open an existing data file.
    ///
    /// # Errors
    /// - I/O errors if the file doesn't exist or cannot be opened
    /// - `Error::Corrupt` if the file length is not a whole number of pages
    pub fn open<P: AsRef<Path>>(path: P, page_size: usize) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        let file_size = file.metadata()?.len();
        if file_size % page_size as u64 != 0 {
            return Err(Error::corrupt(format!(
                "data file length {} is not a multiple of page size {}",
                file_size, page_size
            )));
        }
        let page_count = u32::try_from(file_size / page_size as u64)
            .map_err(|_| Error::corrupt("data file holds more than u32::MAX pages"))?;

        Ok(Self {
            file,
            page_size,
            page_count,
        })
    }

    /// Read a page from disk into `page`.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page doesn't exist.
    pub fn read_page_into(&mut self, page_id: PageId, page: &mut Page) -> Result<()> {
        self.check_exists(page_id)?;

        self.file
            .seek(SeekFrom::Start(page_id.file_offset(self.page_size)))?;
        self.file.read_exact(page.as_mut_slice())?;

        Ok(())
    }

    /// Read a page from disk.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page doesn't exist.
    pub fn read_page(&mut self, page_id: PageId) -> Result<Page> {
        let mut page = Page::new(self.page_size);
        self.read_page_into(page_id, &mut page)?;
        Ok(page)
    }

    /// Write a page to disk.
    ///
    /// The page must have been previously allocated with `allocate_page()`.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page hasn't been allocated.
    pub fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        self.check_exists(page_id)?;
        debug_assert_eq!(page.size(), self.page_size);

        self.file
            .seek(SeekFrom::Start(page_id.file_offset(self.page_size)))?;
        self.file.write_all(page.as_slice())?;

        Ok(())
    }

    /// Extend the file by one zeroed page.
    ///
    /// Returns the `PageId` of the new page.
    pub fn allocate_page(&mut self) -> Result<PageId> {
        if self.page_count == u32::MAX {
            return Err(Error::Io(std::io::Error::other(
                "data file reached the maximum page count",
            )));
        }
        let page_id = PageId::new(self.page_count);

        self.file
            .seek(SeekFrom::Start(page_id.file_offset(self.page_size)))?;
        let zeros = vec![0u8; self.page_size];
        self.file.write_all(&zeros)?;

        self.page_count += 1;
        Ok(page_id)
    }

    /// Flush file contents to stable storage.
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Get the number of pages in the file.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Get the page size in bytes.
    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    fn check_exists(&self, page_id: PageId) -> Result<()> {
        if page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id));
        }
        Ok(())
    }
}
