//! Table metadata file.
//!
//! The metadata file holds everything needed to rebuild an open table apart
//! from page contents: the layout, the page directory and the free list.
//!
//! # Layout (little-endian)
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       4     magic "PTBL"
//! 4       4     format version
//! 8       1     record_power
//! 9       1     page_power
//! 10      2     reserved (zero)
//! 12      8     fill_factor (f64 bits)
//! 20      8     size (total records)
//! 28      4     file_pages (pages in the data file)
//! 32      4     entry_count
//! 36      4     free_count
//! 40      8×E   entries: page_id u32, count u32
//! ..      4×F   free page ids
//! ..      4     CRC32 of every preceding byte
//! ```
//!
//! The file is replaced atomically: written to `<name>.meta.tmp`, synced,
//! then renamed over the old file.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::common::{Error, PageId, Result, TableConfig};
use crate::index::IndexEntry;

/// Magic number of the metadata file ("PTBL").
pub const META_MAGIC: u32 = 0x4C42_5450;

/// Version of the metadata file format.
pub const META_VERSION: u32 = 1;

/// Size of the fixed header in bytes.
pub const HEADER_SIZE: usize = 40;

const OFFSET_MAGIC: usize = 0;
const OFFSET_VERSION: usize = 4;
const OFFSET_RECORD_POWER: usize = 8;
const OFFSET_PAGE_POWER: usize = 9;
const OFFSET_FILL_FACTOR: usize = 12;
const OFFSET_SIZE: usize = 20;
const OFFSET_FILE_PAGES: usize = 28;
const OFFSET_ENTRY_COUNT: usize = 32;
const OFFSET_FREE_COUNT: usize = 36;

/// Decoded contents of the metadata file.
#[derive(Debug, Clone, PartialEq)]
pub struct TableMeta {
    pub config: TableConfig,
    /// Total record count; must equal the sum of entry counts.
    pub size: u64,
    /// Number of pages in the data file.
    pub file_pages: u32,
    /// Page directory in logical order.
    pub entries: Vec<IndexEntry>,
    /// Reclaimed page ids.
    pub free: Vec<PageId>,
}

impl TableMeta {
    /// Serialize to the on-disk byte format, checksum included.
    pub fn encode(&self) -> Vec<u8> {
        let len = HEADER_SIZE + 8 * self.entries.len() + 4 * self.free.len() + 4;
        let mut buf = Vec::with_capacity(len);

        buf.extend_from_slice(&META_MAGIC.to_le_bytes());
        buf.extend_from_slice(&META_VERSION.to_le_bytes());
        buf.push(self.config.record_power());
        buf.push(self.config.page_power());
        buf.extend_from_slice(&[0u8; 2]);
        buf.extend_from_slice(&self.config.fill_factor().to_bits().to_le_bytes());
        buf.extend_from_slice(&self.size.to_le_bytes());
        buf.extend_from_slice(&self.file_pages.to_le_bytes());
        buf.extend_from_slice(&(self.entries.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(self.free.len() as u32).to_le_bytes());

        for entry in &self.entries {
            buf.extend_from_slice(&entry.page_id.0.to_le_bytes());
            buf.extend_from_slice(&(entry.count as u32).to_le_bytes());
        }
        for page_id in &self.free {
            buf.extend_from_slice(&page_id.0.to_le_bytes());
        }

        let checksum = crc32fast::hash(&buf);
        buf.extend_from_slice(&checksum.to_le_bytes());
        buf
    }

    /// Parse and validate the on-disk byte format.
    ///
    /// # Errors
    /// Returns `Error::Corrupt` for any framing, checksum or consistency
    /// failure (see [`TableMeta::validate`]).
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE + 4 {
            return Err(Error::corrupt(format!(
                "metadata too short ({} bytes)",
                data.len()
            )));
        }

        let (body, trailer) = data.split_at(data.len() - 4);
        let stored = read_u32(trailer, 0);
        let computed = crc32fast::hash(body);
        if stored != computed {
            return Err(Error::corrupt(format!(
                "metadata checksum mismatch (stored {:#010x}, computed {:#010x})",
                stored, computed
            )));
        }

        let magic = read_u32(body, OFFSET_MAGIC);
        if magic != META_MAGIC {
            return Err(Error::corrupt(format!("bad metadata magic {:#010x}", magic)));
        }
        let version = read_u32(body, OFFSET_VERSION);
        if version != META_VERSION {
            return Err(Error::corrupt(format!(
                "unsupported metadata version {}",
                version
            )));
        }

        let config = TableConfig::new(
            body[OFFSET_RECORD_POWER],
            body[OFFSET_PAGE_POWER],
            f64::from_bits(read_u64(body, OFFSET_FILL_FACTOR)),
        )
        .map_err(|e| Error::corrupt(format!("stored layout rejected: {}", e)))?;

        let size = read_u64(body, OFFSET_SIZE);
        let file_pages = read_u32(body, OFFSET_FILE_PAGES);
        let entry_count = read_u32(body, OFFSET_ENTRY_COUNT) as usize;
        let free_count = read_u32(body, OFFSET_FREE_COUNT) as usize;

        let expected = HEADER_SIZE as u64 + 8 * entry_count as u64 + 4 * free_count as u64;
        if body.len() as u64 != expected {
            return Err(Error::corrupt(format!(
                "metadata body is {} bytes, header describes {}",
                body.len(),
                expected
            )));
        }

        let mut offset = HEADER_SIZE;
        let mut entries = Vec::with_capacity(entry_count);
        for _ in 0..entry_count {
            let page_id = PageId::new(read_u32(body, offset));
            let count = read_u32(body, offset + 4) as usize;
            entries.push(IndexEntry::new(page_id, count));
            offset += 8;
        }
        let mut free = Vec::with_capacity(free_count);
        for _ in 0..free_count {
            free.push(PageId::new(read_u32(body, offset)));
            offset += 4;
        }

        let meta = Self {
            config,
            size,
            file_pages,
            entries,
            free,
        };
        meta.validate()?;
        Ok(meta)
    }

    /// Check the directory and free list against each other and the layout.
    ///
    /// # Errors
    /// Returns `Error::Corrupt` if a count is outside `1..=M`, counts do not
    /// sum to `size`, a page id is past `file_pages` or used twice, or a free
    /// id is also referenced by the directory.
    pub fn validate(&self) -> Result<()> {
        let max = self.config.max_records();
        let mut seen = HashSet::with_capacity(self.entries.len() + self.free.len());
        let mut total = 0u64;

        for (i, entry) in self.entries.iter().enumerate() {
            if entry.count == 0 || entry.count > max {
                return Err(Error::corrupt(format!(
                    "entry {} ({}) holds {} records, capacity {}",
                    i, entry.page_id, entry.count, max
                )));
            }
            self.check_page_id(entry.page_id, &mut seen)?;
            total += entry.count as u64;
        }
        if total != self.size {
            return Err(Error::corrupt(format!(
                "page counts sum to {}, stored size is {}",
                total, self.size
            )));
        }
        for &page_id in &self.free {
            self.check_page_id(page_id, &mut seen)?;
        }
        Ok(())
    }

    fn check_page_id(&self, page_id: PageId, seen: &mut HashSet<PageId>) -> Result<()> {
        if page_id.0 >= self.file_pages {
            return Err(Error::corrupt(format!(
                "{} is past the end of the data file ({} pages)",
                page_id, self.file_pages
            )));
        }
        if !seen.insert(page_id) {
            return Err(Error::corrupt(format!("{} is referenced twice", page_id)));
        }
        Ok(())
    }

    /// Read and decode a metadata file.
    ///
    /// # Errors
    /// A missing or unreadable file is reported as `Error::Corrupt`, since
    /// the data file without its metadata cannot be interpreted.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| {
            Error::corrupt(format!("cannot read metadata {}: {}", path.display(), e))
        })?;
        Self::decode(&data)
    }

    /// Atomically replace the metadata file at `path`.
    pub fn store<P: AsRef<Path>>(&self, path: P, sync: bool) -> Result<()> {
        let path = path.as_ref();
        let tmp_path = path.with_extension("meta.tmp");

        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp_path)?;
            file.write_all(&self.encode())?;
            if sync {
                file.sync_all()?;
            }
        }

        fs::rename(&tmp_path, path)?;

        // Make the rename itself durable
        if sync {
            if let Some(dir) = path.parent() {
                if let Ok(dir) = File::open(dir) {
                    let _ = dir.sync_all();
                }
            }
        }
        Ok(())
    }
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&data[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

fn read_u64(data: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[offset..offset + 8]);
    u64::from_le_bytes(bytes)
}

// ============================================================================
// TESTS
// ============================================================================
