//! pagetable - A paged, disk-resident table of fixed-size records.
//!
//! Records are addressed by a dense logical position `0..size()`. Whole
//! records can be inserted or deleted anywhere; pages split when they run
//! out of room and are reclaimed when they run empty. The page directory and
//! free list persist across close and reopen.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           pagetable                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │               Table Layer (table/)                       │   │
//! │  │     TableAccess: read / insert / delete / close          │   │
//! │  │     TableBuilder: bulk load at the fill factor           │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │               Index Layer (index/)                       │   │
//! │  │     PageIndex: (page, count) entries + prefix sums       │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │               Storage Layer (storage/)                   │   │
//! │  │     PageStore + FreeList + TableMeta + DiskManager       │   │
//! │  │   ┌─────────────────────────────────────────────────┐   │   │
//! │  │   │  Page Cache (buffer/): write-back, FIFO eviction │   │   │
//! │  │   └─────────────────────────────────────────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//!        <name>.tbl (pages)                <name>.meta (directory)
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, Error, config)
//! - [`buffer`] - Page cache and statistics
//! - [`storage`] - Disk I/O, pages, free list and metadata
//! - [`index`] - Position-to-page directory
//! - [`table`] - Record-level API
//!
//! # Quick Start
//! ```no_run
//! use pagetable::{TableAccess, TableConfig};
//!
//! // 16-byte records in 4 KiB pages, bulk-loaded to 75%
//! let config = TableConfig::new(4, 12, 0.75)?;
//! let mut table = TableAccess::create("/tmp", "nodes", config, &[0u8; 16 * 100])?;
//!
//! table.insert(50, &[1u8; 16])?;
//! table.delete(0, 10)?;
//! table.close()?;
//!
//! let table = TableAccess::open("/tmp", "nodes")?;
//! assert_eq!(table.size(), 91);
//! assert_eq!(table.read(40, 0)?, 1);
//! # Ok::<(), pagetable::Error>(())
//! ```

pub mod buffer;
pub mod common;
pub mod index;
pub mod storage;
pub mod table;

// Re-export commonly used items at crate root for convenience
pub use common::{Error, PageId, Result, StoreOptions, TableConfig};

pub use buffer::{PageStoreStats, StatsSnapshot};
pub use index::{IndexEntry, Location, PageIndex};
pub use storage::page::Page;
pub use storage::{DiskManager, FreeList, PageStore};
pub use table::{TableAccess, TableBuilder};
