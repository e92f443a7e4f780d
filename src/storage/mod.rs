//! Storage layer - disk I/O, page formats and table metadata.
//!
//! This module handles persistent storage:
//! - [`PageStore`] - Allocate, access, free and flush pages of one table
//! - [`DiskManager`] - Low-level file I/O
//! - [`FreeList`] - Reclaimed page ids
//! - [`meta`] - The metadata file (layout, page directory, free list)
//! - [`page`] - Page buffer and record-slot layout

mod disk_manager;
mod free_list;
pub mod meta;
pub mod page;
mod page_store;

pub use disk_manager::DiskManager;
pub use free_list::FreeList;
pub use meta::TableMeta;
pub use page_store::{table_paths, PageStore};
