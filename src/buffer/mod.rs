//! Page caching between the page store and the data file.
//!
//! # Components
//! - [`PageCache`] - Bounded write-back cache of pages
//! - [`Frame`] - A cached page plus its dirty flag
//! - [`PageStoreStats`] - I/O and cache statistics
//! - [`replacer`] - Eviction policy

mod frame;
mod page_cache;
pub mod replacer;
mod stats;

pub use frame::Frame;
pub use page_cache::PageCache;
pub use stats::{PageStoreStats, StatsSnapshot};
