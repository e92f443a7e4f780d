//! Logical position directory.
//!
//! - [`PageIndex`] - Ordered `(page, count)` entries with prefix-sum lookup

mod page_index;

pub use page_index::{IndexEntry, Location, PageIndex};
