//! Page buffer and record-slot layout.
//!
//! - [`Page`] - A page-sized byte buffer viewed as fixed-width record slots

#[allow(clippy::module_inception)]
mod page;

pub use page::Page;
