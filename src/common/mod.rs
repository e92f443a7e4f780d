//! Common types shared across the table layers.
//!
//! - Configuration ([`TableConfig`], [`StoreOptions`])
//! - Error types
//! - Page identifiers

pub mod config;
pub mod error;
mod page_id;

pub use config::{StoreOptions, TableConfig};
pub use error::{Error, Result};
pub use page_id::PageId;
