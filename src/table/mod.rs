//! Table layer: the record-level API over the page store.

mod builder;
mod table_access;

pub use builder::TableBuilder;
pub use table_access::TableAccess;
