//! Bulk creation of a new table.

use std::path::Path;

use log::info;

use crate::common::{Error, Result, StoreOptions, TableConfig};
use crate::index::PageIndex;
use crate::storage::PageStore;
use crate::table::TableAccess;

/// Creates a table from an initial run of records.
///
/// Pages are filled to `F` records (the configured fill count) so that later
/// inserts have headroom before the first split. The last page may hold
/// fewer.
///
/// # Example
/// ```no_run
/// use pagetable::{StoreOptions, TableBuilder, TableConfig};
///
/// let records = vec![0u8; 16 * 1000];
/// let table = TableBuilder::new(TableConfig::default())
///     .options(StoreOptions::default().with_cache_pages(16))
///     .build("/tmp", "bulk", &records)?;
/// assert_eq!(table.size(), 1000);
/// # Ok::<(), pagetable::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TableBuilder {
    config: TableConfig,
    options: StoreOptions,
}

impl TableBuilder {
    pub fn new(config: TableConfig) -> Self {
        Self {
            config,
            options: StoreOptions::default(),
        }
    }

    /// Options of the handle returned by [`TableBuilder::build`].
    pub fn options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    /// Write `records` as table `name` in `dir`, flush it, and return the
    /// open table.
    ///
    /// # Errors
    /// - `Error::RecordLength` if `records` is not a whole number of records
    /// - `Error::AlreadyExists` if the table files are already present
    pub fn build<P: AsRef<Path>>(self, dir: P, name: &str, records: &[u8]) -> Result<TableAccess> {
        self.config.validate()?;
        let width = self.config.record_width();
        if records.len() % width != 0 {
            return Err(Error::RecordLength {
                len: records.len(),
                width,
            });
        }

        let mut store = PageStore::create(dir, name, self.config, self.options)?;
        let mut index = PageIndex::new();

        for chunk in records.chunks(self.config.fill_count() * width) {
            let page_id = store.allocate()?;
            store.with_page_mut(page_id, |page| page.write_records(0, width, chunk))?;
            index.insert_at(index.len(), page_id, chunk.len() / width);
        }
        store.flush(&index)?;

        info!(
            "built table {} with {} records in {} pages",
            name,
            index.size(),
            index.len()
        );
        Ok(TableAccess::from_parts(name, store, index))
    }
}
