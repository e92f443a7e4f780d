//! Table layout and store configuration.
//!
//! A [`TableConfig`] is fixed when a table is created and is persisted in the
//! metadata file; reopening a table reads it back instead of consulting any
//! global setting. [`StoreOptions`] are runtime knobs of one open handle.

use super::{Error, Result};

/// Default record width exponent (2^4 = 16-byte records).
pub const DEFAULT_RECORD_POWER: u8 = 4;

/// Default page size exponent (2^12 = 4096-byte pages).
pub const DEFAULT_PAGE_POWER: u8 = 12;

/// Default share of a page filled by a bulk load.
pub const DEFAULT_FILL_FACTOR: f64 = 0.75;

/// Smallest accepted page size exponent (64 bytes).
pub const MIN_PAGE_POWER: u8 = 6;

/// Largest accepted page size exponent (16 MiB).
pub const MAX_PAGE_POWER: u8 = 24;

/// Default number of pages held by the page cache.
pub const DEFAULT_CACHE_PAGES: usize = 64;

/// Extension of the paged data file.
pub const DATA_EXTENSION: &str = "tbl";

/// Extension of the metadata file.
pub const META_EXTENSION: &str = "meta";

/// Immutable layout of a table.
///
/// # Derived values
/// ```text
/// R = 2^record_power              record width in bytes
/// P = 2^page_power                page size in bytes
/// M = P / R                       records per page
/// F = max(1, floor(M * fill))     records per page after a bulk load
/// ```
///
/// # Example
/// ```
/// use pagetable::TableConfig;
///
/// let config = TableConfig::new(4, 12, 0.75).unwrap();
/// assert_eq!(config.record_width(), 16);
/// assert_eq!(config.max_records(), 256);
/// assert_eq!(config.fill_count(), 192);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableConfig {
    record_power: u8,
    page_power: u8,
    fill_factor: f64,
}

impl TableConfig {
    /// Create and validate a configuration.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` if the page size is outside the
    /// supported range, a record is wider than a page, or the fill factor
    /// is not in `(0, 1]`.
    pub fn new(record_power: u8, page_power: u8, fill_factor: f64) -> Result<Self> {
        let config = Self {
            record_power,
            page_power,
            fill_factor,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants listed on [`TableConfig::new`].
    pub fn validate(&self) -> Result<()> {
        if !(MIN_PAGE_POWER..=MAX_PAGE_POWER).contains(&self.page_power) {
            return Err(Error::InvalidConfig(format!(
                "page power {} outside [{}, {}]",
                self.page_power, MIN_PAGE_POWER, MAX_PAGE_POWER
            )));
        }
        if self.record_power > self.page_power {
            return Err(Error::InvalidConfig(format!(
                "record width 2^{} exceeds page size 2^{}",
                self.record_power, self.page_power
            )));
        }
        if !(self.fill_factor > 0.0 && self.fill_factor <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "fill factor {} outside (0, 1]",
                self.fill_factor
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn record_power(&self) -> u8 {
        self.record_power
    }

    #[inline]
    pub fn page_power(&self) -> u8 {
        self.page_power
    }

    #[inline]
    pub fn fill_factor(&self) -> f64 {
        self.fill_factor
    }

    /// Record width `R` in bytes.
    #[inline]
    pub fn record_width(&self) -> usize {
        1 << self.record_power
    }

    /// Page size in bytes.
    #[inline]
    pub fn page_size(&self) -> usize {
        1 << self.page_power
    }

    /// Page capacity `M` in records.
    #[inline]
    pub fn max_records(&self) -> usize {
        1 << (self.page_power - self.record_power)
    }

    /// Target used count `F` of a freshly built page.
    pub fn fill_count(&self) -> usize {
        let target = (self.max_records() as f64 * self.fill_factor).floor() as usize;
        target.clamp(1, self.max_records())
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            record_power: DEFAULT_RECORD_POWER,
            page_power: DEFAULT_PAGE_POWER,
            fill_factor: DEFAULT_FILL_FACTOR,
        }
    }
}

/// Runtime options of an open table. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Maximum number of pages kept in the page cache.
    pub cache_pages: usize,
    /// Whether `flush()` fsyncs the data and metadata files.
    pub sync_on_flush: bool,
}

impl StoreOptions {
    pub fn with_cache_pages(mut self, cache_pages: usize) -> Self {
        self.cache_pages = cache_pages;
        self
    }

    pub fn with_sync_on_flush(mut self, sync_on_flush: bool) -> Self {
        self.sync_on_flush = sync_on_flush;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache_pages == 0 {
            return Err(Error::InvalidConfig("cache_pages must be > 0".into()));
        }
        Ok(())
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            cache_pages: DEFAULT_CACHE_PAGES,
            sync_on_flush: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TableConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.record_width(), 16);
        assert_eq!(config.page_size(), 4096);
        assert_eq!(config.max_records(), 256);
        assert_eq!(config.fill_count(), 192);
    }

    #[test]
    fn test_fill_count_floors() {
        // M = 8, 8 * 0.7 = 5.6
        let config = TableConfig::new(3, 6, 0.7).unwrap();
        assert_eq!(config.max_records(), 8);
        assert_eq!(config.fill_count(), 5);

        let packed = TableConfig::new(3, 6, 1.0).unwrap();
        assert_eq!(packed.fill_count(), 8);

        // Never below one record per page
        let sparse = TableConfig::new(3, 6, 0.01).unwrap();
        assert_eq!(sparse.fill_count(), 1);
    }

    #[test]
    fn test_single_record_pages() {
        let config = TableConfig::new(6, 6, 0.5).unwrap();
        assert_eq!(config.max_records(), 1);
        assert_eq!(config.fill_count(), 1);
    }

    #[test]
    fn test_invalid_configs() {
        assert!(TableConfig::new(4, 5, 0.5).is_err());
        assert!(TableConfig::new(4, 25, 0.5).is_err());
        assert!(TableConfig::new(13, 12, 0.5).is_err());
        assert!(TableConfig::new(4, 12, 0.0).is_err());
        assert!(TableConfig::new(4, 12, 1.5).is_err());
        assert!(TableConfig::new(4, 12, f64::NAN).is_err());
    }

    #[test]
    fn test_store_options() {
        let options = StoreOptions::default().with_cache_pages(4).with_sync_on_flush(false);
        assert_eq!(options.cache_pages, 4);
        assert!(!options.sync_on_flush);
        assert!(options.validate().is_ok());
        assert!(StoreOptions::default().with_cache_pages(0).validate().is_err());
    }
}
