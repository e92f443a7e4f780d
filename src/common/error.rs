//! Error types for the paged record table.

use std::path::PathBuf;

use thiserror::Error;

use super::PageId;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors raised by a table.
///
/// The variants fall into three families:
/// - out of range: a caller-supplied position, offset or count is outside
///   the current bounds. Nothing has been mutated.
/// - storage: the backing file failed a read or write. The handle should be
///   dropped and the table reopened.
/// - corrupt: persisted metadata could not be trusted while opening.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the data or metadata file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested page lies past the end of the data file.
    #[error("{0} not found")]
    PageNotFound(PageId),

    /// Logical record position outside the table.
    #[error("position {pos} out of range (size {size})")]
    PositionOutOfRange { pos: u64, size: u64 },

    /// Byte offset (or offset + access width) exceeds the record width.
    #[error("byte offset {offset} out of range (record width {width})")]
    ByteOffsetOutOfRange { offset: usize, width: usize },

    /// Deletion range runs past the end of the table.
    #[error("cannot delete {count} records at {pos} (size {size})")]
    DeleteOutOfRange { pos: u64, count: u64, size: u64 },

    /// Inserted buffer is not a whole number of records.
    #[error("buffer of {len} bytes is not a multiple of record width {width}")]
    RecordLength { len: usize, width: usize },

    /// Raw page buffer is not exactly one page long.
    #[error("buffer of {len} bytes does not match page size {page_size}")]
    PageLength { len: usize, page_size: usize },

    /// Persisted table state is missing, malformed or inconsistent.
    #[error("corrupt table: {0}")]
    Corrupt(String),

    /// Configuration values rejected by validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Tried to create a table over existing files.
    #[error("table already exists: {}", .0.display())]
    AlreadyExists(PathBuf),
}

impl Error {
    /// Returns true for errors caused by a caller-supplied bound.
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            Error::PositionOutOfRange { .. }
                | Error::ByteOffsetOutOfRange { .. }
                | Error::DeleteOutOfRange { .. }
                | Error::RecordLength { .. }
                | Error::PageLength { .. }
        )
    }

    /// Returns true for failures of the backing file.
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Io(_) | Error::PageNotFound(_))
    }

    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        Error::Corrupt(msg.into())
    }
}
