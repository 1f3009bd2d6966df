//! Error types for rowstore.

use thiserror::Error;

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors the storage engine can report.
///
/// Two kinds are ordinary negative results that leave the table untouched:
/// [`Error::DuplicateKey`] and [`Error::TableFull`]. Everything else means
/// the file could not be read or written, or its structure is broken.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the backing file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A page number at or beyond the table's page limit was requested.
    #[error("page {page} out of bounds (max {max})")]
    PageOutOfBounds { page: u32, max: usize },

    /// The file contents do not form a valid table.
    #[error("corrupt table file: {0}")]
    Corrupt(String),

    /// The key is already present in the table.
    #[error("duplicate key {0}")]
    DuplicateKey(u32),

    /// The insert would need an internal node split or more pages than
    /// the table may hold.
    #[error("table full")]
    TableFull,

    /// A column value exceeds its fixed width.
    #[error("{field} is longer than {max} bytes")]
    StringTooLong { field: &'static str, max: usize },
}

impl Error {
    /// Whether the error is a normal negative result of an insert.
    ///
    /// Recoverable errors are reported before any page is modified.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::DuplicateKey(_) | Error::TableFull)
    }
}
