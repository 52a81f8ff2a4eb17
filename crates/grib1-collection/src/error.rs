//! Error types for GRIB1 collection indexes.

use thiserror::Error;

/// Result type alias using IndexError.
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors raised while loading or interrogating a collection index.
///
/// All of these indicate a broken or inconsistent index and are fatal to the
/// operation that raised them.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The index stream does not start with a known magic tag.
    #[error("unrecognized index magic: {found:?}")]
    BadMagic { found: Vec<u8> },

    /// The index stream ended before the magic tag was complete.
    #[error("truncated index stream: {0}")]
    Truncated(String),

    /// A record table disagrees with the variable's coordinate sizes.
    #[error("record table for {variable} has {actual} entries, expected {expected}")]
    RecordCountMismatch {
        variable: String,
        expected: usize,
        actual: usize,
    },

    /// Record hydration was requested but no record source is attached.
    #[error("no record source attached for {0}")]
    NoRecordSource(String),

    /// A partition's index could not be opened.
    #[error("failed to open partition {name}: {reason}")]
    PartitionOpen { name: String, reason: String },

    /// Reference to a group, variable or partition that does not exist.
    #[error("no such {kind} at index {index}")]
    BadReference { kind: &'static str, index: usize },

    /// Underlying I/O failure while reading index data.
    #[error("index I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IndexError {
    /// Create a PartitionOpen error.
    pub fn partition_open(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PartitionOpen {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
