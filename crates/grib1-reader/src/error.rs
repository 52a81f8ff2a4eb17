//! Error types for the read path.

use grib1_collection::IndexError;
use thiserror::Error;

/// Result type alias using ReadError.
pub type ReadResult<T> = Result<T, ReadError>;

/// Errors surfaced by opening a reader or running a read call.
///
/// Per-record I/O and decode failures are deliberately absent: the executor
/// contains those by filling the affected cells with NaN and logging a
/// warning, and the read call still succeeds.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The request is malformed (bad stride, inverted range).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Wrong number of ranges for the variable's rank.
    #[error("request has {actual} ranges, variable has rank {expected}")]
    RankMismatch { expected: usize, actual: usize },

    /// A range runs past the end of its axis.
    #[error("range {first}..={last} out of bounds for {axis} axis of length {len}")]
    AxisOutOfRange {
        axis: &'static str,
        first: usize,
        last: usize,
        len: usize,
    },

    /// No variable with the requested id or name.
    #[error("no such variable: {0}")]
    NoSuchVariable(String),

    /// Cooperative cancellation was observed between records.
    #[error("read cancelled")]
    Cancelled,

    /// The index was found to be inconsistent while planning the read.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// A parameter table file could not be loaded.
    #[error("parameter table: {0}")]
    Table(String),

    /// A diagnostic record access failed.
    #[error("diagnostic read failed: {0}")]
    Diagnostic(String),
}

impl ReadError {
    /// Create an InvalidRequest error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a Table error.
    pub fn table(msg: impl Into<String>) -> Self {
        Self::Table(msg.into())
    }
}
