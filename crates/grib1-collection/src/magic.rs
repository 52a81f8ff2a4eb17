//! Magic tags identifying persisted index streams.
//!
//! An index stream opens with a short ASCII tag naming its kind; the decoder
//! for the remainder of the stream lives with the indexer, not here.

use crate::error::{IndexError, IndexResult};

/// ASCII tag opening a flat collection index stream.
pub const MAGIC_COLLECTION: &[u8] = b"GRIB1IDX";

/// ASCII tag opening a time-partitioned index stream.
pub const MAGIC_PARTITION: &[u8] = b"GRIB1PART";

/// The kind of index a stream holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Collection,
    TimePartition,
}

/// Classify an index stream by its magic prefix.
///
/// Both tags share the "GRIB1" prefix, so the longer one is checked first.
/// A stream shorter than the tag it starts to spell is reported as
/// truncated; anything else is a bad magic.
pub fn index_kind(data: &[u8]) -> IndexResult<IndexKind> {
    if data.starts_with(MAGIC_PARTITION) {
        return Ok(IndexKind::TimePartition);
    }
    if data.starts_with(MAGIC_COLLECTION) {
        return Ok(IndexKind::Collection);
    }
    if MAGIC_PARTITION.starts_with(data) || MAGIC_COLLECTION.starts_with(data) {
        return Err(IndexError::Truncated(format!(
            "{} bytes, magic tag incomplete",
            data.len()
        )));
    }
    Err(IndexError::BadMagic {
        found: data.iter().take(MAGIC_PARTITION.len()).copied().collect(),
    })
}
