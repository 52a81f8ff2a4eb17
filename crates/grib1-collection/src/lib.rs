//! In-memory index model for GRIB1 collections.
//!
//! A collection presents many GRIB1 messages, usually spread over many
//! physical files, as a set of logical variables laid out over named
//! coordinate axes. This crate holds the typed index of that layout:
//!
//! - [`Grib1Collection`]: the root of a flat collection: groups, file
//!   handles, record tables.
//! - [`Group`]: all variables sharing one horizontal grid, together with the
//!   time, vertical and ensemble axes they index into.
//! - [`VariableIndex`]: one logical variable and its dense record table,
//!   mapping every (time, ensemble, vertical) cell to a message location or
//!   the missing sentinel.
//! - [`TimePartition`]: a collection whose time axis concatenates several
//!   sub-collections, each with its own files, opened lazily.
//!
//! The index is immutable after load. The two mutable moments, record-table
//! hydration and partition opening, happen at most once each, behind
//! per-variable and per-partition locks, so concurrent readers are safe.
//!
//! Decoding GRIB1 messages, building indexes from directory scans and
//! projecting variables into a dataset schema all live elsewhere; this crate
//! is the data model they share.

pub mod collection;
pub mod coords;
pub mod error;
pub mod grid;
pub mod magic;
pub mod partition;
pub mod variable;

pub use collection::{
    FileListSource, FileSource, Grib1Collection, Group, MemoryFileSource, RandomAccess,
    RecordSource,
};
pub use coords::{EnsCoord, Level, TimeCoord, TimeValues, VertCoord};
pub use error::{IndexError, IndexResult};
pub use grid::{GridKind, HorizCoordSys, Projection};
pub use magic::{index_kind, IndexKind, MAGIC_COLLECTION, MAGIC_PARTITION};
pub use partition::{
    PartVarRef, Partition, PartitionGroup, PartitionSource, TimeCoordUnion, TimePartition,
    VariableIndexPartitioned,
};
pub use variable::{calc_index, Record, VarDesc, VariableIndex, MISSING_RECORD};
