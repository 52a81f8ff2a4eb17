//! Shared test utilities for the grib1-dataset workspace.
//!
//! Builders for small fully-specified indexes, codec stubs with verifiable
//! value patterns, and instrumented file/record sources for asserting open
//! order and hydration counts.

pub mod builders;
pub mod codecs;
pub mod sources;

pub use builders::{
    flat_collection, lazy_flat_collection, latlon_grid, partitioned_dataset, reference_time,
    PartitionSpec, VarSpec,
};
pub use codecs::PatternCodec;
pub use sources::{CountingRecords, TracingFiles, UnavailableFiles};
