//! Slicing read engine over GRIB1 collection indexes.
//!
//! This crate turns an in-memory collection index (see `grib1-collection`)
//! into a readable multidimensional dataset:
//!
//! - **Schema projection**: every logical variable gets a synthesized name,
//!   long name and units, laid out over coordinate variables in the
//!   canonical axis order (time, ensemble, vertical, y, x).
//! - **Slice reads**: a hyper-rectangular request is planned into per-record
//!   reads, sorted so each physical file is opened once and swept forward,
//!   decoded through an external [`Grib1Codec`], and assembled into a dense
//!   float buffer with NaN marking cells that have no backing message.
//! - **Time partitions**: the same read path works across partitioned
//!   collections, resolving each global time index to its sub-collection.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use grib1_reader::{CancelToken, Grib1Dataset, Grib1Reader, OpenOptions, Range};
//!
//! let reader = Grib1Reader::open(Grib1Dataset::Flat(collection), codec, OpenOptions::new())?;
//! let var = reader.schema().find_variable("Temperature_isobaric").unwrap();
//! let slab = reader.read(
//!     var.id,
//!     &[Range::single(0), Range::all(4), Range::all(73), Range::all(144)],
//!     &CancelToken::new(),
//! )?;
//! ```
//!
//! Request-shape problems (wrong rank, out-of-range axes) and index
//! corruption surface as errors before any file is opened; unavailable files
//! and undecodable messages are contained as NaN cells with a logged
//! warning.

pub mod cancel;
pub mod codec;
pub mod error;
pub mod exec;
pub mod naming;
pub mod options;
pub mod plan;
pub mod reader;
pub mod schema;
pub mod tables;

pub use cancel::CancelToken;
pub use codec::{CodecError, Grib1Codec, MessageHeader};
pub use error::{ReadError, ReadResult};
pub use exec::{FileOpener, SliceData};
pub use options::{OpenOptions, TableOption};
pub use plan::{DataRecord, Range};
pub use reader::{Grib1Dataset, Grib1Reader};
pub use schema::{
    AttrValue, AxisKind, CoordinateVariable, DataVariable, GridMapping, GroupSchema, Schema, VarId,
};
pub use tables::{
    ParameterDescriptor, ParameterTable, StandardTable, StatType, TableSet, VertUnit,
};
