//! Contract with the external GRIB1 message codec.
//!
//! The read path never parses message bytes itself: it dictates where to
//! read and where decoded grids land, and an implementation of
//! [`Grib1Codec`] does the rest.

use chrono::{DateTime, Utc};
use thiserror::Error;

use grib1_collection::RandomAccess;

/// Errors raised by a codec implementation.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The message at `pos` could not be decoded.
    #[error("GRIB1 decode failed at offset {pos}: {reason}")]
    Decode { pos: u64, reason: String },

    /// The bytes at `pos` are not a GRIB1 message.
    #[error("not a GRIB1 message at offset {pos}")]
    BadMessage { pos: u64 },

    /// Underlying stream failure.
    #[error("codec I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Metadata of one message, for diagnostics. Not on the read hot path.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageHeader {
    pub center: i32,
    pub subcenter: i32,
    pub table_version: u8,
    pub parameter: u8,
    pub level_type: u8,
    pub level_value: f64,
    pub reference_time: DateTime<Utc>,
    /// Forecast time in the message's time unit.
    pub forecast_time: i32,
    /// (start, end) statistic interval, when the message carries one.
    pub interval: Option<(i32, i32)>,
}

/// External GRIB1 message codec.
pub trait Grib1Codec: Send + Sync {
    /// True when the stream holds raw GRIB1 messages. Used when deciding
    /// whether a file set can be indexed at all; never on the read path.
    fn is_valid_grib1(&self, stream: &mut dyn RandomAccess) -> bool;

    /// Decode the full 2-D grid of the message at `pos` into `dest`.
    ///
    /// `dest` holds exactly `npoints` values; the codec writes them in
    /// row-major (y, x) order after undoing `scan_mode`.
    #[allow(clippy::too_many_arguments)]
    fn decode(
        &self,
        stream: &mut dyn RandomAccess,
        pos: u64,
        npoints: usize,
        scan_mode: u8,
        nx: usize,
        dest: &mut [f32],
    ) -> Result<(), CodecError>;

    /// Read the metadata of the message at `pos`.
    fn read_header(&self, stream: &mut dyn RandomAccess, pos: u64)
        -> Result<MessageHeader, CodecError>;
}
