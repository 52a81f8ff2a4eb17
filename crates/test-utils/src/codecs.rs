//! Codec stubs with verifiable value patterns.

use std::sync::Mutex;

use chrono::{TimeZone, Utc};

use grib1_collection::RandomAccess;
use grib1_reader::{CodecError, Grib1Codec, MessageHeader};

type ValueFn = Box<dyn Fn(u64, usize, usize) -> f32 + Send + Sync>;

/// Codec stub producing `value(pos, y, x)` without touching stream bytes.
///
/// Every successful decode is logged by offset, so tests can assert seek
/// order within a file; specific offsets can be told to fail to exercise
/// the decode-failure policy.
pub struct PatternCodec {
    value: ValueFn,
    decoded: Mutex<Vec<u64>>,
    fail_at: Vec<u64>,
}

impl PatternCodec {
    pub fn new(value: impl Fn(u64, usize, usize) -> f32 + Send + Sync + 'static) -> Self {
        Self {
            value: Box::new(value),
            decoded: Mutex::new(Vec::new()),
            fail_at: Vec::new(),
        }
    }

    /// `grid[y, x] = y * 10 + x`, independent of the record.
    pub fn yx_pattern() -> Self {
        Self::new(|_, y, x| (y * 10 + x) as f32)
    }

    /// Every cell holds the same value.
    pub fn constant(v: f32) -> Self {
        Self::new(move |_, _, _| v)
    }

    /// Every cell holds the record's byte offset.
    pub fn offset_pattern() -> Self {
        Self::new(|pos, _, _| pos as f32)
    }

    /// Distinct value per (record, cell): `pos * 10000 + y * 100 + x`.
    pub fn placement() -> Self {
        Self::new(|pos, y, x| (pos as usize * 10_000 + y * 100 + x) as f32)
    }

    /// Fail decoding at this offset.
    pub fn failing_at(mut self, pos: u64) -> Self {
        self.fail_at.push(pos);
        self
    }

    /// Offsets decoded so far, in call order.
    pub fn decode_log(&self) -> Vec<u64> {
        self.decoded.lock().unwrap().clone()
    }
}

impl Grib1Codec for PatternCodec {
    fn is_valid_grib1(&self, _stream: &mut dyn RandomAccess) -> bool {
        true
    }

    fn decode(
        &self,
        _stream: &mut dyn RandomAccess,
        pos: u64,
        npoints: usize,
        _scan_mode: u8,
        nx: usize,
        dest: &mut [f32],
    ) -> Result<(), CodecError> {
        if self.fail_at.contains(&pos) {
            return Err(CodecError::Decode {
                pos,
                reason: "injected failure".to_string(),
            });
        }
        self.decoded.lock().unwrap().push(pos);
        for (i, cell) in dest.iter_mut().take(npoints).enumerate() {
            *cell = (self.value)(pos, i / nx, i % nx);
        }
        Ok(())
    }

    fn read_header(
        &self,
        _stream: &mut dyn RandomAccess,
        pos: u64,
    ) -> Result<MessageHeader, CodecError> {
        Ok(MessageHeader {
            center: 7,
            subcenter: 0,
            table_version: 2,
            parameter: 11,
            level_type: 100,
            level_value: 500.0,
            reference_time: Utc.with_ymd_and_hms(2014, 10, 24, 0, 0, 0).unwrap(),
            forecast_time: pos as i32,
            interval: None,
        })
    }
}
