//! The read executor: a file-ordered record sweep into a dense output buffer.

use std::io;

use tracing::warn;

use grib1_collection::RandomAccess;

use crate::cancel::CancelToken;
use crate::codec::Grib1Codec;
use crate::error::{ReadError, ReadResult};
use crate::plan::{DataRecord, Selection};

/// Dense float result of a read call; shape matches the request ranges.
///
/// Cells with no backing message hold NaN, and NaN is the documented
/// missing value of every data variable.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceData {
    pub shape: Vec<usize>,
    pub values: Vec<f32>,
}

impl SliceData {
    /// Value at a multi-index in request-shape coordinates.
    pub fn get(&self, index: &[usize]) -> Option<f32> {
        if index.len() != self.shape.len() {
            return None;
        }
        let mut flat = 0;
        for (&i, &dim) in index.iter().zip(&self.shape) {
            if i >= dim {
                return None;
            }
            flat = flat * dim + i;
        }
        self.values.get(flat).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Opens physical files for the executor; partition-aware.
pub trait FileOpener {
    fn open(&self, partno: usize, fileno: u32) -> io::Result<Box<dyn RandomAccess>>;
}

/// Grid geometry and selection the executor decodes and copies with.
pub struct ExecSpec<'a> {
    pub nx: usize,
    pub ny: usize,
    pub scan_mode: u8,
    pub sel: &'a Selection,
}

enum CurrentFile {
    None,
    Open {
        partno: usize,
        fileno: u32,
        handle: Box<dyn RandomAccess>,
    },
    /// Open failed once; every further record of this file skips.
    Failed { partno: usize, fileno: u32 },
}

impl CurrentFile {
    fn is_for(&self, key: (usize, u32)) -> bool {
        match self {
            CurrentFile::Open { partno, fileno, .. } | CurrentFile::Failed { partno, fileno } => {
                (*partno, *fileno) == key
            }
            CurrentFile::None => false,
        }
    }
}

/// Execute a planned read.
///
/// Sorts the plan by (partition, file, offset) so each file is opened once
/// and swept forward, decodes each present record's full grid into one
/// reused scratch buffer, and copies the requested y/x subrectangle into
/// place. A file that fails to open or a message that fails to decode
/// leaves its cells at NaN; the read still succeeds. Cancellation is polled
/// between records and discards the partial buffer.
pub fn execute(
    mut plan: Vec<DataRecord>,
    spec: &ExecSpec<'_>,
    opener: &dyn FileOpener,
    codec: &dyn Grib1Codec,
    cancel: &CancelToken,
) -> ReadResult<SliceData> {
    let total: usize = spec.sel.shape.iter().product();
    let mut values = vec![f32::NAN; total];

    plan.sort_unstable_by_key(DataRecord::sort_key);

    let xsel = spec.sel.x.len();
    let block = spec.sel.y.len() * xsel;
    let npoints = spec.nx * spec.ny;
    let mut scratch = vec![0f32; npoints];
    let mut current = CurrentFile::None;

    for record in &plan {
        if record.is_missing() {
            continue;
        }
        if cancel.is_cancelled() {
            return Err(ReadError::Cancelled);
        }

        let key = (record.partno, record.fileno);
        if !current.is_for(key) {
            // dropping the previous handle closes it
            current = match opener.open(record.partno, record.fileno) {
                Ok(handle) => CurrentFile::Open {
                    partno: record.partno,
                    fileno: record.fileno,
                    handle,
                },
                Err(err) => {
                    warn!(
                        partno = record.partno,
                        fileno = record.fileno,
                        error = %err,
                        "data file unavailable, cells stay missing"
                    );
                    CurrentFile::Failed {
                        partno: record.partno,
                        fileno: record.fileno,
                    }
                }
            };
        }
        let CurrentFile::Open { handle, .. } = &mut current else {
            continue;
        };

        if let Err(err) = codec.decode(
            handle.as_mut(),
            record.pos,
            npoints,
            spec.scan_mode,
            spec.nx,
            &mut scratch,
        ) {
            warn!(
                partno = record.partno,
                fileno = record.fileno,
                pos = record.pos,
                error = %err,
                "message decode failed, cells stay missing"
            );
            continue;
        }

        let mut out = record.result_index * block;
        for y in spec.sel.y.iter() {
            let row = y * spec.nx;
            for x in spec.sel.x.iter() {
                values[out] = scratch[row + x];
                out += 1;
            }
        }
    }

    Ok(SliceData {
        shape: spec.sel.shape.clone(),
        values,
    })
}
