//! Slice requests and read planning.
//!
//! A request is one [`Range`] per axis in canonical order (time, ensemble,
//! vertical, y, x, with optional axes elided). The planner validates it,
//! resolves every selected (time, ensemble, vertical) cell to a physical
//! record location or the missing sentinel. Planning hydrates record tables
//! when needed but never opens data files.

use serde::{Deserialize, Serialize};

use grib1_collection::{
    calc_index, Grib1Collection, TimePartition, MISSING_RECORD,
};

use crate::error::{ReadError, ReadResult};

/// Selection along one axis: `first, first + stride, ..., <= last`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub first: usize,
    pub last: usize,
    pub stride: usize,
}

impl Range {
    pub fn new(first: usize, last: usize, stride: usize) -> Self {
        Self {
            first,
            last,
            stride,
        }
    }

    /// The whole axis: `0 ..= len-1` with stride 1. `len` must be nonzero.
    pub fn all(len: usize) -> Self {
        Self::new(0, len.saturating_sub(1), 1)
    }

    /// A single index.
    pub fn single(index: usize) -> Self {
        Self::new(index, index, 1)
    }

    /// Number of indexes the range enumerates. A well-formed range is never
    /// empty.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        (self.last - self.first) / self.stride + 1
    }

    /// Enumerate the selected indexes.
    pub fn iter(&self) -> impl Iterator<Item = usize> {
        (self.first..=self.last).step_by(self.stride)
    }

    fn check_form(&self) -> ReadResult<()> {
        if self.stride == 0 {
            return Err(ReadError::invalid_request(format!(
                "range {}..={} has stride 0",
                self.first, self.last
            )));
        }
        if self.first > self.last {
            return Err(ReadError::invalid_request(format!(
                "range first {} exceeds last {}",
                self.first, self.last
            )));
        }
        Ok(())
    }
}

/// One planned record read: a source location bound to a destination block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataRecord {
    /// Partition number; 0 for flat collections.
    pub partno: usize,
    pub fileno: u32,
    pub pos: u64,
    /// Flat position in the dense (t', e', v') prefix of the output, where
    /// primed indices count within the request's selection.
    pub result_index: usize,
}

impl DataRecord {
    pub fn is_missing(&self) -> bool {
        self.pos == MISSING_RECORD
    }

    /// Physical sort key: one sequential sweep per file, ascending offsets.
    pub fn sort_key(&self) -> (usize, u32, u64) {
        (self.partno, self.fileno, self.pos)
    }
}

/// Axis lengths of one variable, None where the axis is absent.
#[derive(Debug, Clone, Copy)]
pub struct AxisLens {
    pub nt: Option<usize>,
    pub nens: Option<usize>,
    pub nverts: Option<usize>,
    pub ny: usize,
    pub nx: usize,
}

/// A validated request split into canonical axes.
///
/// Absent axes hold a single zero index so iteration is uniform; `shape`
/// keeps only the supplied ranges' lengths, in request order.
#[derive(Debug, Clone)]
pub struct Selection {
    pub time: Range,
    pub ens: Range,
    pub vert: Range,
    pub y: Range,
    pub x: Range,
    pub shape: Vec<usize>,
}

/// Validate a request against a variable's axes.
///
/// Fails before any I/O on rank mismatch, malformed ranges, or ranges that
/// run past their axis.
pub fn validate(ranges: &[Range], axes: &AxisLens) -> ReadResult<Selection> {
    let rank = 2
        + usize::from(axes.nt.is_some())
        + usize::from(axes.nens.is_some())
        + usize::from(axes.nverts.is_some());
    if ranges.len() != rank {
        return Err(ReadError::RankMismatch {
            expected: rank,
            actual: ranges.len(),
        });
    }

    let mut supplied = ranges.iter();
    let mut shape = Vec::with_capacity(rank);
    let mut take = |axis: &'static str, len: Option<usize>| -> ReadResult<Range> {
        let Some(len) = len else {
            return Ok(Range::single(0));
        };
        let range = *supplied.next().expect("rank already checked");
        range.check_form()?;
        if range.last >= len {
            return Err(ReadError::AxisOutOfRange {
                axis,
                first: range.first,
                last: range.last,
                len,
            });
        }
        shape.push(range.len());
        Ok(range)
    };

    let time = take("time", axes.nt)?;
    let ens = take("ensemble", axes.nens)?;
    let vert = take("vertical", axes.nverts)?;
    let y = take("y", Some(axes.ny))?;
    let x = take("x", Some(axes.nx))?;

    Ok(Selection {
        time,
        ens,
        vert,
        y,
        x,
        shape,
    })
}

/// Plan a flat read: one record per (t, e, v) cell of the selection.
pub fn plan_flat(
    collection: &Grib1Collection,
    group: usize,
    variable: usize,
    sel: &Selection,
) -> ReadResult<Vec<DataRecord>> {
    let vi = collection.variable(group, variable)?;
    let (nens, nverts) = (vi.nens, vi.nverts);
    let records = collection.records(group, variable)?;

    let mut plan = Vec::with_capacity(sel.time.len() * sel.ens.len() * sel.vert.len());
    for (ti, t) in sel.time.iter().enumerate() {
        for (ei, e) in sel.ens.iter().enumerate() {
            for (li, l) in sel.vert.iter().enumerate() {
                let record = records[calc_index(t, e, l, nens, nverts)];
                plan.push(DataRecord {
                    partno: 0,
                    fileno: record.fileno,
                    pos: record.pos,
                    result_index: (ti * sel.ens.len() + ei) * sel.vert.len() + li,
                });
            }
        }
    }
    Ok(plan)
}

/// Plan a partitioned read: each selected global time index resolves through
/// the time union to a partition-local variable whose records are consulted.
///
/// Partitions that lack the variable plan as missing cells.
pub fn plan_partitioned(
    tp: &TimePartition,
    group: usize,
    variable: usize,
    sel: &Selection,
) -> ReadResult<Vec<DataRecord>> {
    let pg = tp.group(group)?;
    let pv = tp.variable(group, variable)?;
    let union = pg
        .time_unions
        .get(pv.time_idx)
        .ok_or(grib1_collection::IndexError::BadReference {
            kind: "time union",
            index: pv.time_idx,
        })?;

    let mut plan = Vec::with_capacity(sel.time.len() * sel.ens.len() * sel.vert.len());
    for (ti, t) in sel.time.iter().enumerate() {
        let (partno, local_t) =
            union
                .lookup(t)
                .ok_or(grib1_collection::IndexError::BadReference {
                    kind: "time index",
                    index: t,
                })?;

        match tp.vindex_for(pv, partno)? {
            Some((part_coll, vref)) => {
                let part_vi = part_coll.variable(vref.group, vref.variable)?;
                let (nens, nverts) = (part_vi.nens, part_vi.nverts);
                let records = part_coll.records(vref.group, vref.variable)?;
                for (ei, e) in sel.ens.iter().enumerate() {
                    for (li, l) in sel.vert.iter().enumerate() {
                        let record = records[calc_index(local_t, e, l, nens, nverts)];
                        plan.push(DataRecord {
                            partno,
                            fileno: record.fileno,
                            pos: record.pos,
                            result_index: (ti * sel.ens.len() + ei) * sel.vert.len() + li,
                        });
                    }
                }
            }
            None => {
                for (ei, _) in sel.ens.iter().enumerate() {
                    for (li, _) in sel.vert.iter().enumerate() {
                        plan.push(DataRecord {
                            partno,
                            fileno: 0,
                            pos: MISSING_RECORD,
                            result_index: (ti * sel.ens.len() + ei) * sel.vert.len() + li,
                        });
                    }
                }
            }
        }
    }
    Ok(plan)
}
