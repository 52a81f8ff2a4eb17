//! The reader facade: open a collection, expose its schema, answer reads.

use std::fmt::Write as _;
use std::io;
use std::sync::Arc;

use tracing::{debug, info};

use grib1_collection::{
    calc_index, Grib1Collection, RandomAccess, TimePartition,
};

use crate::cancel::CancelToken;
use crate::codec::{Grib1Codec, MessageHeader};
use crate::error::{ReadError, ReadResult};
use crate::exec::{execute, ExecSpec, FileOpener, SliceData};
use crate::options::OpenOptions;
use crate::plan::{plan_flat, plan_partitioned, validate, AxisLens, Range};
use crate::schema::{project_collection, project_partition, Schema, VarId};

/// An opened GRIB1 dataset: flat, or partitioned over time.
pub enum Grib1Dataset {
    Flat(Grib1Collection),
    Partitioned(TimePartition),
}

/// Read handle over an opened collection index.
///
/// The reader is immutable and safe to share across threads; concurrent
/// read calls each hold at most one file handle of their own.
pub struct Grib1Reader {
    dataset: Arc<Grib1Dataset>,
    codec: Arc<dyn Grib1Codec>,
    schema: Schema,
}

impl Grib1Reader {
    /// Open a reader over a dataset, projecting its schema.
    pub fn open(
        dataset: Grib1Dataset,
        codec: Arc<dyn Grib1Codec>,
        options: OpenOptions,
    ) -> ReadResult<Self> {
        let table = options.build_table()?;
        let schema = match &dataset {
            Grib1Dataset::Flat(c) => project_collection(c, table.as_ref()),
            Grib1Dataset::Partitioned(tp) => project_partition(tp, table.as_ref()),
        };
        info!(
            groups = schema.groups.len(),
            variables = schema
                .groups
                .iter()
                .map(|g| g.variables.len())
                .sum::<usize>(),
            "opened GRIB1 dataset"
        );
        Ok(Self {
            dataset: Arc::new(dataset),
            codec,
            schema,
        })
    }

    /// The projected schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Primary entry: read a hyper-rectangular slice of one variable.
    ///
    /// `ranges` supplies one range per axis in the variable's canonical
    /// order. Cells with no backing message come back as NaN.
    pub fn read(&self, id: VarId, ranges: &[Range], cancel: &CancelToken) -> ReadResult<SliceData> {
        debug!(group = id.group, variable = id.variable, rank = ranges.len(), "read");
        match self.dataset.as_ref() {
            Grib1Dataset::Flat(c) => self.read_flat(c, id, ranges, cancel),
            Grib1Dataset::Partitioned(tp) => self.read_partitioned(tp, id, ranges, cancel),
        }
    }

    /// Read by variable name, searching groups in order.
    pub fn read_by_name(
        &self,
        name: &str,
        ranges: &[Range],
        cancel: &CancelToken,
    ) -> ReadResult<SliceData> {
        let var = self
            .schema
            .find_variable(name)
            .ok_or_else(|| ReadError::NoSuchVariable(name.to_string()))?;
        self.read(var.id, ranges, cancel)
    }

    fn read_flat(
        &self,
        collection: &Grib1Collection,
        id: VarId,
        ranges: &[Range],
        cancel: &CancelToken,
    ) -> ReadResult<SliceData> {
        let group = collection.group(id.group)?;
        let vi = collection.variable(id.group, id.variable)?;
        let axes = AxisLens {
            nt: vi.time_idx.map(|i| group.time_coords[i].len()),
            nens: vi.ens_idx.map(|i| group.ens_coords[i].len()),
            nverts: vi.vert_idx.map(|i| group.vert_coords[i].len()),
            ny: group.hcs.ny,
            nx: group.hcs.nx,
        };
        let sel = validate(ranges, &axes)?;
        let plan = plan_flat(collection, id.group, id.variable, &sel)?;
        let spec = ExecSpec {
            nx: group.hcs.nx,
            ny: group.hcs.ny,
            scan_mode: group.hcs.scan_mode,
            sel: &sel,
        };
        execute(
            plan,
            &spec,
            &FlatOpener { collection },
            self.codec.as_ref(),
            cancel,
        )
    }

    fn read_partitioned(
        &self,
        tp: &TimePartition,
        id: VarId,
        ranges: &[Range],
        cancel: &CancelToken,
    ) -> ReadResult<SliceData> {
        let group = tp.group(id.group)?;
        let pv = tp.variable(id.group, id.variable)?;
        let axes = AxisLens {
            nt: Some(group.time_unions[pv.time_idx].len()),
            nens: pv.ens_idx.map(|i| group.ens_coords[i].len()),
            nverts: pv.vert_idx.map(|i| group.vert_coords[i].len()),
            ny: group.hcs.ny,
            nx: group.hcs.nx,
        };
        let sel = validate(ranges, &axes)?;
        let plan = plan_partitioned(tp, id.group, id.variable, &sel)?;
        let spec = ExecSpec {
            nx: group.hcs.nx,
            ny: group.hcs.ny,
            scan_mode: group.hcs.scan_mode,
            sel: &sel,
        };
        execute(
            plan,
            &spec,
            &PartitionOpener { tp },
            self.codec.as_ref(),
            cancel,
        )
    }

    /// Diagnostic: read the message header backing one (t, e, v) cell.
    ///
    /// Returns None for a missing cell. Not on the read hot path.
    pub fn record_header(
        &self,
        id: VarId,
        t: usize,
        e: usize,
        v: usize,
    ) -> ReadResult<Option<MessageHeader>> {
        let (partno, record) = match self.dataset.as_ref() {
            Grib1Dataset::Flat(c) => {
                let vi = c.variable(id.group, id.variable)?;
                let records = c.records(id.group, id.variable)?;
                let index = calc_index(t, e, v, vi.nens, vi.nverts);
                let record = *records.get(index).ok_or_else(|| {
                    ReadError::invalid_request(format!("cell ({t}, {e}, {v}) out of bounds"))
                })?;
                (0, record)
            }
            Grib1Dataset::Partitioned(tp) => {
                let group = tp.group(id.group)?;
                let pv = tp.variable(id.group, id.variable)?;
                let union = &group.time_unions[pv.time_idx];
                let (partno, local_t) = union.lookup(t).ok_or_else(|| {
                    ReadError::invalid_request(format!("time index {t} out of bounds"))
                })?;
                let Some((coll, vref)) = tp.vindex_for(pv, partno)? else {
                    return Ok(None);
                };
                let part_vi = coll.variable(vref.group, vref.variable)?;
                let records = coll.records(vref.group, vref.variable)?;
                let index = calc_index(local_t, e, v, part_vi.nens, part_vi.nverts);
                let record = *records.get(index).ok_or_else(|| {
                    ReadError::invalid_request(format!("cell ({t}, {e}, {v}) out of bounds"))
                })?;
                (partno, record)
            }
        };

        if record.is_missing() {
            return Ok(None);
        }
        let mut handle = self
            .open_data_file(partno, record.fileno)
            .map_err(|e| ReadError::Diagnostic(e.to_string()))?;
        let header = self
            .codec
            .read_header(handle.as_mut(), record.pos)
            .map_err(|e| ReadError::Diagnostic(e.to_string()))?;
        Ok(Some(header))
    }

    fn open_data_file(&self, partno: usize, fileno: u32) -> io::Result<Box<dyn RandomAccess>> {
        match self.dataset.as_ref() {
            Grib1Dataset::Flat(c) => c.open_file(fileno),
            Grib1Dataset::Partitioned(tp) => tp.open_file(partno, fileno),
        }
    }

    /// Diagnostic dump of the index: coordinate sizes and record counts per
    /// variable. Free-form; not parsed by any consumer.
    pub fn detail_info(&self) -> String {
        let mut out = String::new();
        match self.dataset.as_ref() {
            Grib1Dataset::Flat(c) => {
                let _ = writeln!(
                    out,
                    "collection {}: center {} subcenter {} table {}",
                    c.name, c.center, c.subcenter, c.local_table_version
                );
                for (gi, (g, gs)) in c.groups.iter().zip(&self.schema.groups).enumerate() {
                    let _ = writeln!(
                        out,
                        "  group {} [{}]: {} x {}",
                        gi, gs.name, g.hcs.ny, g.hcs.nx
                    );
                    for tc in &g.time_coords {
                        let _ = writeln!(out, "    time {}: {} ({})", tc.name, tc.len(), tc.units_string());
                    }
                    for vc in &g.vert_coords {
                        let _ = writeln!(out, "    vert {}: {} ({})", vc.name, vc.len(), vc.unit);
                    }
                    for ec in &g.ens_coords {
                        let _ = writeln!(out, "    ens {}: {}", ec.name, ec.len());
                    }
                    for (vi, var) in g.variables.iter().zip(&gs.variables) {
                        let state = match vi.records() {
                            Some(records) => {
                                let present =
                                    records.iter().filter(|r| !r.is_missing()).count();
                                format!("{present}/{} records", records.len())
                            }
                            None => "records not hydrated".to_string(),
                        };
                        let _ = writeln!(out, "    var {}: {}", var.name, state);
                    }
                }
            }
            Grib1Dataset::Partitioned(tp) => {
                let _ = writeln!(
                    out,
                    "time partition {}: center {} subcenter {} table {}, {} partitions",
                    tp.name,
                    tp.center,
                    tp.subcenter,
                    tp.local_table_version,
                    tp.partitions.len()
                );
                for p in &tp.partitions {
                    let state = if p.opened().is_some() { "open" } else { "closed" };
                    let _ = writeln!(out, "  partition {}: {}", p.name, state);
                }
                for (gi, (g, gs)) in tp.groups.iter().zip(&self.schema.groups).enumerate() {
                    let _ = writeln!(
                        out,
                        "  group {} [{}]: {} x {}",
                        gi, gs.name, g.hcs.ny, g.hcs.nx
                    );
                    for tu in &g.time_unions {
                        let _ = writeln!(
                            out,
                            "    time {}: {} over {} partitions ({})",
                            tu.name,
                            tu.len(),
                            tp.partitions.len(),
                            tu.units_string()
                        );
                    }
                    for (pv, var) in g.variables.iter().zip(&gs.variables) {
                        let carried = pv.partvars.iter().filter(|p| p.is_some()).count();
                        let _ = writeln!(
                            out,
                            "    var {}: in {}/{} partitions",
                            var.name,
                            carried,
                            pv.partvars.len()
                        );
                    }
                }
            }
        }
        out
    }

    /// Release the reader. File handles are per-call and already closed;
    /// the index drops with the last clone of the dataset.
    pub fn close(self) {}
}

struct FlatOpener<'a> {
    collection: &'a Grib1Collection,
}

impl FileOpener for FlatOpener<'_> {
    fn open(&self, _partno: usize, fileno: u32) -> io::Result<Box<dyn RandomAccess>> {
        self.collection.open_file(fileno)
    }
}

struct PartitionOpener<'a> {
    tp: &'a TimePartition,
}

impl FileOpener for PartitionOpener<'_> {
    fn open(&self, partno: usize, fileno: u32) -> io::Result<Box<dyn RandomAccess>> {
        self.tp.open_file(partno, fileno)
    }
}
