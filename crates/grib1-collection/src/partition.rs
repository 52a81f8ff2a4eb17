//! Time-partitioned collections.
//!
//! A time partition presents several sub-collections, each with its own time
//! axis and file set, as one collection whose global time axis is the
//! concatenation-with-mapping of the partition axes. Partitions open lazily
//! and at most once.

use std::io;
use std::sync::{Arc, Mutex, OnceLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collection::{Grib1Collection, RandomAccess};
use crate::coords::{EnsCoord, TimeValues, VertCoord};
use crate::error::{IndexError, IndexResult};
use crate::grid::HorizCoordSys;
use crate::variable::VarDesc;

/// Source that opens one partition's collection index on demand.
pub trait PartitionSource: Send + Sync {
    fn open_partition(&self, partno: usize) -> IndexResult<Grib1Collection>;
}

/// One sub-collection of a time partition, opened lazily.
pub struct Partition {
    pub name: String,
    slot: OnceLock<Arc<Grib1Collection>>,
    open_lock: Mutex<()>,
}

impl Partition {
    /// A partition that will be opened through the partition source.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slot: OnceLock::new(),
            open_lock: Mutex::new(()),
        }
    }

    /// A partition whose collection is already open.
    pub fn preopened(name: impl Into<String>, collection: Grib1Collection) -> Self {
        let partition = Self::new(name);
        let _ = partition.slot.set(Arc::new(collection));
        partition
    }

    /// The partition's collection, if already open.
    pub fn opened(&self) -> Option<Arc<Grib1Collection>> {
        self.slot.get().cloned()
    }

    /// The partition's collection, opening it through `source` on first use.
    ///
    /// At most one caller opens; concurrent callers block until the slot is
    /// populated.
    fn collection(
        &self,
        partno: usize,
        source: &dyn PartitionSource,
    ) -> IndexResult<Arc<Grib1Collection>> {
        if self.slot.get().is_none() {
            let _guard = self.open_lock.lock().expect("partition lock poisoned");
            if self.slot.get().is_none() {
                debug!(partition = %self.name, partno, "opening partition index");
                let opened = source.open_partition(partno)?;
                let _ = self.slot.set(Arc::new(opened));
            }
        }
        Ok(self
            .slot
            .get()
            .expect("partition slot just populated")
            .clone())
    }
}

/// Global time axis assembled from partition time axes.
///
/// Element `i` of `map` locates global time index `i` inside one partition.
/// The axis is monotone in time; the partition sequence need not be.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeCoordUnion {
    /// Axis name, unique within the group.
    pub name: String,
    /// Unit of the offsets (e.g. "Hour").
    pub unit: String,
    /// Reference time the offsets count from.
    pub reference: DateTime<Utc>,
    /// Assembled coordinate values, one per global index.
    pub values: TimeValues,
    /// (partition, local time index) per global index.
    pub map: Vec<(usize, usize)>,
}

impl TimeCoordUnion {
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// O(1): global time index to (partition, local time index).
    pub fn lookup(&self, t: usize) -> Option<(usize, usize)> {
        self.map.get(t).copied()
    }

    /// Units string in the "unit since reference" form.
    pub fn units_string(&self) -> String {
        format!(
            "{} since {}",
            self.unit,
            self.reference.format("%Y-%m-%dT%H:%M:%SZ")
        )
    }
}

/// Location of a partitioned variable inside one partition's collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartVarRef {
    pub group: usize,
    pub variable: usize,
}

/// A logical variable of a partitioned collection.
///
/// Carries the same ensemble/vertical layout as a flat variable; the time
/// axis is the partitioned union, and the records live in the per-partition
/// variable this resolves to.
#[derive(Debug, Clone)]
pub struct VariableIndexPartitioned {
    pub desc: VarDesc,
    /// Index of the owning group in the partitioned collection.
    pub group: usize,
    /// Index into the group's time unions.
    pub time_idx: usize,
    /// Index into the group's vertical coords.
    pub vert_idx: Option<usize>,
    /// Index into the group's ensemble coords.
    pub ens_idx: Option<usize>,
    /// Ensemble axis length (1 when the axis is absent).
    pub nens: usize,
    /// Vertical axis length (1 when the axis is absent).
    pub nverts: usize,
    /// Per-partition variable location; None when a partition lacks this
    /// variable, in which case its time steps read as missing.
    pub partvars: Vec<Option<PartVarRef>>,
}

/// Group of a partitioned collection.
#[derive(Debug)]
pub struct PartitionGroup {
    pub hcs: HorizCoordSys,
    pub time_unions: Vec<TimeCoordUnion>,
    pub vert_coords: Vec<VertCoord>,
    pub ens_coords: Vec<EnsCoord>,
    pub variables: Vec<VariableIndexPartitioned>,
}

/// Root of an opened time-partitioned index. Immutable after load.
pub struct TimePartition {
    pub name: String,
    pub center: i32,
    pub subcenter: i32,
    pub local_table_version: i32,
    pub gen_process_id: i32,
    pub groups: Vec<PartitionGroup>,
    pub partitions: Vec<Partition>,
    source: Option<Arc<dyn PartitionSource>>,
}

impl TimePartition {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        center: i32,
        subcenter: i32,
        local_table_version: i32,
        gen_process_id: i32,
        groups: Vec<PartitionGroup>,
        partitions: Vec<Partition>,
    ) -> Self {
        Self {
            name: name.into(),
            center,
            subcenter,
            local_table_version,
            gen_process_id,
            groups,
            partitions,
            source: None,
        }
    }

    /// Attach the source that opens partition indexes on first touch.
    pub fn with_partition_source(mut self, source: Arc<dyn PartitionSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn group(&self, group: usize) -> IndexResult<&PartitionGroup> {
        self.groups.get(group).ok_or(IndexError::BadReference {
            kind: "group",
            index: group,
        })
    }

    pub fn variable(
        &self,
        group: usize,
        variable: usize,
    ) -> IndexResult<&VariableIndexPartitioned> {
        self.group(group)?
            .variables
            .get(variable)
            .ok_or(IndexError::BadReference {
                kind: "variable",
                index: variable,
            })
    }

    /// The collection of one partition, opening it on first use.
    pub fn collection_for(&self, partno: usize) -> IndexResult<Arc<Grib1Collection>> {
        let partition = self.partitions.get(partno).ok_or(IndexError::BadReference {
            kind: "partition",
            index: partno,
        })?;
        match &self.source {
            Some(source) => partition.collection(partno, source.as_ref()),
            None => partition.opened().ok_or_else(|| {
                IndexError::partition_open(&partition.name, "no partition source attached")
            }),
        }
    }

    /// Resolve a partitioned variable in one partition: the partition's
    /// collection plus the location of the flat variable holding its records.
    ///
    /// Returns None when the partition does not carry the variable.
    pub fn vindex_for(
        &self,
        pv: &VariableIndexPartitioned,
        partno: usize,
    ) -> IndexResult<Option<(Arc<Grib1Collection>, PartVarRef)>> {
        let Some(vref) = pv.partvars.get(partno).copied().flatten() else {
            return Ok(None);
        };
        let collection = self.collection_for(partno)?;
        Ok(Some((collection, vref)))
    }

    /// Open a handle on one physical file of one partition. File numbers are
    /// scoped to the partition.
    pub fn open_file(&self, partno: usize, fileno: u32) -> io::Result<Box<dyn RandomAccess>> {
        let collection = self
            .collection_for(partno)
            .map_err(|e| io::Error::new(io::ErrorKind::NotFound, e.to_string()))?;
        collection.open_file(fileno)
    }
}
