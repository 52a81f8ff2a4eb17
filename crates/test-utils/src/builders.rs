//! Builders for small fully-specified collection indexes.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use grib1_collection::{
    EnsCoord, FileSource, Grib1Collection, GridKind, Group, HorizCoordSys, Level, PartVarRef,
    Partition, PartitionGroup, Record, RecordSource, TimeCoord, TimeCoordUnion, TimePartition,
    TimeValues, VarDesc, VariableIndex, VariableIndexPartitioned, VertCoord,
};

/// Reference time shared by generated indexes.
pub fn reference_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2014, 10, 24, 0, 0, 0).unwrap()
}

/// Regular lat/lon grid: 1-degree spacing from (0 E, 90 N) scanning south.
pub fn latlon_grid(nx: usize, ny: usize) -> HorizCoordSys {
    HorizCoordSys {
        kind: GridKind::LatLon,
        nx,
        ny,
        start_x: 0.0,
        start_y: 90.0,
        dx: 1.0,
        dy: -1.0,
        gauss_lats: None,
        scan_mode: 0,
    }
}

/// One variable of a generated index.
pub struct VarSpec {
    pub parameter: u8,
    pub level_type: Option<u8>,
    pub intv_type: Option<u8>,
    /// Dense record table, `nt * nens * nverts` entries in calc-index order.
    pub records: Vec<Record>,
}

impl VarSpec {
    pub fn new(parameter: u8, records: Vec<Record>) -> Self {
        Self {
            parameter,
            level_type: None,
            intv_type: None,
            records,
        }
    }

    pub fn at_level(mut self, level_type: u8) -> Self {
        self.level_type = Some(level_type);
        self
    }

    pub fn with_interval(mut self, intv_type: u8) -> Self {
        self.intv_type = Some(intv_type);
        self
    }
}

fn group_coords(
    time_offsets: &[i32],
    levels: &[f64],
    ens_members: &[i32],
) -> (Vec<TimeCoord>, Vec<VertCoord>, Vec<EnsCoord>) {
    let time_coords = if time_offsets.is_empty() {
        Vec::new()
    } else {
        vec![TimeCoord {
            name: "time".to_string(),
            unit: "Hour".to_string(),
            reference: reference_time(),
            values: TimeValues::Offsets(time_offsets.to_vec()),
        }]
    };
    let vert_coords = if levels.is_empty() {
        Vec::new()
    } else {
        vec![VertCoord {
            level_code: 100,
            is_layer: false,
            levels: levels.iter().map(|&v| Level::single(v)).collect(),
            name: "isobaric".to_string(),
            unit: "hPa".to_string(),
            positive_up: false,
            datum: None,
        }]
    };
    let ens_coords = if ens_members.is_empty() {
        Vec::new()
    } else {
        vec![EnsCoord {
            name: "ens".to_string(),
            members: ens_members.to_vec(),
        }]
    };
    (time_coords, vert_coords, ens_coords)
}

fn build_group(
    nx: usize,
    ny: usize,
    time_offsets: &[i32],
    levels: &[f64],
    ens_members: &[i32],
    vars: Vec<VarSpec>,
    materialize_records: bool,
) -> Group {
    let (time_coords, vert_coords, ens_coords) = group_coords(time_offsets, levels, ens_members);
    let nens = ens_members.len().max(1);
    let nverts = levels.len().max(1);
    let variables = vars
        .into_iter()
        .map(|vs| {
            let desc = VarDesc {
                table_version: 2,
                parameter: vs.parameter,
                level_type: vs.level_type,
                is_layer: false,
                intv_type: vs.intv_type,
                ens_derived_type: None,
                probability_name: None,
            };
            let time_idx = (!time_offsets.is_empty()).then_some(0);
            let vert_idx = (!levels.is_empty()).then_some(0);
            let ens_idx = (!ens_members.is_empty()).then_some(0);
            if materialize_records {
                VariableIndex::with_records(
                    desc, 0, time_idx, vert_idx, ens_idx, nens, nverts, vs.records,
                )
            } else {
                VariableIndex::new(desc, 0, time_idx, vert_idx, ens_idx, nens, nverts)
            }
        })
        .collect();
    Group {
        hcs: latlon_grid(nx, ny),
        time_coords,
        vert_coords,
        ens_coords,
        variables,
    }
}

/// A flat collection with one group. Axes with an empty slice are absent.
pub fn flat_collection(
    nx: usize,
    ny: usize,
    time_offsets: &[i32],
    levels: &[f64],
    ens_members: &[i32],
    vars: Vec<VarSpec>,
    files: Arc<dyn FileSource>,
) -> Grib1Collection {
    let group = build_group(nx, ny, time_offsets, levels, ens_members, vars, true);
    Grib1Collection::new("test-collection", 7, 0, 1, 81, vec![group], files)
}

/// A flat collection whose record tables hydrate from `records` on first
/// read. The VarSpec record tables are ignored in favor of the source.
pub fn lazy_flat_collection(
    nx: usize,
    ny: usize,
    time_offsets: &[i32],
    levels: &[f64],
    ens_members: &[i32],
    vars: Vec<VarSpec>,
    files: Arc<dyn FileSource>,
    records: Arc<dyn RecordSource>,
) -> Grib1Collection {
    let group = build_group(nx, ny, time_offsets, levels, ens_members, vars, false);
    Grib1Collection::new("test-collection", 7, 0, 1, 81, vec![group], files)
        .with_record_source(records)
}

/// One partition of a generated time partition.
pub struct PartitionSpec {
    pub name: String,
    /// Offsets of this partition's time steps on the shared reference time.
    pub time_offsets: Vec<i32>,
    /// One record per time step for the single variable.
    pub records: Vec<Record>,
    pub files: Arc<dyn FileSource>,
}

/// A time-partitioned dataset with one group and one variable (parameter 11
/// at level 100 is used throughout), preopened partitions, and a global time
/// axis assembled by sorting all partition time steps.
///
/// `absent_in` lists partitions that do not carry the variable; their time
/// steps read as missing.
pub fn partitioned_dataset(
    nx: usize,
    ny: usize,
    parts: Vec<PartitionSpec>,
    absent_in: &[usize],
) -> TimePartition {
    // assemble the global axis: (offset, partition, local index) sorted by time
    let mut steps: Vec<(i32, usize, usize)> = parts
        .iter()
        .enumerate()
        .flat_map(|(partno, p)| {
            p.time_offsets
                .iter()
                .enumerate()
                .map(move |(local, &off)| (off, partno, local))
        })
        .collect();
    steps.sort_unstable();

    let union = TimeCoordUnion {
        name: "time".to_string(),
        unit: "Hour".to_string(),
        reference: reference_time(),
        values: TimeValues::Offsets(steps.iter().map(|&(off, _, _)| off).collect()),
        map: steps.iter().map(|&(_, p, l)| (p, l)).collect(),
    };

    let partitions: Vec<Partition> = parts
        .into_iter()
        .map(|p| {
            let collection = flat_collection(
                nx,
                ny,
                &p.time_offsets,
                &[],
                &[],
                vec![VarSpec::new(11, p.records).at_level(100)],
                p.files,
            );
            Partition::preopened(p.name, collection)
        })
        .collect();

    let variable = VariableIndexPartitioned {
        desc: VarDesc {
            table_version: 2,
            parameter: 11,
            level_type: Some(100),
            is_layer: false,
            intv_type: None,
            ens_derived_type: None,
            probability_name: None,
        },
        group: 0,
        time_idx: 0,
        vert_idx: None,
        ens_idx: None,
        nens: 1,
        nverts: 1,
        partvars: (0..partitions.len())
            .map(|p| {
                (!absent_in.contains(&p)).then_some(PartVarRef {
                    group: 0,
                    variable: 0,
                })
            })
            .collect(),
    };

    let group = PartitionGroup {
        hcs: latlon_grid(nx, ny),
        time_unions: vec![union],
        vert_coords: Vec::new(),
        ens_coords: Vec::new(),
        variables: vec![variable],
    };

    TimePartition::new("test-partition", 7, 0, 1, 81, vec![group], partitions)
}
