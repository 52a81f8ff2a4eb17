//! Schema projection: coordinate variables and named data variables.
//!
//! The projector maps an index into the dataset shape consumers see: one
//! group of variables per horizontal grid, each data variable laid out in
//! the canonical axis order (time, ensemble, vertical, y, x) with optional
//! axes elided. The projector is the ground truth for that order; the slice
//! planner interprets requests against it.

use grib1_collection::{
    EnsCoord, Grib1Collection, GridKind, HorizCoordSys, TimeCoord, TimeCoordUnion, TimePartition,
    TimeValues, VarDesc, VertCoord,
};

use crate::naming;
use crate::tables::ParameterTable;

/// Attribute value attached to a schema variable.
///
/// A closed enum rather than JSON values: the missing-value attribute is
/// IEEE NaN, which a JSON number cannot carry.
#[derive(Debug, Clone)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Float(f64),
}

/// Floats compare bitwise so NaN fill attributes compare equal.
impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AttrValue::Str(a), AttrValue::Str(b)) => a == b,
            (AttrValue::Int(a), AttrValue::Int(b)) => a == b,
            (AttrValue::Float(a), AttrValue::Float(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for AttrValue {}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Str(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

/// Role of a coordinate variable in the canonical axis order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisKind {
    Time,
    Ensemble,
    Vertical,
    Y,
    X,
}

/// One coordinate variable of a group.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateVariable {
    pub name: String,
    pub axis: AxisKind,
    pub units: String,
    pub values: Vec<f64>,
    /// (start, end) bounds, published as the `<name>_bounds` child; present
    /// for interval time axes and layer vertical axes.
    pub bounds: Option<Vec<[f64; 2]>>,
}

impl CoordinateVariable {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Name of the bounds child variable.
    pub fn bounds_name(&self) -> String {
        format!("{}_bounds", self.name)
    }
}

/// Identity of a data variable inside the reader's index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId {
    pub group: usize,
    pub variable: usize,
}

/// One data variable of the projected schema.
#[derive(Debug, Clone, PartialEq)]
pub struct DataVariable {
    pub id: VarId,
    pub name: String,
    pub long_name: String,
    pub units: String,
    /// Dimension names in canonical order (time, ensemble?, vertical?, y, x).
    pub dims: Vec<String>,
    /// Axis lengths matching `dims`.
    pub shape: Vec<usize>,
    pub attributes: Vec<(String, AttrValue)>,
}

/// Scalar variable carrying projection parameters for projected grids.
#[derive(Debug, Clone, PartialEq)]
pub struct GridMapping {
    pub name: String,
    pub attributes: Vec<(String, AttrValue)>,
}

/// Schema of one horizontal group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSchema {
    pub name: String,
    pub coords: Vec<CoordinateVariable>,
    pub grid_mapping: Option<GridMapping>,
    pub variables: Vec<DataVariable>,
}

/// Projected schema of a whole collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub groups: Vec<GroupSchema>,
}

impl Schema {
    /// Find a data variable by name, searching groups in order.
    pub fn find_variable(&self, name: &str) -> Option<&DataVariable> {
        self.groups
            .iter()
            .flat_map(|g| g.variables.iter())
            .find(|v| v.name == name)
    }

    /// The data variable with the given id.
    pub fn variable(&self, id: VarId) -> Option<&DataVariable> {
        self.groups.get(id.group)?.variables.get(id.variable)
    }
}

fn time_coordinate(tc: &TimeCoord) -> CoordinateVariable {
    let (values, bounds) = time_values(&tc.values);
    CoordinateVariable {
        name: tc.name.clone(),
        axis: AxisKind::Time,
        units: tc.units_string(),
        values,
        bounds,
    }
}

fn union_coordinate(tu: &TimeCoordUnion) -> CoordinateVariable {
    let (values, bounds) = time_values(&tu.values);
    CoordinateVariable {
        name: tu.name.clone(),
        axis: AxisKind::Time,
        units: tu.units_string(),
        values,
        bounds,
    }
}

/// Point values and bounds of a time axis. Interval axes report the interval
/// end as the point value, with the full pair in the bounds.
fn time_values(values: &TimeValues) -> (Vec<f64>, Option<Vec<[f64; 2]>>) {
    match values {
        TimeValues::Offsets(offsets) => (offsets.iter().map(|&o| o as f64).collect(), None),
        TimeValues::Intervals(intervals) => (
            intervals.iter().map(|&(_, end)| end as f64).collect(),
            Some(
                intervals
                    .iter()
                    .map(|&(start, end)| [start as f64, end as f64])
                    .collect(),
            ),
        ),
    }
}

fn vert_coordinate(vc: &VertCoord) -> CoordinateVariable {
    let values = vc.levels.iter().map(|l| vc.coord_value(l)).collect();
    let bounds = vc
        .is_layer
        .then(|| vc.levels.iter().map(|l| [l.value1, l.value2]).collect());
    CoordinateVariable {
        name: vc.name.clone(),
        axis: AxisKind::Vertical,
        units: vc.unit.clone(),
        values,
        bounds,
    }
}

fn ens_coordinate(ec: &EnsCoord) -> CoordinateVariable {
    CoordinateVariable {
        name: ec.name.clone(),
        axis: AxisKind::Ensemble,
        units: String::new(),
        values: ec.members.iter().map(|&m| m as f64).collect(),
        bounds: None,
    }
}

/// Horizontal coordinate variables plus the grid mapping, and the (y, x)
/// dimension names data variables reference.
fn horizontal_coords(
    hcs: &HorizCoordSys,
) -> (Vec<CoordinateVariable>, Option<GridMapping>, (String, String)) {
    match &hcs.kind {
        GridKind::Projected(projection) => {
            let coords = vec![
                CoordinateVariable {
                    name: "y".to_string(),
                    axis: AxisKind::Y,
                    units: "km".to_string(),
                    values: hcs.y_values(),
                    bounds: None,
                },
                CoordinateVariable {
                    name: "x".to_string(),
                    axis: AxisKind::X,
                    units: "km".to_string(),
                    values: hcs.x_values(),
                    bounds: None,
                },
            ];
            let mut attributes = vec![(
                "grid_mapping_name".to_string(),
                AttrValue::from(projection.name.as_str()),
            )];
            attributes.extend(
                projection
                    .params
                    .iter()
                    .map(|(k, v)| (k.clone(), AttrValue::from(*v))),
            );
            let mapping = GridMapping {
                name: projection.name.clone(),
                attributes,
            };
            (coords, Some(mapping), ("y".to_string(), "x".to_string()))
        }
        GridKind::LatLon | GridKind::Gaussian => {
            let coords = vec![
                CoordinateVariable {
                    name: "lat".to_string(),
                    axis: AxisKind::Y,
                    units: "degrees_north".to_string(),
                    values: hcs.y_values(),
                    bounds: None,
                },
                CoordinateVariable {
                    name: "lon".to_string(),
                    axis: AxisKind::X,
                    units: "degrees_east".to_string(),
                    values: hcs.x_values(),
                    bounds: None,
                },
            ];
            (coords, None, ("lat".to_string(), "lon".to_string()))
        }
    }
}

/// Axis dimensions of one variable: (name, length) where present.
struct VarAxes {
    time: Option<(String, usize)>,
    ens: Option<(String, usize)>,
    vert: Option<(String, usize)>,
}

#[allow(clippy::too_many_arguments)]
fn data_variable(
    id: VarId,
    desc: &VarDesc,
    name: String,
    center: i32,
    subcenter: i32,
    table: &dyn ParameterTable,
    axes: VarAxes,
    y_dim: (&str, usize),
    x_dim: (&str, usize),
    grid_mapping: Option<&str>,
) -> DataVariable {
    let long_name = naming::long_name(table, center, subcenter, desc);
    let units = naming::units(table, center, subcenter, desc);

    let mut dims = Vec::with_capacity(5);
    let mut shape = Vec::with_capacity(5);
    for axis in [&axes.time, &axes.ens, &axes.vert] {
        if let Some((dim_name, len)) = axis {
            dims.push(dim_name.clone());
            shape.push(*len);
        }
    }
    dims.push(y_dim.0.to_string());
    shape.push(y_dim.1);
    dims.push(x_dim.0.to_string());
    shape.push(x_dim.1);

    let mut attributes: Vec<(String, AttrValue)> = vec![
        ("long_name".to_string(), AttrValue::from(long_name.clone())),
        ("units".to_string(), AttrValue::from(units.clone())),
        ("missing_value".to_string(), AttrValue::Float(f64::NAN)),
        ("_FillValue".to_string(), AttrValue::Float(f64::NAN)),
    ];
    if let Some(mapping) = grid_mapping {
        attributes.push(("grid_mapping".to_string(), AttrValue::from(mapping)));
    }
    attributes.push(("Grib1_Center".to_string(), AttrValue::Int(center.into())));
    attributes.push((
        "Grib1_Subcenter".to_string(),
        AttrValue::Int(subcenter.into()),
    ));
    attributes.push((
        "Grib1_TableVersion".to_string(),
        AttrValue::Int(desc.table_version.into()),
    ));
    attributes.push((
        "Grib1_Parameter".to_string(),
        AttrValue::Int(desc.parameter.into()),
    ));
    if let Some(code) = desc.level_type {
        attributes.push(("Grib1_Level_Type".to_string(), AttrValue::Int(code.into())));
    }
    if let Some(intv) = desc.intv_type {
        attributes.push((
            "Grib1_Interval_Type".to_string(),
            AttrValue::Int(intv.into()),
        ));
    }
    if let Some(derived) = desc.ens_derived_type {
        attributes.push((
            "Grib1_Ensemble_Derived_Type".to_string(),
            AttrValue::Int(derived.into()),
        ));
    }
    if let Some(prob) = &desc.probability_name {
        attributes.push((
            "Grib1_Probability_Name".to_string(),
            AttrValue::from(prob.as_str()),
        ));
    }

    DataVariable {
        id,
        name,
        long_name,
        units,
        dims,
        shape,
        attributes,
    }
}

/// Deterministic group names from grid shapes, disambiguated positionally.
fn group_names<'a>(grids: impl Iterator<Item = &'a HorizCoordSys>) -> Vec<String> {
    naming::disambiguate(
        grids
            .map(|h| format!("grid_{}x{}", h.ny, h.nx))
            .collect(),
    )
}

/// Project a flat collection into its schema.
pub fn project_collection(collection: &Grib1Collection, table: &dyn ParameterTable) -> Schema {
    let names = group_names(collection.groups.iter().map(|g| &g.hcs));
    let groups = collection
        .groups
        .iter()
        .enumerate()
        .map(|(gi, g)| {
            let mut coords: Vec<CoordinateVariable> =
                g.time_coords.iter().map(time_coordinate).collect();
            coords.extend(g.vert_coords.iter().map(vert_coordinate));
            coords.extend(g.ens_coords.iter().map(ens_coordinate));
            let (horizontal, grid_mapping, (y_name, x_name)) = horizontal_coords(&g.hcs);
            coords.extend(horizontal);

            let short_names = naming::disambiguate(
                g.variables
                    .iter()
                    .map(|vi| {
                        naming::short_name(table, collection.center, collection.subcenter, &vi.desc)
                    })
                    .collect(),
            );
            let variables = g
                .variables
                .iter()
                .zip(short_names)
                .enumerate()
                .map(|(vidx, (vi, name))| {
                    let axes = VarAxes {
                        time: vi
                            .time_idx
                            .map(|i| (g.time_coords[i].name.clone(), g.time_coords[i].len())),
                        ens: vi
                            .ens_idx
                            .map(|i| (g.ens_coords[i].name.clone(), g.ens_coords[i].len())),
                        vert: vi
                            .vert_idx
                            .map(|i| (g.vert_coords[i].name.clone(), g.vert_coords[i].len())),
                    };
                    data_variable(
                        VarId {
                            group: gi,
                            variable: vidx,
                        },
                        &vi.desc,
                        name,
                        collection.center,
                        collection.subcenter,
                        table,
                        axes,
                        (y_name.as_str(), g.hcs.ny),
                        (x_name.as_str(), g.hcs.nx),
                        grid_mapping.as_ref().map(|m| m.name.as_str()),
                    )
                })
                .collect();

            GroupSchema {
                name: names[gi].clone(),
                coords,
                grid_mapping,
                variables,
            }
        })
        .collect();
    Schema { groups }
}

/// Project a time-partitioned collection into its schema. Identical to the
/// flat projection except that time axes come from the partition unions.
pub fn project_partition(tp: &TimePartition, table: &dyn ParameterTable) -> Schema {
    let names = group_names(tp.groups.iter().map(|g| &g.hcs));
    let groups = tp
        .groups
        .iter()
        .enumerate()
        .map(|(gi, g)| {
            let mut coords: Vec<CoordinateVariable> =
                g.time_unions.iter().map(union_coordinate).collect();
            coords.extend(g.vert_coords.iter().map(vert_coordinate));
            coords.extend(g.ens_coords.iter().map(ens_coordinate));
            let (horizontal, grid_mapping, (y_name, x_name)) = horizontal_coords(&g.hcs);
            coords.extend(horizontal);

            let short_names = naming::disambiguate(
                g.variables
                    .iter()
                    .map(|pv| naming::short_name(table, tp.center, tp.subcenter, &pv.desc))
                    .collect(),
            );
            let variables = g
                .variables
                .iter()
                .zip(short_names)
                .enumerate()
                .map(|(vidx, (pv, name))| {
                    let union = &g.time_unions[pv.time_idx];
                    let axes = VarAxes {
                        time: Some((union.name.clone(), union.len())),
                        ens: pv
                            .ens_idx
                            .map(|i| (g.ens_coords[i].name.clone(), g.ens_coords[i].len())),
                        vert: pv
                            .vert_idx
                            .map(|i| (g.vert_coords[i].name.clone(), g.vert_coords[i].len())),
                    };
                    data_variable(
                        VarId {
                            group: gi,
                            variable: vidx,
                        },
                        &pv.desc,
                        name,
                        tp.center,
                        tp.subcenter,
                        table,
                        axes,
                        (y_name.as_str(), g.hcs.ny),
                        (x_name.as_str(), g.hcs.nx),
                        grid_mapping.as_ref().map(|m| m.name.as_str()),
                    )
                })
                .collect();

            GroupSchema {
                name: names[gi].clone(),
                coords,
                grid_mapping,
                variables,
            }
        })
        .collect();
    Schema { groups }
}
