//! Schema projection over real indexes: naming, attributes, idempotence.

use std::sync::Arc;

use grib1_collection::Record;
use grib1_reader::{
    AttrValue, CancelToken, Grib1Dataset, Grib1Reader, OpenOptions, Range, VarId,
};
use test_utils::{flat_collection, PatternCodec, TracingFiles, VarSpec};

fn two_var_reader() -> Grib1Reader {
    let files = TracingFiles::new(1);
    let collection = flat_collection(
        4,
        3,
        &[0, 6],
        &[500.0],
        &[],
        vec![
            VarSpec::new(11, vec![Record::new(0, 0), Record::new(0, 64)]).at_level(100),
            VarSpec::new(61, vec![Record::new(0, 128), Record::MISSING]).at_level(100),
        ],
        files,
    );
    Grib1Reader::open(
        Grib1Dataset::Flat(collection),
        Arc::new(PatternCodec::yx_pattern()),
        OpenOptions::new(),
    )
    .unwrap()
}

#[test]
fn test_variable_names_and_metadata() {
    let reader = two_var_reader();
    let schema = reader.schema();
    assert_eq!(schema.groups.len(), 1);
    let group = &schema.groups[0];
    assert_eq!(group.name, "grid_3x4");

    let tmp = &group.variables[0];
    assert_eq!(tmp.name, "Temperature_isobaric");
    assert_eq!(tmp.long_name, "Temperature @ isobaric");
    assert_eq!(tmp.units, "K");
    assert_eq!(tmp.dims, vec!["time", "isobaric", "lat", "lon"]);
    assert_eq!(tmp.shape, vec![2, 1, 3, 4]);

    let apcp = &group.variables[1];
    assert_eq!(apcp.name, "Total_precipitation_isobaric");
    assert_eq!(apcp.units, "kg/m^2");
}

#[test]
fn test_missing_value_attributes_are_nan() {
    let reader = two_var_reader();
    let var = reader.schema().find_variable("Temperature_isobaric").unwrap();

    let missing = var
        .attributes
        .iter()
        .find(|(k, _)| k == "missing_value")
        .map(|(_, v)| v)
        .unwrap();
    assert!(matches!(missing, AttrValue::Float(v) if v.is_nan()));

    let fill = var
        .attributes
        .iter()
        .find(|(k, _)| k == "_FillValue")
        .map(|(_, v)| v)
        .unwrap();
    assert!(matches!(fill, AttrValue::Float(v) if v.is_nan()));

    let parameter = var
        .attributes
        .iter()
        .find(|(k, _)| k == "Grib1_Parameter")
        .map(|(_, v)| v)
        .unwrap();
    assert_eq!(parameter, &AttrValue::Int(11));
}

#[test]
fn test_coordinate_variables_cover_all_axes() {
    let reader = two_var_reader();
    let group = &reader.schema().groups[0];

    let names: Vec<&str> = group.coords.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["time", "isobaric", "lat", "lon"]);

    let time = &group.coords[0];
    assert_eq!(time.values, vec![0.0, 6.0]);
    assert_eq!(time.units, "Hour since 2014-10-24T00:00:00Z");

    let lat = &group.coords[2];
    assert_eq!(lat.values, vec![90.0, 89.0, 88.0]);
    let lon = &group.coords[3];
    assert_eq!(lon.values, vec![0.0, 1.0, 2.0, 3.0]);
}

#[test]
fn test_name_collision_gets_numeric_suffix() {
    // two variables that synthesize the same base name
    let files = TracingFiles::new(1);
    let collection = flat_collection(
        4,
        3,
        &[0],
        &[],
        &[],
        vec![
            VarSpec::new(11, vec![Record::new(0, 0)]).at_level(1),
            VarSpec::new(11, vec![Record::new(0, 64)]).at_level(1),
        ],
        files,
    );
    let reader = Grib1Reader::open(
        Grib1Dataset::Flat(collection),
        Arc::new(PatternCodec::yx_pattern()),
        OpenOptions::new(),
    )
    .unwrap();

    let group = &reader.schema().groups[0];
    assert_eq!(group.variables[0].name, "Temperature_surface");
    assert_eq!(group.variables[1].name, "Temperature_surface_1");

    // pairwise distinct
    let mut names: Vec<&String> = group.variables.iter().map(|v| &v.name).collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), group.variables.len());
}

#[test]
fn test_open_is_idempotent() {
    let a = two_var_reader();
    let b = two_var_reader();
    assert_eq!(a.schema(), b.schema());
}

#[test]
fn test_detail_info_mentions_variables_and_records() {
    let reader = two_var_reader();
    let info = reader.detail_info();
    assert!(info.contains("test-collection"));
    assert!(info.contains("Temperature_isobaric"));
    // two records, both present for the first variable
    assert!(info.contains("2/2 records"));
    // one of the precipitation records is missing
    assert!(info.contains("1/2 records"));
}

#[test]
fn test_record_header_diagnostic() {
    let reader = two_var_reader();
    let id = VarId {
        group: 0,
        variable: 0,
    };
    let header = reader.record_header(id, 1, 0, 0).unwrap().unwrap();
    // the stub codec reflects the record offset as the forecast time
    assert_eq!(header.forecast_time, 64);

    // a missing cell has no header
    let apcp = VarId {
        group: 0,
        variable: 1,
    };
    assert!(reader.record_header(apcp, 1, 0, 0).unwrap().is_none());
}

#[test]
fn test_reads_work_after_schema_inspection() {
    let reader = two_var_reader();
    let var = reader.schema().find_variable("Temperature_isobaric").unwrap();
    let slab = reader
        .read(
            var.id,
            &[
                Range::all(2),
                Range::single(0),
                Range::all(3),
                Range::all(4),
            ],
            &CancelToken::new(),
        )
        .unwrap();
    assert_eq!(slab.shape, vec![2, 1, 3, 4]);
}
