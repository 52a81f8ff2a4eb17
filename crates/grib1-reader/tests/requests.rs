//! Request validation surfaces before any I/O.

use std::sync::Arc;

use grib1_collection::Record;
use grib1_reader::{CancelToken, Grib1Dataset, Grib1Reader, OpenOptions, Range, ReadError};
use test_utils::{flat_collection, PatternCodec, TracingFiles, VarSpec};

fn reader_and_files() -> (Grib1Reader, Arc<test_utils::TracingFiles>) {
    let files = TracingFiles::new(1);
    // rank 4 variable: time, vertical, y, x
    let collection = flat_collection(
        4,
        3,
        &[0],
        &[500.0],
        &[],
        vec![VarSpec::new(11, vec![Record::new(0, 0)]).at_level(100)],
        files.clone(),
    );
    let reader = Grib1Reader::open(
        Grib1Dataset::Flat(collection),
        Arc::new(PatternCodec::yx_pattern()),
        OpenOptions::new(),
    )
    .unwrap();
    (reader, files)
}

#[test]
fn test_rank_mismatch_rejected_without_file_opens() {
    let (reader, files) = reader_and_files();
    let err = reader
        .read_by_name(
            "Temperature_isobaric",
            &[Range::all(3), Range::all(4)],
            &CancelToken::new(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ReadError::RankMismatch {
            expected: 4,
            actual: 2
        }
    ));
    assert!(files.opens().is_empty());
}

#[test]
fn test_out_of_bounds_axis_rejected_without_file_opens() {
    let (reader, files) = reader_and_files();
    let err = reader
        .read_by_name(
            "Temperature_isobaric",
            &[
                Range::single(0),
                Range::single(0),
                Range::new(0, 3, 1), // ny is 3, last valid index is 2
                Range::all(4),
            ],
            &CancelToken::new(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ReadError::AxisOutOfRange {
            axis: "y",
            last: 3,
            len: 3,
            ..
        }
    ));
    assert!(files.opens().is_empty());
}

#[test]
fn test_malformed_ranges_rejected() {
    let (reader, files) = reader_and_files();

    let zero_stride = reader
        .read_by_name(
            "Temperature_isobaric",
            &[
                Range::single(0),
                Range::single(0),
                Range::new(0, 2, 0),
                Range::all(4),
            ],
            &CancelToken::new(),
        )
        .unwrap_err();
    assert!(matches!(zero_stride, ReadError::InvalidRequest(_)));

    let inverted = reader
        .read_by_name(
            "Temperature_isobaric",
            &[
                Range::single(0),
                Range::single(0),
                Range::all(3),
                Range::new(3, 1, 1),
            ],
            &CancelToken::new(),
        )
        .unwrap_err();
    assert!(matches!(inverted, ReadError::InvalidRequest(_)));

    assert!(files.opens().is_empty());
}

#[test]
fn test_unknown_variable() {
    let (reader, _files) = reader_and_files();
    let err = reader
        .read_by_name("NoSuchThing", &[], &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, ReadError::NoSuchVariable(_)));
}
