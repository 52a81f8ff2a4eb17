//! End-to-end reads across time partitions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use grib1_collection::{
    Grib1Collection, IndexResult, PartVarRef, Partition, PartitionGroup, PartitionSource, Record,
    TimeCoordUnion, TimePartition, TimeValues, VarDesc, VariableIndexPartitioned,
};
use grib1_reader::{CancelToken, Grib1Dataset, Grib1Reader, OpenOptions, Range};
use test_utils::{
    flat_collection, latlon_grid, partitioned_dataset, reference_time, PatternCodec,
    PartitionSpec, TracingFiles, VarSpec,
};

fn open(tp: TimePartition, codec: Arc<PatternCodec>) -> Grib1Reader {
    Grib1Reader::open(Grib1Dataset::Partitioned(tp), codec, OpenOptions::new()).unwrap()
}

#[test]
fn test_two_partitions_interleave_in_time_order() {
    let log = TracingFiles::shared_log();
    let tp = partitioned_dataset(
        4,
        3,
        vec![
            PartitionSpec {
                name: "run-00z".to_string(),
                time_offsets: vec![0],
                records: vec![Record::new(0, 100)],
                files: TracingFiles::for_partition(0, 1, log.clone()),
            },
            PartitionSpec {
                name: "run-06z".to_string(),
                time_offsets: vec![6],
                records: vec![Record::new(0, 200)],
                files: TracingFiles::for_partition(1, 1, log.clone()),
            },
        ],
        &[],
    );
    let reader = open(tp, Arc::new(PatternCodec::offset_pattern()));

    let slab = reader
        .read_by_name(
            "Temperature_isobaric",
            &[Range::all(2), Range::all(3), Range::all(4)],
            &CancelToken::new(),
        )
        .unwrap();

    assert_eq!(slab.shape, vec![2, 3, 4]);
    assert!(slab.values[..12].iter().all(|&v| v == 100.0));
    assert!(slab.values[12..].iter().all(|&v| v == 200.0));
    // exactly two opens, partition A before partition B
    assert_eq!(log.lock().unwrap().clone(), vec![(0, 0), (1, 0)]);
}

#[test]
fn test_partition_sequence_may_be_non_monotone_in_time() {
    // partition 0 holds hours 0 and 12, partition 1 holds hour 6
    let log = TracingFiles::shared_log();
    let tp = partitioned_dataset(
        4,
        3,
        vec![
            PartitionSpec {
                name: "odd".to_string(),
                time_offsets: vec![0, 12],
                records: vec![Record::new(0, 100), Record::new(0, 300)],
                files: TracingFiles::for_partition(0, 1, log.clone()),
            },
            PartitionSpec {
                name: "even".to_string(),
                time_offsets: vec![6],
                records: vec![Record::new(0, 200)],
                files: TracingFiles::for_partition(1, 1, log.clone()),
            },
        ],
        &[],
    );
    let codec = Arc::new(PatternCodec::offset_pattern());
    let reader = open(tp, codec.clone());

    let slab = reader
        .read_by_name(
            "Temperature_isobaric",
            &[Range::all(3), Range::all(3), Range::all(4)],
            &CancelToken::new(),
        )
        .unwrap();

    // output follows global time order, not partition order
    for (t, expected) in [100.0f32, 200.0, 300.0].into_iter().enumerate() {
        assert_eq!(slab.get(&[t, 0, 0]), Some(expected));
    }
    // partition 0 is opened once for both of its records
    assert_eq!(log.lock().unwrap().clone(), vec![(0, 0), (1, 0)]);
    // offsets within partition 0's file swept forward
    assert_eq!(codec.decode_log(), vec![100, 300, 200]);
}

#[test]
fn test_partition_without_variable_reads_missing() {
    let log = TracingFiles::shared_log();
    let tp = partitioned_dataset(
        4,
        3,
        vec![
            PartitionSpec {
                name: "with-var".to_string(),
                time_offsets: vec![0],
                records: vec![Record::new(0, 100)],
                files: TracingFiles::for_partition(0, 1, log.clone()),
            },
            PartitionSpec {
                name: "without-var".to_string(),
                time_offsets: vec![6],
                records: vec![Record::new(0, 200)],
                files: TracingFiles::for_partition(1, 1, log.clone()),
            },
        ],
        &[1],
    );
    let reader = open(tp, Arc::new(PatternCodec::offset_pattern()));

    let slab = reader
        .read_by_name(
            "Temperature_isobaric",
            &[Range::all(2), Range::all(3), Range::all(4)],
            &CancelToken::new(),
        )
        .unwrap();

    assert!(slab.values[..12].iter().all(|&v| v == 100.0));
    assert!(slab.values[12..].iter().all(|v| v.is_nan()));
    // the absent partition is never touched
    assert_eq!(log.lock().unwrap().clone(), vec![(0, 0)]);
}

/// Opens partitions on demand, counting invocations per partition.
struct DemandPartitions {
    collections: std::sync::Mutex<Vec<Option<Grib1Collection>>>,
    opens: Vec<AtomicUsize>,
    delay: Option<std::time::Duration>,
}

impl DemandPartitions {
    fn new(collections: Vec<Grib1Collection>) -> Arc<Self> {
        let opens = (0..collections.len()).map(|_| AtomicUsize::new(0)).collect();
        Arc::new(Self {
            collections: std::sync::Mutex::new(collections.into_iter().map(Some).collect()),
            opens,
            delay: None,
        })
    }

    fn with_delay(collections: Vec<Grib1Collection>, delay: std::time::Duration) -> Arc<Self> {
        let opens = (0..collections.len()).map(|_| AtomicUsize::new(0)).collect();
        Arc::new(Self {
            collections: std::sync::Mutex::new(collections.into_iter().map(Some).collect()),
            opens,
            delay: Some(delay),
        })
    }

    fn open_count(&self, partno: usize) -> usize {
        self.opens[partno].load(Ordering::SeqCst)
    }
}

impl PartitionSource for DemandPartitions {
    fn open_partition(&self, partno: usize) -> IndexResult<Grib1Collection> {
        self.opens[partno].fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        Ok(self.collections.lock().unwrap()[partno]
            .take()
            .expect("partition opened twice"))
    }
}

fn lazy_two_partition_dataset(source: Arc<DemandPartitions>) -> TimePartition {
    let union = TimeCoordUnion {
        name: "time".to_string(),
        unit: "Hour".to_string(),
        reference: reference_time(),
        values: TimeValues::Offsets(vec![0, 6]),
        map: vec![(0, 0), (1, 0)],
    };
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
        partvars: vec![
            Some(PartVarRef {
                group: 0,
                variable: 0,
            }),
            Some(PartVarRef {
                group: 0,
                variable: 0,
            }),
        ],
    };
    let group = PartitionGroup {
        hcs: latlon_grid(4, 3),
        time_unions: vec![union],
        vert_coords: Vec::new(),
        ens_coords: Vec::new(),
        variables: vec![variable],
    };
    TimePartition::new(
        "lazy",
        7,
        0,
        1,
        81,
        vec![group],
        vec![Partition::new("part0"), Partition::new("part1")],
    )
    .with_partition_source(source)
}

fn partition_collection(
    partno: usize,
    offset: i32,
    pos: u64,
    log: Arc<std::sync::Mutex<Vec<(usize, u32)>>>,
) -> Grib1Collection {
    flat_collection(
        4,
        3,
        &[offset],
        &[],
        &[],
        vec![VarSpec::new(11, vec![Record::new(0, pos)]).at_level(100)],
        TracingFiles::for_partition(partno, 1, log),
    )
}

#[test]
fn test_partitions_open_lazily_and_only_when_touched() {
    let log = TracingFiles::shared_log();
    let source = DemandPartitions::new(vec![
        partition_collection(0, 0, 100, log.clone()),
        partition_collection(1, 6, 200, log.clone()),
    ]);
    let tp = lazy_two_partition_dataset(source.clone());
    let reader = open(tp, Arc::new(PatternCodec::offset_pattern()));

    // read only the second time step
    let slab = reader
        .read_by_name(
            "Temperature_isobaric",
            &[Range::single(1), Range::all(3), Range::all(4)],
            &CancelToken::new(),
        )
        .unwrap();

    assert!(slab.values.iter().all(|&v| v == 200.0));
    assert_eq!(source.open_count(0), 0);
    assert_eq!(source.open_count(1), 1);
    assert_eq!(log.lock().unwrap().clone(), vec![(1, 0)]);
}

#[test]
fn test_concurrent_reads_open_partition_once() {
    let log = TracingFiles::shared_log();
    let source = DemandPartitions::with_delay(
        vec![
            partition_collection(0, 0, 100, log.clone()),
            partition_collection(1, 6, 200, log.clone()),
        ],
        std::time::Duration::from_millis(50),
    );
    let tp = lazy_two_partition_dataset(source.clone());
    let reader = Arc::new(open(tp, Arc::new(PatternCodec::offset_pattern())));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let reader = reader.clone();
            std::thread::spawn(move || {
                reader
                    .read_by_name(
                        "Temperature_isobaric",
                        &[Range::all(2), Range::all(3), Range::all(4)],
                        &CancelToken::new(),
                    )
                    .unwrap()
            })
        })
        .collect();
    for handle in handles {
        let slab = handle.join().unwrap();
        assert!(slab.values[..12].iter().all(|&v| v == 100.0));
        assert!(slab.values[12..].iter().all(|&v| v == 200.0));
    }

    assert_eq!(source.open_count(0), 1);
    assert_eq!(source.open_count(1), 1);
}
