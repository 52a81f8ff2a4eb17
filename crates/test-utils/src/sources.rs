//! Instrumented file and record sources.

use std::io::{self, Cursor};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;

use grib1_collection::{FileSource, IndexResult, RandomAccess, Record, RecordSource};

/// File source recording the order of opens as (partno, fileno).
///
/// The log can be shared across the sources of several partitions so the
/// global open order is observable.
pub struct TracingFiles {
    partno: usize,
    nfiles: usize,
    log: Arc<Mutex<Vec<(usize, u32)>>>,
}

impl TracingFiles {
    /// A flat-collection source with its own log.
    pub fn new(nfiles: usize) -> Arc<Self> {
        Arc::new(Self {
            partno: 0,
            nfiles,
            log: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// A per-partition source appending to a shared log.
    pub fn for_partition(
        partno: usize,
        nfiles: usize,
        log: Arc<Mutex<Vec<(usize, u32)>>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            partno,
            nfiles,
            log,
        })
    }

    /// A fresh log to share across partitions.
    pub fn shared_log() -> Arc<Mutex<Vec<(usize, u32)>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    /// The opens recorded so far, in call order.
    pub fn opens(&self) -> Vec<(usize, u32)> {
        self.log.lock().unwrap().clone()
    }
}

impl FileSource for TracingFiles {
    fn open_file(&self, fileno: u32) -> io::Result<Box<dyn RandomAccess>> {
        if fileno as usize >= self.nfiles {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no file number {fileno}"),
            ));
        }
        self.log.lock().unwrap().push((self.partno, fileno));
        Ok(Box::new(Cursor::new(Bytes::new())))
    }

    fn len(&self) -> usize {
        self.nfiles
    }
}

/// File source whose opens always fail, for the FileUnavailable policy.
pub struct UnavailableFiles {
    nfiles: usize,
}

impl UnavailableFiles {
    pub fn new(nfiles: usize) -> Arc<Self> {
        Arc::new(Self { nfiles })
    }
}

impl FileSource for UnavailableFiles {
    fn open_file(&self, fileno: u32) -> io::Result<Box<dyn RandomAccess>> {
        Err(io::Error::new(
            io::ErrorKind::Other,
            format!("file store offline (file {fileno})"),
        ))
    }

    fn len(&self) -> usize {
        self.nfiles
    }
}

/// Record source counting hydrator invocations.
///
/// An optional delay widens the race window so concurrent-hydration tests
/// actually contend.
pub struct CountingRecords {
    records: Vec<Record>,
    loads: AtomicUsize,
    delay: Option<Duration>,
}

impl CountingRecords {
    pub fn new(records: Vec<Record>) -> Arc<Self> {
        Arc::new(Self {
            records,
            loads: AtomicUsize::new(0),
            delay: None,
        })
    }

    pub fn with_delay(records: Vec<Record>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            records,
            loads: AtomicUsize::new(0),
            delay: Some(delay),
        })
    }

    /// How many times the hydrator has run.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl RecordSource for CountingRecords {
    fn load_records(&self, _group: usize, _variable: usize) -> IndexResult<Vec<Record>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        Ok(self.records.clone())
    }
}
