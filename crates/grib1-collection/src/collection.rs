//! The collection root: groups, file handles and record access.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek};
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::coords::{EnsCoord, TimeCoord, VertCoord};
use crate::error::{IndexError, IndexResult};
use crate::grid::HorizCoordSys;
use crate::variable::{Record, VariableIndex};

/// Random-access stream over one physical GRIB1 file.
pub trait RandomAccess: Read + Seek + Send {}

impl<T: Read + Seek + Send> RandomAccess for T {}

/// Provider of physical file handles, keyed by dense file number.
///
/// Must be safe to call from concurrent read calls; every call returns an
/// independent handle.
pub trait FileSource: Send + Sync {
    fn open_file(&self, fileno: u32) -> io::Result<Box<dyn RandomAccess>>;

    /// Number of files known to this source.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for dyn FileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<dyn FileSource>")
    }
}

/// File source over a list of paths on the local filesystem.
pub struct FileListSource {
    paths: Vec<PathBuf>,
}

impl FileListSource {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl FileSource for FileListSource {
    fn open_file(&self, fileno: u32) -> io::Result<Box<dyn RandomAccess>> {
        let path = self.paths.get(fileno as usize).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no file number {fileno} in collection"),
            )
        })?;
        Ok(Box::new(File::open(path)?))
    }

    fn len(&self) -> usize {
        self.paths.len()
    }
}

/// File source over in-memory file images.
///
/// Handles share the underlying bytes, so opening is cheap and concurrently
/// open handles are independent.
pub struct MemoryFileSource {
    files: Vec<Bytes>,
}

impl MemoryFileSource {
    pub fn new(files: Vec<Bytes>) -> Self {
        Self { files }
    }
}

impl FileSource for MemoryFileSource {
    fn open_file(&self, fileno: u32) -> io::Result<Box<dyn RandomAccess>> {
        let image = self.files.get(fileno as usize).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no file number {fileno} in collection"),
            )
        })?;
        Ok(Box::new(Cursor::new(image.clone())))
    }

    fn len(&self) -> usize {
        self.files.len()
    }
}

/// Source of late-hydrated record tables, keyed by (group, variable).
pub trait RecordSource: Send + Sync {
    fn load_records(&self, group: usize, variable: usize) -> IndexResult<Vec<Record>>;
}

impl std::fmt::Debug for dyn RecordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<dyn RecordSource>")
    }
}

/// One horizontal-coordinate group: all variables sharing one grid.
#[derive(Debug)]
pub struct Group {
    pub hcs: HorizCoordSys,
    pub time_coords: Vec<TimeCoord>,
    pub vert_coords: Vec<VertCoord>,
    pub ens_coords: Vec<EnsCoord>,
    pub variables: Vec<VariableIndex>,
}

impl Group {
    /// Time axis length for a variable of this group (1 when it has none).
    pub fn nt(&self, vi: &VariableIndex) -> usize {
        vi.time_idx
            .and_then(|i| self.time_coords.get(i))
            .map(TimeCoord::len)
            .unwrap_or(1)
    }
}

/// Root of an opened flat collection index.
///
/// Immutable after load; concurrent readers share it without locks. Record
/// tables hydrate lazily behind per-variable locks.
#[derive(Debug)]
pub struct Grib1Collection {
    pub name: String,
    pub center: i32,
    pub subcenter: i32,
    pub local_table_version: i32,
    pub gen_process_id: i32,
    pub groups: Vec<Group>,
    files: Arc<dyn FileSource>,
    record_source: Option<Arc<dyn RecordSource>>,
}

impl Grib1Collection {
    pub fn new(
        name: impl Into<String>,
        center: i32,
        subcenter: i32,
        local_table_version: i32,
        gen_process_id: i32,
        groups: Vec<Group>,
        files: Arc<dyn FileSource>,
    ) -> Self {
        Self {
            name: name.into(),
            center,
            subcenter,
            local_table_version,
            gen_process_id,
            groups,
            files,
            record_source: None,
        }
    }

    /// Attach the source that hydrates record tables on first read.
    pub fn with_record_source(mut self, source: Arc<dyn RecordSource>) -> Self {
        self.record_source = Some(source);
        self
    }

    /// Open a handle on one physical file of the collection.
    pub fn open_file(&self, fileno: u32) -> io::Result<Box<dyn RandomAccess>> {
        self.files.open_file(fileno)
    }

    /// Number of physical files backing the collection.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn group(&self, group: usize) -> IndexResult<&Group> {
        self.groups.get(group).ok_or(IndexError::BadReference {
            kind: "group",
            index: group,
        })
    }

    pub fn variable(&self, group: usize, variable: usize) -> IndexResult<&VariableIndex> {
        self.group(group)?
            .variables
            .get(variable)
            .ok_or(IndexError::BadReference {
                kind: "variable",
                index: variable,
            })
    }

    /// Record table for one variable, hydrating it on first access.
    ///
    /// The table length is validated against `nt * nens * nverts`; a
    /// mismatch means the index is corrupt.
    pub fn records(&self, group: usize, variable: usize) -> IndexResult<&[Record]> {
        let g = self.group(group)?;
        let vi = g.variables.get(variable).ok_or(IndexError::BadReference {
            kind: "variable",
            index: variable,
        })?;
        let expected = g.nt(vi) * vi.nens * vi.nverts;
        let name = format!("{}[{group}.{variable}]", self.name);
        vi.records_or_hydrate(expected, &name, || {
            let source = self
                .record_source
                .as_ref()
                .ok_or_else(|| IndexError::NoRecordSource(name.clone()))?;
            debug!(collection = %self.name, group, variable, "hydrating record table");
            source.load_records(group, variable)
        })
    }
}
