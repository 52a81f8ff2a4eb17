//! Typed open-time options.
//!
//! Parameter-table selection is a closed set of typed options applied while
//! opening a reader, not a free-form message channel.

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::ReadResult;
use crate::tables::{ParameterTable, TableSet};

/// One table-selection option.
#[derive(Debug, Clone)]
pub enum TableOption {
    /// Replace the default parameter table with the one at this path.
    ParameterTable(PathBuf),
    /// Add a (center, subcenter, version) -> table lookup file.
    ParameterTableLookup(PathBuf),
}

/// Options applied while opening a reader.
#[derive(Clone, Default)]
pub struct OpenOptions {
    pub tables: Vec<TableOption>,
    /// A fully custom parameter table; when set, the path options are ignored.
    pub parameter_table: Option<Arc<dyn ParameterTable>>,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the default parameter table with the file at `path`.
    pub fn with_table(mut self, path: impl Into<PathBuf>) -> Self {
        self.tables.push(TableOption::ParameterTable(path.into()));
        self
    }

    /// Add a (center, subcenter, version) lookup file.
    pub fn with_table_lookup(mut self, path: impl Into<PathBuf>) -> Self {
        self.tables
            .push(TableOption::ParameterTableLookup(path.into()));
        self
    }

    /// Use a caller-supplied parameter table.
    pub fn with_parameter_table(mut self, table: Arc<dyn ParameterTable>) -> Self {
        self.parameter_table = Some(table);
        self
    }

    /// Build the parameter table these options select.
    pub(crate) fn build_table(&self) -> ReadResult<Arc<dyn ParameterTable>> {
        if let Some(table) = &self.parameter_table {
            return Ok(table.clone());
        }
        let mut set = TableSet::new();
        for option in &self.tables {
            match option {
                TableOption::ParameterTable(path) => set.set_default_file(path)?,
                TableOption::ParameterTableLookup(path) => set.add_lookup(path)?,
            }
        }
        Ok(Arc::new(set))
    }
}
