//! Logical variables and their record tables.

use std::sync::{Mutex, OnceLock};

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, IndexResult};

/// Sentinel byte offset meaning "no message for this coordinate cell".
pub const MISSING_RECORD: u64 = u64::MAX;

/// Pointer to one GRIB1 message inside the collection's files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// File number, dense within the collection; argument to the file source.
    pub fileno: u32,
    /// Byte offset of the message start, or [`MISSING_RECORD`].
    pub pos: u64,
}

impl Record {
    /// The missing-cell record.
    pub const MISSING: Record = Record {
        fileno: 0,
        pos: MISSING_RECORD,
    };

    pub fn new(fileno: u32, pos: u64) -> Self {
        Self { fileno, pos }
    }

    pub fn is_missing(&self) -> bool {
        self.pos == MISSING_RECORD
    }
}

/// Dense record-table index for a (time, ensemble, vertical) cell.
pub fn calc_index(t: usize, e: usize, v: usize, nens: usize, nverts: usize) -> usize {
    (t * nens + e) * nverts + v
}

/// Raw GRIB1 identification shared by flat and partitioned variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDesc {
    /// Parameter table version the parameter number is defined in.
    pub table_version: u8,
    /// GRIB1 parameter number (code table 2).
    pub parameter: u8,
    /// Level type code (code table 3), when one applies.
    pub level_type: Option<u8>,
    /// True when the level is a bounded layer.
    pub is_layer: bool,
    /// Statistical processing code (time range indicator), when one applies.
    pub intv_type: Option<u8>,
    /// Ensemble derived type, for derived ensemble products.
    pub ens_derived_type: Option<u8>,
    /// Probability product name, for probability variables.
    pub probability_name: Option<String>,
}

impl VarDesc {
    /// Plain parameter with no level, statistic or ensemble qualifiers.
    pub fn parameter(table_version: u8, parameter: u8) -> Self {
        Self {
            table_version,
            parameter,
            level_type: None,
            is_layer: false,
            intv_type: None,
            ens_derived_type: None,
            probability_name: None,
        }
    }
}

/// A logical variable: many GRIB1 messages sharing one parameter, level type
/// and statistic, laid out over the group's time, ensemble and vertical axes.
///
/// The record table is dense with `nt * nens * nverts` entries indexed by
/// [`calc_index`]. It may be absent at open time and hydrated from an
/// auxiliary stream on first read.
#[derive(Debug)]
pub struct VariableIndex {
    pub desc: VarDesc,
    /// Index of the owning group in the collection; the group owns the
    /// variable, the variable points back by position only.
    pub group: usize,
    /// Index into the group's time coords; None when the variable has no time axis.
    pub time_idx: Option<usize>,
    /// Index into the group's vertical coords.
    pub vert_idx: Option<usize>,
    /// Index into the group's ensemble coords.
    pub ens_idx: Option<usize>,
    /// Ensemble axis length (1 when the axis is absent).
    pub nens: usize,
    /// Vertical axis length (1 when the axis is absent).
    pub nverts: usize,
    records: OnceLock<Vec<Record>>,
    hydrate_lock: Mutex<()>,
}

impl VariableIndex {
    /// A variable whose record table will be hydrated on first read.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        desc: VarDesc,
        group: usize,
        time_idx: Option<usize>,
        vert_idx: Option<usize>,
        ens_idx: Option<usize>,
        nens: usize,
        nverts: usize,
    ) -> Self {
        Self {
            desc,
            group,
            time_idx,
            vert_idx,
            ens_idx,
            nens,
            nverts,
            records: OnceLock::new(),
            hydrate_lock: Mutex::new(()),
        }
    }

    /// A variable with its record table already materialized.
    #[allow(clippy::too_many_arguments)]
    pub fn with_records(
        desc: VarDesc,
        group: usize,
        time_idx: Option<usize>,
        vert_idx: Option<usize>,
        ens_idx: Option<usize>,
        nens: usize,
        nverts: usize,
        records: Vec<Record>,
    ) -> Self {
        let vi = Self::new(desc, group, time_idx, vert_idx, ens_idx, nens, nverts);
        let _ = vi.records.set(records);
        vi
    }

    /// The record table, if already materialized.
    pub fn records(&self) -> Option<&[Record]> {
        self.records.get().map(Vec::as_slice)
    }

    /// The record table, materializing it through `hydrate` on first access.
    ///
    /// At most one caller runs the hydrator; concurrent callers block on the
    /// hydrate lock until the table is populated. The table length is
    /// validated against `expected` on every access.
    pub fn records_or_hydrate<F>(
        &self,
        expected: usize,
        name: &str,
        hydrate: F,
    ) -> IndexResult<&[Record]>
    where
        F: FnOnce() -> IndexResult<Vec<Record>>,
    {
        if self.records.get().is_none() {
            let _guard = self.hydrate_lock.lock().expect("hydrate lock poisoned");
            if self.records.get().is_none() {
                let table = hydrate()?;
                let _ = self.records.set(table);
            }
        }
        let table = self.records.get().expect("record table just hydrated");
        if table.len() != expected {
            return Err(IndexError::RecordCountMismatch {
                variable: name.to_string(),
                expected,
                actual: table.len(),
            });
        }
        Ok(table.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_index_layout() {
        // (t * nens + e) * nverts + v
        assert_eq!(calc_index(0, 0, 0, 2, 3), 0);
        assert_eq!(calc_index(0, 0, 2, 2, 3), 2);
        assert_eq!(calc_index(0, 1, 0, 2, 3), 3);
        assert_eq!(calc_index(1, 0, 0, 2, 3), 6);
        assert_eq!(calc_index(1, 1, 2, 2, 3), 11);
    }

    #[test]
    fn test_missing_record_sentinel() {
        assert!(Record::MISSING.is_missing());
        assert!(!Record::new(0, 0).is_missing());
        assert!(Record::new(3, MISSING_RECORD).is_missing());
    }

    #[test]
    fn test_hydrate_once() {
        let vi = VariableIndex::new(VarDesc::parameter(2, 11), 0, Some(0), None, None, 1, 1);
        assert!(vi.records().is_none());

        let first = vi
            .records_or_hydrate(2, "t", || Ok(vec![Record::new(0, 0), Record::new(0, 80)]))
            .unwrap();
        assert_eq!(first.len(), 2);

        // second access must not run the hydrator again
        let second = vi
            .records_or_hydrate(2, "t", || panic!("hydrator ran twice"))
            .unwrap();
        assert_eq!(second[1], Record::new(0, 80));
    }

    #[test]
    fn test_hydrate_length_mismatch() {
        let vi = VariableIndex::new(VarDesc::parameter(2, 11), 0, Some(0), None, None, 1, 1);
        let err = vi
            .records_or_hydrate(4, "t", || Ok(vec![Record::MISSING]))
            .unwrap_err();
        assert!(matches!(
            err,
            IndexError::RecordCountMismatch {
                expected: 4,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_hydrate_error_is_retried() {
        let vi = VariableIndex::new(VarDesc::parameter(2, 11), 0, Some(0), None, None, 1, 1);
        let err = vi.records_or_hydrate(1, "t", || {
            Err(IndexError::NoRecordSource("t".to_string()))
        });
        assert!(err.is_err());

        // a failed hydration leaves the table unset; a later attempt may succeed
        let ok = vi.records_or_hydrate(1, "t", || Ok(vec![Record::new(0, 16)]));
        assert_eq!(ok.unwrap()[0].pos, 16);
    }
}
