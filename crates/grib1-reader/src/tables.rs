//! Parameter, level and statistic lookup tables.
//!
//! GRIB1 messages carry numeric codes; these tables translate them into
//! names, units and descriptions for the projected schema. A built-in table
//! covers the common WMO codes; JSON files can replace the default or
//! override it per (center, subcenter, version).

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ReadError, ReadResult};

/// Descriptor of one GRIB1 parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    /// Parameter number (code table 2).
    pub number: u8,
    /// Short mnemonic (e.g. "TMP", "APCP").
    pub name: String,
    /// Physical unit (e.g. "K", "kg/m^2").
    pub unit: String,
    /// Human-readable description; variable names derive from this.
    pub description: String,
}

/// Unit and orientation of a vertical level type.
#[derive(Debug, Clone, PartialEq)]
pub struct VertUnit {
    pub unit: String,
    /// True when values increase upward.
    pub positive_up: bool,
    /// Vertical datum, when one applies.
    pub datum: Option<String>,
}

/// Statistical processing applied over a time interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatType {
    Average,
    Accumulation,
    Difference,
    Variance,
    StdDev,
}

impl StatType {
    /// Short form used in synthesized variable names.
    pub fn abbrev(&self) -> &'static str {
        match self {
            StatType::Average => "ave",
            StatType::Accumulation => "acc",
            StatType::Difference => "dif",
            StatType::Variance => "var",
            StatType::StdDev => "std",
        }
    }

    /// Long form used in synthesized long names.
    pub fn description(&self) -> &'static str {
        match self {
            StatType::Average => "Average",
            StatType::Accumulation => "Accumulation",
            StatType::Difference => "Difference",
            StatType::Variance => "Variance",
            StatType::StdDev => "Standard deviation",
        }
    }
}

/// Map a GRIB1 time range indicator (code table 5) to its statistic, when it
/// carries one. Plain instants (0, 1, 10, ...) map to None.
pub fn stat_type(intv_type: u8) -> Option<StatType> {
    match intv_type {
        3 | 113 | 115 | 117 | 123 => Some(StatType::Average),
        4 | 114 | 116 | 124 => Some(StatType::Accumulation),
        5 => Some(StatType::Difference),
        118 => Some(StatType::Variance),
        _ => None,
    }
}

/// Built-in data for one GRIB1 level type (code table 3).
struct LevelEntry {
    short: &'static str,
    desc: &'static str,
    unit: &'static str,
    positive_up: bool,
    datum: Option<&'static str>,
}

fn level_entry(code: u8) -> Option<LevelEntry> {
    let (short, desc, unit, positive_up, datum) = match code {
        1 => ("surface", "Ground or water surface", "", true, None),
        2 => ("cloud_base", "Cloud base level", "", true, None),
        3 => ("cloud_tops", "Level of cloud tops", "", true, None),
        4 => ("zero_isotherm", "Level of 0 deg C isotherm", "", true, None),
        100 => ("isobaric", "Isobaric surface", "hPa", false, None),
        101 => (
            "layer_between_two_isobaric",
            "Layer between two isobaric surfaces",
            "hPa",
            false,
            None,
        ),
        102 => ("msl", "Mean sea level", "", true, None),
        103 => (
            "altitude_above_msl",
            "Altitude above mean sea level",
            "m",
            true,
            Some("mean sea level"),
        ),
        104 => (
            "layer_between_two_altitudes",
            "Layer between two altitudes above mean sea level",
            "m",
            true,
            Some("mean sea level"),
        ),
        105 => (
            "height_above_ground",
            "Fixed height above ground",
            "m",
            true,
            Some("ground"),
        ),
        106 => (
            "layer_between_two_heights_above_ground",
            "Layer between two heights above ground",
            "m",
            true,
            Some("ground"),
        ),
        107 => ("sigma", "Sigma level", "sigma", false, None),
        108 => (
            "layer_between_two_sigmas",
            "Layer between two sigma levels",
            "sigma",
            false,
            None,
        ),
        109 => ("hybrid", "Hybrid level", "", false, None),
        110 => (
            "layer_between_two_hybrids",
            "Layer between two hybrid levels",
            "",
            false,
            None,
        ),
        111 => (
            "depth_below_surface",
            "Depth below land surface",
            "cm",
            false,
            Some("land surface"),
        ),
        112 => (
            "layer_between_two_depths_below_surface",
            "Layer between two depths below land surface",
            "cm",
            false,
            Some("land surface"),
        ),
        116 => (
            "layer_between_two_pressure_difference_from_ground",
            "Layer between two levels at specified pressure differences from ground",
            "hPa",
            false,
            Some("ground"),
        ),
        200 => (
            "entire_atmosphere",
            "Entire atmosphere as a single layer",
            "",
            true,
            None,
        ),
        204 => (
            "highest_tropospheric_freezing",
            "Highest tropospheric freezing level",
            "",
            true,
            None,
        ),
        _ => return None,
    };
    Some(LevelEntry {
        short,
        desc,
        unit,
        positive_up,
        datum,
    })
}

/// Parameter-table service consumed by naming and the schema projector.
///
/// Level and statistic lookups have built-in defaults; implementations only
/// have to resolve parameter numbers.
pub trait ParameterTable: Send + Sync {
    /// Descriptor for a parameter number, when the table knows it.
    fn parameter(
        &self,
        center: i32,
        subcenter: i32,
        version: u8,
        number: u8,
    ) -> Option<ParameterDescriptor>;

    /// Short name of a level type, for variable names.
    fn level_short_name(&self, code: u8) -> String {
        level_entry(code)
            .map(|e| e.short.to_string())
            .unwrap_or_else(|| format!("level{code}"))
    }

    /// Unit and orientation of a level type, when known.
    fn level_unit(&self, code: u8) -> Option<VertUnit> {
        level_entry(code).map(|e| VertUnit {
            unit: e.unit.to_string(),
            positive_up: e.positive_up,
            datum: e.datum.map(str::to_string),
        })
    }

    /// Human-readable description of a level type.
    fn level_description(&self, code: u8) -> String {
        level_entry(code)
            .map(|e| e.desc.to_string())
            .unwrap_or_else(|| format!("Unknown level type {code}"))
    }

    /// Statistic for a time range indicator, when it carries one.
    fn stat_type(&self, intv_type: u8) -> Option<StatType> {
        stat_type(intv_type)
    }
}

impl std::fmt::Debug for dyn ParameterTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<dyn ParameterTable>")
    }
}

/// Built-in default table: the common WMO table 2 parameters.
pub struct StandardTable {
    params: HashMap<u8, ParameterDescriptor>,
}

impl StandardTable {
    pub fn new() -> Self {
        let entries: &[(u8, &str, &str, &str)] = &[
            (1, "PRES", "Pa", "Pressure"),
            (2, "PRMSL", "Pa", "Pressure reduced to MSL"),
            (7, "HGT", "gpm", "Geopotential height"),
            (11, "TMP", "K", "Temperature"),
            (15, "TMAX", "K", "Maximum temperature"),
            (16, "TMIN", "K", "Minimum temperature"),
            (33, "UGRD", "m/s", "u-component of wind"),
            (34, "VGRD", "m/s", "v-component of wind"),
            (39, "VVEL", "Pa/s", "Vertical velocity"),
            (51, "SPFH", "kg/kg", "Specific humidity"),
            (52, "RH", "%", "Relative humidity"),
            (59, "PRATE", "kg/m^2/s", "Precipitation rate"),
            (61, "APCP", "kg/m^2", "Total precipitation"),
            (71, "TCDC", "%", "Total cloud cover"),
            (81, "LAND", "", "Land cover"),
        ];
        let params = entries
            .iter()
            .map(|&(number, name, unit, description)| {
                (
                    number,
                    ParameterDescriptor {
                        number,
                        name: name.to_string(),
                        unit: unit.to_string(),
                        description: description.to_string(),
                    },
                )
            })
            .collect();
        Self { params }
    }
}

impl Default for StandardTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterTable for StandardTable {
    fn parameter(
        &self,
        _center: i32,
        _subcenter: i32,
        _version: u8,
        number: u8,
    ) -> Option<ParameterDescriptor> {
        self.params.get(&number).cloned()
    }
}

/// On-disk form of one parameter entry.
#[derive(Debug, Deserialize)]
struct ParamFileEntry {
    number: u8,
    name: String,
    #[serde(default)]
    unit: String,
    description: String,
}

/// On-disk form of a parameter table file.
#[derive(Debug, Deserialize)]
struct ParamFile {
    parameters: Vec<ParamFileEntry>,
}

/// Parameter table loaded from a JSON file.
pub struct FileTable {
    params: HashMap<u8, ParameterDescriptor>,
}

impl FileTable {
    pub fn load(path: &Path) -> ReadResult<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| ReadError::table(format!("{}: {e}", path.display())))?;
        let file: ParamFile = serde_json::from_str(&raw)
            .map_err(|e| ReadError::table(format!("{}: {e}", path.display())))?;
        let params = file
            .parameters
            .into_iter()
            .map(|e| {
                (
                    e.number,
                    ParameterDescriptor {
                        number: e.number,
                        name: e.name,
                        unit: e.unit,
                        description: e.description,
                    },
                )
            })
            .collect();
        Ok(Self { params })
    }

    fn get(&self, number: u8) -> Option<ParameterDescriptor> {
        self.params.get(&number).cloned()
    }
}

/// On-disk form of one lookup entry: which table file serves a center.
#[derive(Debug, Deserialize)]
struct LookupEntry {
    center: i32,
    #[serde(default)]
    subcenter: i32,
    version: u8,
    path: String,
}

#[derive(Debug, Deserialize)]
struct LookupFile {
    tables: Vec<LookupEntry>,
}

/// Composite table: (center, subcenter, version) overrides, then an optional
/// replacement default, then the built-in standard table.
pub struct TableSet {
    standard: StandardTable,
    replacement: Option<FileTable>,
    overrides: HashMap<(i32, i32, u8), FileTable>,
}

impl TableSet {
    pub fn new() -> Self {
        Self {
            standard: StandardTable::new(),
            replacement: None,
            overrides: HashMap::new(),
        }
    }

    /// Replace the default table with one loaded from `path`.
    pub fn set_default_file(&mut self, path: &Path) -> ReadResult<()> {
        self.replacement = Some(FileTable::load(path)?);
        Ok(())
    }

    /// Load a lookup file and its referenced tables. Relative table paths
    /// resolve against the lookup file's directory.
    pub fn add_lookup(&mut self, path: &Path) -> ReadResult<()> {
        let raw = fs::read_to_string(path)
            .map_err(|e| ReadError::table(format!("{}: {e}", path.display())))?;
        let file: LookupFile = serde_json::from_str(&raw)
            .map_err(|e| ReadError::table(format!("{}: {e}", path.display())))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for entry in file.tables {
            let table_path = base.join(&entry.path);
            let table = FileTable::load(&table_path)?;
            self.overrides
                .insert((entry.center, entry.subcenter, entry.version), table);
        }
        Ok(())
    }
}

impl Default for TableSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterTable for TableSet {
    fn parameter(
        &self,
        center: i32,
        subcenter: i32,
        version: u8,
        number: u8,
    ) -> Option<ParameterDescriptor> {
        if let Some(table) = self.overrides.get(&(center, subcenter, version)) {
            if let Some(p) = table.get(number) {
                return Some(p);
            }
        }
        if let Some(table) = &self.replacement {
            return table.get(number);
        }
        self.standard.parameter(center, subcenter, version, number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_stat_type_mapping() {
        assert_eq!(stat_type(3), Some(StatType::Average));
        assert_eq!(stat_type(4), Some(StatType::Accumulation));
        assert_eq!(stat_type(5), Some(StatType::Difference));
        assert_eq!(stat_type(118), Some(StatType::Variance));
        assert_eq!(stat_type(0), None);
        assert_eq!(stat_type(10), None);
    }

    #[test]
    fn test_stat_abbreviations() {
        assert_eq!(StatType::Average.abbrev(), "ave");
        assert_eq!(StatType::Accumulation.abbrev(), "acc");
        assert_eq!(StatType::Difference.abbrev(), "dif");
    }

    #[test]
    fn test_builtin_levels() {
        let table = StandardTable::new();
        assert_eq!(table.level_short_name(100), "isobaric");
        assert_eq!(table.level_short_name(105), "height_above_ground");
        assert_eq!(table.level_short_name(1), "surface");
        assert_eq!(table.level_short_name(250), "level250");

        let unit = table.level_unit(100).unwrap();
        assert_eq!(unit.unit, "hPa");
        assert!(!unit.positive_up);

        let height = table.level_unit(105).unwrap();
        assert!(height.positive_up);
        assert_eq!(height.datum.as_deref(), Some("ground"));

        assert!(table.level_unit(250).is_none());
    }

    #[test]
    fn test_standard_parameters() {
        let table = StandardTable::new();
        let tmp = table.parameter(7, 0, 2, 11).unwrap();
        assert_eq!(tmp.name, "TMP");
        assert_eq!(tmp.unit, "K");
        assert_eq!(tmp.description, "Temperature");
        assert!(table.parameter(7, 0, 2, 255).is_none());
    }

    #[test]
    fn test_file_table_overrides_standard() {
        let dir = tempfile::tempdir().unwrap();
        let table_path = dir.path().join("center98.json");
        let mut f = std::fs::File::create(&table_path).unwrap();
        write!(
            f,
            r#"{{"parameters": [
                {{"number": 11, "name": "T", "unit": "K", "description": "Air temperature"}}
            ]}}"#
        )
        .unwrap();

        let lookup_path = dir.path().join("lookup.json");
        let mut f = std::fs::File::create(&lookup_path).unwrap();
        write!(
            f,
            r#"{{"tables": [
                {{"center": 98, "subcenter": 0, "version": 128, "path": "center98.json"}}
            ]}}"#
        )
        .unwrap();

        let mut set = TableSet::new();
        set.add_lookup(&lookup_path).unwrap();

        // the override wins for its (center, subcenter, version)
        let p = set.parameter(98, 0, 128, 11).unwrap();
        assert_eq!(p.description, "Air temperature");

        // other centers fall back to the built-in table
        let p = set.parameter(7, 0, 2, 11).unwrap();
        assert_eq!(p.description, "Temperature");
    }

    #[test]
    fn test_missing_table_file_is_an_error() {
        let mut set = TableSet::new();
        let err = set
            .set_default_file(Path::new("/nonexistent/params.json"))
            .unwrap_err();
        assert!(matches!(err, ReadError::Table(_)));
    }
}
