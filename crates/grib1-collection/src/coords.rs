//! Coordinate axes: time, vertical and ensemble.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Values along a time axis: plain offsets or (start, end) intervals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TimeValues {
    /// Offsets from the reference time, in the coordinate unit.
    Offsets(Vec<i32>),
    /// (start, end) interval bounds for statistically processed variables.
    Intervals(Vec<(i32, i32)>),
}

impl TimeValues {
    pub fn len(&self) -> usize {
        match self {
            TimeValues::Offsets(v) => v.len(),
            TimeValues::Intervals(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_interval(&self) -> bool {
        matches!(self, TimeValues::Intervals(_))
    }
}

/// One time axis of a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeCoord {
    /// Axis name, unique within the group (e.g. "time", "time1").
    pub name: String,
    /// Unit of the offsets (e.g. "Hour").
    pub unit: String,
    /// Reference time the offsets count from.
    pub reference: DateTime<Utc>,
    pub values: TimeValues,
}

impl TimeCoord {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Units string in the "unit since reference" form, e.g.
    /// "Hour since 2014-10-24T00:00:00Z".
    pub fn units_string(&self) -> String {
        format!(
            "{} since {}",
            self.unit,
            self.reference.format("%Y-%m-%dT%H:%M:%SZ")
        )
    }
}

/// One level of a vertical axis. `value2` is only meaningful for layers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub value1: f64,
    pub value2: f64,
}

impl Level {
    pub fn single(value: f64) -> Self {
        Self {
            value1: value,
            value2: 0.0,
        }
    }

    pub fn layer(value1: f64, value2: f64) -> Self {
        Self { value1, value2 }
    }
}

/// One vertical axis of a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertCoord {
    /// GRIB1 level type code (code table 3).
    pub level_code: u8,
    /// True when each level is a bounded (value1, value2) layer.
    pub is_layer: bool,
    pub levels: Vec<Level>,
    /// Axis name, unique within the group (e.g. "isobaric", "height_above_ground").
    pub name: String,
    pub unit: String,
    /// True when values increase upward.
    pub positive_up: bool,
    /// Vertical datum, when one applies (e.g. "ground", "mean sea level").
    pub datum: Option<String>,
}

impl VertCoord {
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// The value reported for a level: the layer midpoint, or `value1` for
    /// single-value axes.
    pub fn coord_value(&self, level: &Level) -> f64 {
        if self.is_layer {
            (level.value1 + level.value2) / 2.0
        } else {
            level.value1
        }
    }
}

/// One ensemble axis of a group: the member ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsCoord {
    pub name: String,
    pub members: Vec<i32>,
}

impl EnsCoord {
    pub fn len(&self) -> usize {
        self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_time_units_string() {
        let tc = TimeCoord {
            name: "time".to_string(),
            unit: "Hour".to_string(),
            reference: Utc.with_ymd_and_hms(2014, 10, 24, 0, 0, 0).unwrap(),
            values: TimeValues::Offsets(vec![0, 6, 12]),
        };
        assert_eq!(tc.units_string(), "Hour since 2014-10-24T00:00:00Z");
        assert_eq!(tc.len(), 3);
        assert!(!tc.values.is_interval());
    }

    #[test]
    fn test_interval_time_values() {
        let values = TimeValues::Intervals(vec![(0, 6), (6, 12)]);
        assert_eq!(values.len(), 2);
        assert!(values.is_interval());
    }

    #[test]
    fn test_layer_midpoint() {
        let vc = VertCoord {
            level_code: 112,
            is_layer: true,
            levels: vec![Level::layer(0.0, 10.0), Level::layer(10.0, 40.0)],
            name: "depth_layer".to_string(),
            unit: "cm".to_string(),
            positive_up: false,
            datum: Some("land surface".to_string()),
        };
        assert_eq!(vc.coord_value(&vc.levels[0]), 5.0);
        assert_eq!(vc.coord_value(&vc.levels[1]), 25.0);
    }

    #[test]
    fn test_single_level_value() {
        let vc = VertCoord {
            level_code: 100,
            is_layer: false,
            levels: vec![Level::single(500.0)],
            name: "isobaric".to_string(),
            unit: "hPa".to_string(),
            positive_up: false,
            datum: None,
        };
        assert_eq!(vc.coord_value(&vc.levels[0]), 500.0);
    }
}
