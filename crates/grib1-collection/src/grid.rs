//! Horizontal coordinate systems for GRIB1 groups.

use serde::{Deserialize, Serialize};

/// Projection parameters for grids that are not plain lat/lon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Projection name (e.g. "lambert_conformal_conic", "polar_stereographic").
    pub name: String,
    /// Named numeric parameters, in a stable order.
    pub params: Vec<(String, f64)>,
}

/// The kind of horizontal grid a group is defined on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GridKind {
    /// Regular latitude/longitude grid.
    LatLon,
    /// Latitude/longitude grid with gaussian latitudes along y.
    Gaussian,
    /// Projected grid with x/y axes in km.
    Projected(Projection),
}

/// Horizontal coordinate system: one per group, shared by all its variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizCoordSys {
    pub kind: GridKind,
    /// Number of points along x (longitude or projected x).
    pub nx: usize,
    /// Number of points along y (latitude or projected y).
    pub ny: usize,
    /// Coordinate of the first x point (degrees east, or km).
    pub start_x: f64,
    /// Coordinate of the first y point (degrees north, or km).
    pub start_y: f64,
    /// Spacing along x.
    pub dx: f64,
    /// Spacing along y (negative when the grid scans north to south).
    pub dy: f64,
    /// Gaussian latitudes ordered to match the y axis; only for Gaussian grids.
    pub gauss_lats: Option<Vec<f64>>,
    /// GRIB1 scan mode flags, passed through to the message codec.
    pub scan_mode: u8,
}

impl HorizCoordSys {
    /// Total number of grid points.
    pub fn npoints(&self) -> usize {
        self.nx * self.ny
    }

    /// Values of the y axis: gaussian latitudes when present, arithmetic otherwise.
    pub fn y_values(&self) -> Vec<f64> {
        match &self.gauss_lats {
            Some(lats) => lats.clone(),
            None => (0..self.ny)
                .map(|j| self.start_y + j as f64 * self.dy)
                .collect(),
        }
    }

    /// Values of the x axis, always arithmetic.
    pub fn x_values(&self) -> Vec<f64> {
        (0..self.nx)
            .map(|i| self.start_x + i as f64 * self.dx)
            .collect()
    }

    /// True when the axes are geographic latitude/longitude.
    pub fn is_latlon(&self) -> bool {
        !matches!(self.kind, GridKind::Projected(_))
    }
}
