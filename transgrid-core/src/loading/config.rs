use serde::{Deserialize, Serialize};

/// Geographic rectangle covered by the grid, in degrees.
///
/// Only the extent matters; `west`/`east` and `south`/`north` may be given in
/// either order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl Default for Bounds {
    /// Central Sofia
    fn default() -> Self {
        Self {
            west: 23.19,
            east: 23.47,
            south: 42.60,
            north: 42.79,
        }
    }
}

/// Configuration for building the walking grid and computing the matrix
///
/// Every field has a default, so a TOML file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Number of cells along the west-east axis
    pub width: usize,
    /// Number of cells along the south-north axis
    pub height: usize,
    pub bounds: Bounds,
    /// Kilometres per degree of longitude at the latitude of the area
    pub km_per_degree_lon: f64,
    /// Kilometres per degree of latitude
    pub km_per_degree_lat: f64,
    pub walking_speed_kmh: f64,
    /// Worker threads for the matrix computation, `None` for all cores
    pub threads: Option<usize>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            bounds: Bounds::default(),
            km_per_degree_lon: 85.0,
            km_per_degree_lat: 111.0,
            walking_speed_kmh: 4.5,
            threads: None,
        }
    }
}

impl GridConfig {
    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}
