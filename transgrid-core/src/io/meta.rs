//! JSON description of the grid behind a matrix file, for consumers that map
//! matrix rows back to map cells

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::atomic::atomic_write;
use crate::loading::Bounds;
use crate::{Error, GeoGrid};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixMeta {
    pub width: usize,
    pub height: usize,
    /// Rows and columns of the matrix, `width * height`
    pub cells: usize,
    pub bounds: Bounds,
    pub cell_width_km: f64,
    pub cell_height_km: f64,
    pub walking_speed_kmh: f64,
    /// `[lon, lat]` of the center of cell `(0, 0)`; other centers follow by
    /// adding whole cell widths and heights
    pub first_cell_center: [f64; 2],
    /// Row/column index of cell `(x, y)`
    pub index_order: String,
    pub unit: String,
    /// How unreachable targets are encoded
    pub unreachable: String,
}

impl MatrixMeta {
    /// # Errors
    ///
    /// Returns [`Error::CellOutOfRange`] only for a grid without cells, which
    /// [`GeoGrid::new`] never builds
    pub fn from_grid(grid: &GeoGrid) -> Result<Self, Error> {
        let area = grid.area();
        let center = grid.cell_center(0, 0)?;
        Ok(Self {
            width: grid.width(),
            height: grid.height(),
            cells: grid.cell_count(),
            bounds: Bounds {
                west: area.min().x,
                east: area.max().x,
                south: area.min().y,
                north: area.max().y,
            },
            cell_width_km: grid.cell_width_km(),
            cell_height_km: grid.cell_height_km(),
            walking_speed_kmh: grid.walking_speed_kmh(),
            first_cell_center: [center.x(), center.y()],
            index_order: "y * width + x".to_string(),
            unit: "minutes".to_string(),
            unreachable: "inf".to_string(),
        })
    }
}

/// Writes the metadata as pretty JSON, replacing `path` atomically
///
/// # Errors
///
/// Returns [`Error::IoError`] if the file cannot be written
pub fn write_matrix_meta(path: &Path, meta: &MatrixMeta) -> Result<(), Error> {
    atomic_write(path, |writer| {
        serde_json::to_writer_pretty(&mut *writer, meta)?;
        Ok(())
    })?;
    Ok(())
}
