//! Regular lattice of walking cells over the configured bounding box

use geo::{Point, Rect, coord};

use crate::loading::GridConfig;
use crate::{Error, Minutes, NodeId};

/// Maps geographic coordinates onto a `width × height` grid of cells.
///
/// Cell `(0, 0)` touches the western and southern bounds. Longitude is the `x`
/// axis, latitude the `y` axis.
#[derive(Debug, Clone)]
pub struct GeoGrid {
    width: usize,
    height: usize,
    area: Rect<f64>,
    cell_width_km: f64,
    cell_height_km: f64,
    walking_speed_kmh: f64,
}

impl GeoGrid {
    /// Validates the configuration and derives cell dimensions
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for empty grids, degenerate or
    /// non-finite bounds, and non-positive distance or speed constants.
    pub fn new(config: &GridConfig) -> Result<Self, Error> {
        if config.width == 0 || config.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "grid must have at least one cell, got {}x{}",
                config.width, config.height
            )));
        }
        // every cell pair needs one f64 in the matrix
        let matrix_bytes = config
            .width
            .checked_mul(config.height)
            .and_then(|cells| cells.checked_mul(cells))
            .and_then(|entries| entries.checked_mul(std::mem::size_of::<Minutes>()));
        if matrix_bytes.is_none_or(|bytes| bytes > isize::MAX as usize) {
            return Err(Error::InvalidConfig(format!(
                "grid {}x{} is too large for a travel time matrix",
                config.width, config.height
            )));
        }

        let bounds = config.bounds;
        if ![bounds.west, bounds.east, bounds.south, bounds.north]
            .iter()
            .all(|value| value.is_finite())
        {
            return Err(Error::InvalidConfig(format!(
                "bounding box must be finite: {bounds:?}"
            )));
        }
        if bounds.west == bounds.east || bounds.south == bounds.north {
            return Err(Error::InvalidConfig(format!(
                "bounding box has zero extent: {bounds:?}"
            )));
        }

        for (name, value) in [
            ("km_per_degree_lon", config.km_per_degree_lon),
            ("km_per_degree_lat", config.km_per_degree_lat),
            ("walking_speed_kmh", config.walking_speed_kmh),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }

        let area = Rect::new(
            coord! { x: bounds.west, y: bounds.south },
            coord! { x: bounds.east, y: bounds.north },
        );

        #[allow(clippy::cast_precision_loss)]
        let (cell_width_km, cell_height_km) = (
            area.width() / config.width as f64 * config.km_per_degree_lon,
            area.height() / config.height as f64 * config.km_per_degree_lat,
        );

        Ok(Self {
            width: config.width,
            height: config.height,
            area,
            cell_width_km,
            cell_height_km,
            walking_speed_kmh: config.walking_speed_kmh,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    pub fn area(&self) -> Rect<f64> {
        self.area
    }

    pub fn cell_width_km(&self) -> f64 {
        self.cell_width_km
    }

    pub fn cell_height_km(&self) -> f64 {
        self.cell_height_km
    }

    pub fn walking_speed_kmh(&self) -> f64 {
        self.walking_speed_kmh
    }

    /// Minutes to walk between two horizontally adjacent cells
    pub fn horizontal_walk(&self) -> Minutes {
        self.cell_width_km / self.walking_speed_kmh * 60.0
    }

    /// Minutes to walk between two vertically adjacent cells
    pub fn vertical_walk(&self) -> Minutes {
        self.cell_height_km / self.walking_speed_kmh * 60.0
    }

    /// Node id of a cell, `y * width + x`
    ///
    /// # Errors
    ///
    /// Returns [`Error::CellOutOfRange`] if the cell is not on the grid.
    pub fn cell_to_node(&self, x: usize, y: usize) -> Result<NodeId, Error> {
        if x >= self.width || y >= self.height {
            return Err(Error::CellOutOfRange { x, y });
        }
        Ok(y * self.width + x)
    }

    /// Inverse of [`GeoGrid::cell_to_node`]
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNodeIndex`] if `node` is not a cell node.
    pub fn node_to_cell(&self, node: NodeId) -> Result<(usize, usize), Error> {
        if node >= self.cell_count() {
            return Err(Error::InvalidNodeIndex(node));
        }
        Ok((node % self.width, node / self.width))
    }

    /// Cell containing the coordinate, or `None` if it lies outside the box.
    ///
    /// Points on the boundary itself count as outside.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn coordinate_to_cell(&self, lat: f64, lon: f64) -> Option<(usize, usize)> {
        let min = self.area.min();
        let max = self.area.max();
        let inside = lon > min.x && lon < max.x && lat > min.y && lat < max.y;
        if !inside {
            return None;
        }

        let x = ((lon - min.x) / self.area.width() * self.width as f64).floor() as usize;
        let y = ((lat - min.y) / self.area.height() * self.height as f64).floor() as usize;

        // A coordinate a hair below the far bound can round up to the edge
        Some((x.min(self.width - 1), y.min(self.height - 1)))
    }

    /// Same as [`GeoGrid::coordinate_to_cell`] for a `(lon, lat)` point
    pub fn locate(&self, point: Point<f64>) -> Option<(usize, usize)> {
        self.coordinate_to_cell(point.y(), point.x())
    }

    /// Geographic center of a cell
    ///
    /// # Errors
    ///
    /// Returns [`Error::CellOutOfRange`] if the cell is not on the grid.
    #[allow(clippy::cast_precision_loss)]
    pub fn cell_center(&self, x: usize, y: usize) -> Result<Point<f64>, Error> {
        self.cell_to_node(x, y)?;
        let min = self.area.min();
        let lon = min.x + (x as f64 + 0.5) * self.area.width() / self.width as f64;
        let lat = min.y + (y as f64 + 0.5) * self.area.height() / self.height as f64;
        Ok(Point::new(lon, lat))
    }

    /// Orthogonal neighbours of a cell that exist on the grid, with the walking
    /// time to reach each of them
    pub fn neighbours(&self, x: usize, y: usize) -> impl Iterator<Item = (usize, usize, Minutes)> {
        let horizontal = self.horizontal_walk();
        let vertical = self.vertical_walk();
        let (width, height) = (self.width, self.height);

        [
            (x > 0).then(|| (x - 1, y, horizontal)),
            (x + 1 < width).then(|| (x + 1, y, horizontal)),
            (y > 0).then(|| (x, y - 1, vertical)),
            (y + 1 < height).then(|| (x, y + 1, vertical)),
        ]
        .into_iter()
        .flatten()
    }
}
