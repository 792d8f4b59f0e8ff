//! Travel-time matrices over a hybrid walking and public transit network.
//!
//! The coverage area is split into a regular grid of cells. Cells, transit
//! stations and scheduled stop events become nodes of one directed graph, and
//! a shortest-path search from every cell yields a dense cell-to-cell matrix
//! of travel times in minutes.

pub mod error;
pub mod io;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod routing;

pub use error::{Error, InputError};
pub use io::{MatrixMeta, read_matrix, write_matrix, write_matrix_meta};
pub use loading::{GridConfig, build_graph, load_routes, load_stations};
pub use model::{
    EdgeKind, GeoGrid, NodeKind, NodeRef, NodeRegistry, Route, ScheduledTime, Station, StopEvent,
    TransitGraph, TravelEdge,
};
pub use routing::{DistanceMatrix, ShortestPathEngine};

/// Dense node identifier, equal to the petgraph node index
pub type NodeId = usize;

/// Travel cost in minutes
pub type Minutes = f64;

/// Matrix entry for cells that cannot be reached from the source
pub const UNREACHABLE: Minutes = f64::INFINITY;

/// Timing marker carried by a route's first stop when it has no time reference
pub const SCHEDULE_SENTINEL: &str = "***";
