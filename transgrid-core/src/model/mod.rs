//! Data model for the walking grid and the transit network
//!
//! Contains the grid geometry, node numbering, transit records and the
//! finalized graph.

pub mod graph;
pub mod grid;
pub mod registry;
pub mod transit;

pub use graph::{EdgeCounts, EdgeKind, TransitGraph, TravelEdge};
pub use grid::GeoGrid;
pub use registry::{NodeKind, NodeRef, NodeRegistry};
pub use transit::{Route, ScheduledTime, Station, StopEvent};
