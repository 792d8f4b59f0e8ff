//! Shortest-path search over the network and the cell travel time matrix

pub mod dijkstra;
pub mod matrix;

pub use dijkstra::shortest_distances;
pub use matrix::{DistanceMatrix, ShortestPathEngine};
