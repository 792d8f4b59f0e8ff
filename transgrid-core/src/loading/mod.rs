//! This module is responsible for loading station and route data
//! and building the layered walking/transit graph.

mod builder;
pub mod config;
mod de;
pub mod input;

pub use builder::{GraphBuilder, build_graph};
pub use config::{Bounds, GridConfig};
pub use input::{load_routes, load_stations, parse_routes, parse_stations};
