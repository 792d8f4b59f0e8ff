pub use crate::UNREACHABLE;

// Building the network
pub use crate::loading::{GridConfig, build_graph, load_routes, load_stations};
pub use crate::model::{GeoGrid, NodeRegistry, Route, Station, TransitGraph};

// Computing and storing the matrix
pub use crate::io::{MatrixMeta, read_matrix, write_matrix, write_matrix_meta};
pub use crate::routing::{DistanceMatrix, ShortestPathEngine};

// Core types
pub use crate::Error;
pub use crate::Minutes; // minutes
pub use crate::NodeId;
