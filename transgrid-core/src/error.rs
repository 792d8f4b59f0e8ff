use thiserror::Error;

use crate::{Minutes, NodeId};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed input data: {0}")]
    MalformedInputData(#[from] InputError),
    #[error("Invalid edge weight {weight} on {from} -> {to} ({context})")]
    InvalidEdgeWeight {
        from: NodeId,
        to: NodeId,
        weight: Minutes,
        context: String,
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Cell ({x}, {y}) is outside the grid")]
    CellOutOfRange { x: usize, y: usize },
    #[error("Invalid node index {0}")]
    InvalidNodeIndex(NodeId),
    #[error("Invalid matrix file: {0}")]
    MatrixFormat(String),
    #[error("Computation cancelled")]
    Cancelled,
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Thread pool error: {0}")]
    ThreadPoolError(#[from] rayon::ThreadPoolBuildError),
}

/// Problems with the station and route records themselves.
///
/// Route and stop indices are zero-based positions in the input lists.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("route {route}, stop {stop} references unknown station '{station}'")]
    UnknownStation {
        route: usize,
        stop: usize,
        station: String,
    },
    #[error("route {route}, stop {stop} has unparsable time '{value}'")]
    UnparsableTime {
        route: usize,
        stop: usize,
        value: String,
    },
    #[error("route {route}, stop {stop} carries the no-timing marker but is not the first stop")]
    MisplacedSentinel { route: usize, stop: usize },
    #[error("station '{station}' is listed more than once")]
    DuplicateStation { station: String },
}
