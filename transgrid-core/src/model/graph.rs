//! Finalized network graph

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use super::{GeoGrid, NodeKind, NodeRegistry};
use crate::{Minutes, NodeId};

/// Meaning of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Walking between adjacent cells
    Walk,
    /// Entering or leaving a station from its cell
    Access,
    /// Waiting at a station for a route to depart
    Board,
    /// Getting off a route at a station
    Alight,
    /// Riding a route to its next stop
    Ride,
}

/// Directed weighted edge, weight in minutes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelEdge {
    pub minutes: Minutes,
    pub kind: EdgeKind,
}

/// Number of edges of each kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeCounts {
    pub walk: usize,
    pub access: usize,
    pub board: usize,
    pub alight: usize,
    pub ride: usize,
}

/// Read-only network of cells, stations and stop events.
///
/// Node indices of the inner graph are the ids handed out by the
/// [`NodeRegistry`].
#[derive(Debug, Clone)]
pub struct TransitGraph {
    pub(crate) graph: DiGraph<NodeKind, TravelEdge>,
    pub(crate) grid: GeoGrid,
    pub(crate) registry: NodeRegistry,
    /// Input indices of stations outside the bounding box
    pub(crate) out_of_bounds: Vec<usize>,
}

impl TransitGraph {
    pub fn grid(&self) -> &GeoGrid {
        &self.grid
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn cell_count(&self) -> usize {
        self.registry.cell_count()
    }

    /// Stations that received no cell connection
    pub fn out_of_bounds_stations(&self) -> &[usize] {
        &self.out_of_bounds
    }

    pub fn node_kind(&self, node: NodeId) -> Option<NodeKind> {
        self.graph.node_weight(NodeIndex::new(node)).copied()
    }

    /// Outgoing edges of a node as `(target, edge)` pairs
    pub fn edges_from(&self, node: NodeId) -> impl Iterator<Item = (NodeId, &TravelEdge)> {
        self.graph
            .edges(NodeIndex::new(node))
            .map(|edge| (edge.target().index(), edge.weight()))
    }

    pub fn edge_counts(&self) -> EdgeCounts {
        let mut counts = EdgeCounts::default();
        for edge in self.graph.edge_weights() {
            match edge.kind {
                EdgeKind::Walk => counts.walk += 1,
                EdgeKind::Access => counts.access += 1,
                EdgeKind::Board => counts.board += 1,
                EdgeKind::Alight => counts.alight += 1,
                EdgeKind::Ride => counts.ride += 1,
            }
        }
        counts
    }
}
