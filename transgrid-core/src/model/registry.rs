//! Dense node numbering for cells, stations and stop events

use hashbrown::HashMap;

use super::{GeoGrid, Route, Station};
use crate::{Error, InputError, NodeId};

/// Kind of a graph node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Cell,
    Station,
    StopEvent,
}

/// What a node id stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef<'a> {
    Cell { x: usize, y: usize },
    Station { index: usize, id: &'a str },
    StopEvent { route: usize, sequence: usize },
}

/// Assigns node ids in three consecutive blocks.
///
/// Cells come first (`y * width + x`), stations follow in input order, and
/// stop events close the range in route order, each route's stops kept in
/// sequence.
#[derive(Debug, Clone)]
pub struct NodeRegistry {
    width: usize,
    cell_count: usize,
    station_ids: Vec<String>,
    station_index: HashMap<String, usize>,
    /// Prefix sums of stops per route, `routes + 1` entries
    route_offsets: Vec<usize>,
    /// Station index served by each stop event
    stop_stations: Vec<usize>,
}

impl NodeRegistry {
    /// Numbers all nodes of the network
    ///
    /// # Errors
    ///
    /// Returns [`InputError::DuplicateStation`] if two stations share an id and
    /// [`InputError::UnknownStation`] if a stop references a missing station.
    pub fn new(grid: &GeoGrid, stations: &[Station], routes: &[Route]) -> Result<Self, Error> {
        let mut station_index = HashMap::with_capacity(stations.len());
        for (index, station) in stations.iter().enumerate() {
            if station_index.insert(station.id.clone(), index).is_some() {
                return Err(InputError::DuplicateStation {
                    station: station.id.clone(),
                }
                .into());
            }
        }

        let mut route_offsets = Vec::with_capacity(routes.len() + 1);
        let mut stop_stations = Vec::new();
        route_offsets.push(0);

        for (route_idx, route) in routes.iter().enumerate() {
            for (stop_idx, stop) in route.stops.iter().enumerate() {
                let station = *station_index.get(stop.station_id.as_str()).ok_or_else(|| {
                    InputError::UnknownStation {
                        route: route_idx,
                        stop: stop_idx,
                        station: stop.station_id.clone(),
                    }
                })?;
                stop_stations.push(station);
            }
            route_offsets.push(stop_stations.len());
        }

        Ok(Self {
            width: grid.width(),
            cell_count: grid.cell_count(),
            station_ids: stations.iter().map(|s| s.id.clone()).collect(),
            station_index,
            route_offsets,
            stop_stations,
        })
    }

    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    pub fn station_count(&self) -> usize {
        self.station_ids.len()
    }

    pub fn stop_count(&self) -> usize {
        self.stop_stations.len()
    }

    pub fn route_count(&self) -> usize {
        self.route_offsets.len() - 1
    }

    pub fn node_count(&self) -> usize {
        self.cell_count + self.station_count() + self.stop_count()
    }

    fn station_base(&self) -> NodeId {
        self.cell_count
    }

    fn stop_base(&self) -> NodeId {
        self.cell_count + self.station_count()
    }

    /// Node of the station with the given external id
    pub fn station_node(&self, station_id: &str) -> Option<NodeId> {
        self.station_index
            .get(station_id)
            .map(|index| self.station_base() + index)
    }

    /// Node of the station at `index` in the input list
    pub fn station_node_at(&self, index: usize) -> Option<NodeId> {
        (index < self.station_count()).then(|| self.station_base() + index)
    }

    /// Node of the `sequence`-th stop of route `route`
    pub fn stop_node(&self, route: usize, sequence: usize) -> Option<NodeId> {
        let start = *self.route_offsets.get(route)?;
        let end = *self.route_offsets.get(route + 1)?;
        (start + sequence < end).then(|| self.stop_base() + start + sequence)
    }

    /// Station node a stop event belongs to
    pub fn stop_station(&self, stop_node: NodeId) -> Option<NodeId> {
        let offset = stop_node.checked_sub(self.stop_base())?;
        self.stop_stations
            .get(offset)
            .map(|index| self.station_base() + index)
    }

    pub fn kind(&self, node: NodeId) -> Option<NodeKind> {
        if node < self.station_base() {
            Some(NodeKind::Cell)
        } else if node < self.stop_base() {
            Some(NodeKind::Station)
        } else if node < self.node_count() {
            Some(NodeKind::StopEvent)
        } else {
            None
        }
    }

    /// Inverse lookup for diagnostics
    pub fn resolve(&self, node: NodeId) -> Option<NodeRef<'_>> {
        match self.kind(node)? {
            NodeKind::Cell => Some(NodeRef::Cell {
                x: node % self.width,
                y: node / self.width,
            }),
            NodeKind::Station => {
                let index = node - self.station_base();
                Some(NodeRef::Station {
                    index,
                    id: &self.station_ids[index],
                })
            }
            NodeKind::StopEvent => {
                let offset = node - self.stop_base();
                // first route whose end lies beyond the offset
                let route = self.route_offsets[1..].partition_point(|&end| end <= offset);
                Some(NodeRef::StopEvent {
                    route,
                    sequence: offset - self.route_offsets[route],
                })
            }
        }
    }
}
