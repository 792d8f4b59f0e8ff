use itertools::Itertools;
use log::{debug, info, warn};
use petgraph::graph::{DiGraph, NodeIndex};

use super::config::GridConfig;
use crate::model::{
    EdgeKind, GeoGrid, NodeKind, NodeRegistry, Route, ScheduledTime, Station, TransitGraph,
    TravelEdge,
};
use crate::{Error, InputError, Minutes, NodeId};

/// Builds the network graph from a grid configuration and transit records
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the records are
/// malformed, or any edge would get a negative weight
pub fn build_graph(
    config: &GridConfig,
    stations: &[Station],
    routes: &[Route],
) -> Result<TransitGraph, Error> {
    GraphBuilder::new(config, stations, routes)?.build()
}

/// Assembles the layered graph: walking grid, station access, boarding and
/// riding edges.
///
/// All input validation happens before the first edge is added, so a builder
/// that was created successfully only fails on bad edge weights.
pub struct GraphBuilder<'a> {
    stations: &'a [Station],
    routes: &'a [Route],
    grid: GeoGrid,
    registry: NodeRegistry,
    graph: DiGraph<NodeKind, TravelEdge>,
    out_of_bounds: Vec<usize>,
}

impl<'a> GraphBuilder<'a> {
    /// Validates the inputs and numbers every node
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] or [`Error::MalformedInputData`]
    pub fn new(
        config: &GridConfig,
        stations: &'a [Station],
        routes: &'a [Route],
    ) -> Result<Self, Error> {
        let grid = GeoGrid::new(config)?;
        let registry = NodeRegistry::new(&grid, stations, routes)?;
        validate_route_timings(routes)?;

        let mut graph = DiGraph::with_capacity(registry.node_count(), 0);
        for node in 0..registry.node_count() {
            let kind = registry
                .kind(node)
                .ok_or(Error::InvalidNodeIndex(node))?;
            graph.add_node(kind);
        }

        Ok(Self {
            stations,
            routes,
            grid,
            registry,
            graph,
            out_of_bounds: Vec::new(),
        })
    }

    /// Adds every edge and freezes the graph
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEdgeWeight`] for negative or non-finite weights
    pub fn build(mut self) -> Result<TransitGraph, Error> {
        info!(
            "Building graph over {}x{} cells, {} stations, {} routes",
            self.grid.width(),
            self.grid.height(),
            self.stations.len(),
            self.routes.len()
        );

        self.add_walking_edges()?;
        debug!("Walking edges done");
        self.add_station_access()?;
        debug!("Station to cell mapping done");
        self.add_boarding_edges()?;
        debug!("Station to route mapping done");
        self.add_ride_edges()?;
        debug!("Route edges done");

        let graph = TransitGraph {
            graph: self.graph,
            grid: self.grid,
            registry: self.registry,
            out_of_bounds: self.out_of_bounds,
        };

        let counts = graph.edge_counts();
        info!(
            "Graph built: {} nodes, {} edges (walk {}, access {}, board {}, alight {}, ride {})",
            graph.node_count(),
            graph.edge_count(),
            counts.walk,
            counts.access,
            counts.board,
            counts.alight,
            counts.ride
        );
        if !graph.out_of_bounds.is_empty() {
            warn!(
                "{} of {} stations are outside the grid and unreachable on foot",
                graph.out_of_bounds.len(),
                graph.registry.station_count()
            );
        }

        Ok(graph)
    }

    fn add_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        minutes: Minutes,
        kind: EdgeKind,
        context: impl FnOnce() -> String,
    ) -> Result<(), Error> {
        if !(minutes.is_finite() && minutes >= 0.0) {
            return Err(Error::InvalidEdgeWeight {
                from,
                to,
                weight: minutes,
                context: context(),
            });
        }
        self.graph.add_edge(
            NodeIndex::new(from),
            NodeIndex::new(to),
            TravelEdge { minutes, kind },
        );
        Ok(())
    }

    /// Two directed edges between every pair of orthogonally adjacent cells
    fn add_walking_edges(&mut self) -> Result<(), Error> {
        let (width, height) = (self.grid.width(), self.grid.height());
        for y in 0..height {
            for x in 0..width {
                let from = self.grid.cell_to_node(x, y)?;
                let neighbours: Vec<_> = self.grid.neighbours(x, y).collect();
                for (nx, ny, minutes) in neighbours {
                    let to = self.grid.cell_to_node(nx, ny)?;
                    self.add_edge(from, to, minutes, EdgeKind::Walk, || {
                        format!("walking from cell ({x}, {y}) to ({nx}, {ny})")
                    })?;
                }
            }
        }
        Ok(())
    }

    /// Free transfer between a station and the cell it stands in
    fn add_station_access(&mut self) -> Result<(), Error> {
        let stations = self.stations;
        for (index, station) in stations.iter().enumerate() {
            let station_node = self
                .registry
                .station_node_at(index)
                .ok_or(Error::InvalidNodeIndex(index))?;

            let Some((x, y)) = self.grid.locate(station.geometry) else {
                warn!(
                    "Station '{}' at ({}, {}) is outside the bounding box",
                    station.id,
                    station.lat(),
                    station.lon()
                );
                self.out_of_bounds.push(index);
                continue;
            };

            let cell = self.grid.cell_to_node(x, y)?;
            let context = || format!("access to station '{}'", station.id);
            self.add_edge(cell, station_node, 0.0, EdgeKind::Access, context)?;
            self.add_edge(station_node, cell, 0.0, EdgeKind::Access, context)?;
        }
        Ok(())
    }

    /// Waiting for a route at its stations and getting off again
    fn add_boarding_edges(&mut self) -> Result<(), Error> {
        let routes = self.routes;
        for (route_idx, route) in routes.iter().enumerate() {
            let wait = route.expected_wait();
            for stop_idx in 0..route.stops.len() {
                let (stop, station) = self.stop_and_station(route_idx, stop_idx)?;
                self.add_edge(station, stop, wait, EdgeKind::Board, || {
                    format!(
                        "boarding route {route_idx} at stop {stop_idx}, median wait {}",
                        route.median_wait
                    )
                })?;
                self.add_edge(stop, station, 0.0, EdgeKind::Alight, || {
                    format!("alighting route {route_idx} at stop {stop_idx}")
                })?;
            }
        }
        Ok(())
    }

    /// One edge from each stop to the next along every route
    fn add_ride_edges(&mut self) -> Result<(), Error> {
        let routes = self.routes;
        for (route_idx, route) in routes.iter().enumerate() {
            for ((from_idx, from), (to_idx, to)) in route.stops.iter().enumerate().tuple_windows()
            {
                let minutes = ride_minutes(from.time, to.time).ok_or(
                    InputError::MisplacedSentinel {
                        route: route_idx,
                        stop: to_idx,
                    },
                )?;
                let (from_node, _) = self.stop_and_station(route_idx, from_idx)?;
                let (to_node, _) = self.stop_and_station(route_idx, to_idx)?;
                self.add_edge(from_node, to_node, minutes, EdgeKind::Ride, || {
                    format!("riding route {route_idx} from stop {from_idx} to stop {to_idx}")
                })?;
            }
        }
        Ok(())
    }

    fn stop_and_station(&self, route: usize, sequence: usize) -> Result<(NodeId, NodeId), Error> {
        let stop = self
            .registry
            .stop_node(route, sequence)
            .ok_or(Error::InvalidNodeIndex(sequence))?;
        let station = self
            .registry
            .stop_station(stop)
            .ok_or(Error::InvalidNodeIndex(stop))?;
        Ok((stop, station))
    }
}

/// Travel time between consecutive stops.
///
/// After a stop without a time reference the next stop's scheduled time is
/// taken as is.
fn ride_minutes(from: ScheduledTime, to: ScheduledTime) -> Option<Minutes> {
    match (from, to) {
        (ScheduledTime::Sentinel, ScheduledTime::At(to)) => Some(to),
        (ScheduledTime::At(from), ScheduledTime::At(to)) => Some(to - from),
        (_, ScheduledTime::Sentinel) => None,
    }
}

fn validate_route_timings(routes: &[Route]) -> Result<(), InputError> {
    for (route_idx, route) in routes.iter().enumerate() {
        if let Some((stop_idx, _)) = route
            .stops
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, stop)| stop.time.is_sentinel())
        {
            return Err(InputError::MisplacedSentinel {
                route: route_idx,
                stop: stop_idx,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loading::config::Bounds;
    use crate::model::StopEvent;

    fn config(width: usize, height: usize) -> GridConfig {
        GridConfig {
            width,
            height,
            bounds: Bounds {
                west: 0.0,
                east: 1.0,
                south: 0.0,
                north: 1.0,
            },
            km_per_degree_lon: 4.5,
            km_per_degree_lat: 4.5,
            walking_speed_kmh: 4.5,
            threads: None,
        }
    }

    fn stop(station: &str, time: &str) -> StopEvent {
        StopEvent::new(station, ScheduledTime::parse(time).unwrap())
    }

    fn edges_between(graph: &TransitGraph, from: NodeId, to: NodeId) -> Vec<TravelEdge> {
        graph
            .edges_from(from)
            .filter(|(target, _)| *target == to)
            .map(|(_, edge)| *edge)
            .collect()
    }

    #[test]
    fn walking_grid_has_four_neighbour_edges() {
        let graph = build_graph(&config(3, 2), &[], &[]).unwrap();
        // 2 * (horizontal pairs + vertical pairs)
        assert_eq!(graph.edge_count(), 2 * (2 * 2 + 3));
        assert_eq!(graph.edge_counts().walk, graph.edge_count());
        assert_eq!(graph.edges_from(0).count(), 2);
        assert_eq!(graph.edges_from(1).count(), 3);
        assert!(edges_between(&graph, 0, 4).is_empty());

        let right = edges_between(&graph, 0, 1);
        assert_eq!(right.len(), 1);
        assert!((right[0].minutes - 20.0).abs() < 1e-9);
        let up = edges_between(&graph, 0, 3);
        assert!((up[0].minutes - 30.0).abs() < 1e-9);
    }

    #[test]
    fn transit_layers_are_wired() {
        let stations = vec![
            Station::new("a", 0.25, 0.25),
            Station::new("b", 0.75, 0.75),
        ];
        let routes = vec![Route::new(
            vec![stop("a", "***"), stop("b", "7"), stop("a", "10-12")],
            6.0,
        )];
        let graph = build_graph(&config(2, 2), &stations, &routes).unwrap();
        let registry = graph.registry();

        let a = registry.station_node("a").unwrap();
        let b = registry.station_node("b").unwrap();
        assert_eq!(edges_between(&graph, 0, a)[0].kind, EdgeKind::Access);
        assert_eq!(edges_between(&graph, b, 3)[0].minutes, 0.0);

        let first = registry.stop_node(0, 0).unwrap();
        let second = registry.stop_node(0, 1).unwrap();
        let third = registry.stop_node(0, 2).unwrap();

        let board = edges_between(&graph, a, first);
        assert_eq!(board[0].kind, EdgeKind::Board);
        assert!((board[0].minutes - 3.0).abs() < 1e-12);
        assert_eq!(edges_between(&graph, third, a)[0].kind, EdgeKind::Alight);

        assert!((edges_between(&graph, first, second)[0].minutes - 7.0).abs() < 1e-12);
        assert!((edges_between(&graph, second, third)[0].minutes - 4.0).abs() < 1e-12);
        assert!(edges_between(&graph, second, first).is_empty());

        let counts = graph.edge_counts();
        assert_eq!(counts.access, 4);
        assert_eq!(counts.board, 3);
        assert_eq!(counts.alight, 3);
        assert_eq!(counts.ride, 2);
    }

    #[test]
    fn station_outside_box_gets_no_access_edges() {
        let stations = vec![Station::new("far", 5.0, 5.0), Station::new("in", 0.5, 0.5)];
        let graph = build_graph(&config(2, 2), &stations, &[]).unwrap();
        assert_eq!(graph.out_of_bounds_stations(), &[0]);

        let far = graph.registry().station_node("far").unwrap();
        assert_eq!(graph.edges_from(far).count(), 0);
        assert_eq!(graph.edge_counts().access, 2);
    }

    #[test]
    fn negative_ride_time_is_fatal() {
        let stations = vec![Station::new("a", 0.5, 0.5), Station::new("b", 0.5, 0.5)];
        let routes = vec![Route::new(vec![stop("a", "20"), stop("b", "15")], 2.0)];
        let err = build_graph(&config(1, 1), &stations, &routes).unwrap_err();
        match err {
            Error::InvalidEdgeWeight { weight, context, .. } => {
                assert!((weight + 5.0).abs() < 1e-12);
                assert!(context.contains("route 0"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn negative_median_wait_is_fatal() {
        let stations = vec![Station::new("a", 0.5, 0.5)];
        let routes = vec![Route::new(vec![stop("a", "1")], -4.0)];
        assert!(matches!(
            build_graph(&config(1, 1), &stations, &routes),
            Err(Error::InvalidEdgeWeight { .. })
        ));
    }

    #[test]
    fn sentinel_after_first_stop_is_malformed() {
        let stations = vec![Station::new("a", 0.5, 0.5)];
        let routes = vec![Route::new(
            vec![stop("a", "1"), stop("a", "2"), stop("a", "***")],
            2.0,
        )];
        assert!(matches!(
            GraphBuilder::new(&config(1, 1), &stations, &routes),
            Err(Error::MalformedInputData(InputError::MisplacedSentinel {
                route: 0,
                stop: 2
            }))
        ));
    }

    #[test]
    fn ride_minutes_follow_sentinel_rule() {
        assert_eq!(
            ride_minutes(ScheduledTime::Sentinel, ScheduledTime::At(9.0)),
            Some(9.0)
        );
        assert_eq!(
            ride_minutes(ScheduledTime::At(4.0), ScheduledTime::At(9.0)),
            Some(5.0)
        );
        assert_eq!(
            ride_minutes(ScheduledTime::At(4.0), ScheduledTime::Sentinel),
            None
        );
    }
}
