use std::{cmp::Ordering, collections::BinaryHeap};

use fixedbitset::FixedBitSet;

use crate::{Minutes, NodeId, TransitGraph, UNREACHABLE};

#[derive(Copy, Clone, PartialEq)]
struct State {
    cost: Minutes,
    node: NodeId,
}

// Costs are never NaN, the builder rejects such weights
impl Eq for State {}

// Implement Ord for State to use in BinaryHeap
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by cost (reversed from standard Rust BinaryHeap)
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reusable buffers for repeated searches over the same graph
pub(crate) struct SearchSpace {
    distances: Vec<Minutes>,
    settled: FixedBitSet,
    heap: BinaryHeap<State>,
}

impl SearchSpace {
    pub(crate) fn new(node_count: usize) -> Self {
        Self {
            distances: vec![UNREACHABLE; node_count],
            settled: FixedBitSet::with_capacity(node_count),
            heap: BinaryHeap::with_capacity(node_count / 4),
        }
    }

    fn reset(&mut self) {
        self.distances.fill(UNREACHABLE);
        self.settled.clear();
        self.heap.clear();
    }
}

/// Dijkstra's algorithm from `source` over the whole network.
///
/// With `cells_only` the search ends as soon as every cell node is settled,
/// leaving distances to other nodes possibly unfinished.
fn search(graph: &TransitGraph, source: NodeId, space: &mut SearchSpace, cells_only: bool) {
    space.reset();
    let cell_count = graph.cell_count();
    let mut settled_cells = 0;

    // Start node has distance 0
    space.distances[source] = 0.0;
    space.heap.push(State {
        cost: 0.0,
        node: source,
    });

    while let Some(State { cost, node }) = space.heap.pop() {
        // Stale heap entry, a shorter path was settled already
        if space.settled.put(node) {
            continue;
        }

        if node < cell_count {
            settled_cells += 1;
            if cells_only && settled_cells == cell_count {
                break;
            }
        }

        for (next, edge) in graph.edges_from(node) {
            if space.settled.contains(next) {
                continue;
            }
            let next_cost = cost + edge.minutes;
            if next_cost < space.distances[next] {
                space.distances[next] = next_cost;
                space.heap.push(State {
                    cost: next_cost,
                    node: next,
                });
            }
        }
    }
}

/// Shortest travel time from `source` to every node of the graph.
/// Unreachable nodes get [`UNREACHABLE`].
///
/// # Panics
///
/// If `source` is not a node of the graph
pub fn shortest_distances(graph: &TransitGraph, source: NodeId) -> Vec<Minutes> {
    let mut space = SearchSpace::new(graph.node_count());
    search(graph, source, &mut space, false);
    space.distances
}

/// Fills `row` with the travel times from cell `source` to every cell
pub(crate) fn cell_distances_into(
    graph: &TransitGraph,
    source: NodeId,
    space: &mut SearchSpace,
    row: &mut [Minutes],
) {
    search(graph, source, space, true);
    row.copy_from_slice(&space.distances[..row.len()]);
}
