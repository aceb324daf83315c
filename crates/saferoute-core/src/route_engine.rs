//! Offline A* search over the road graph with danger-zone exclusion.
//!
//! Zones are enforced during relaxation: a neighbor inside any zone is never
//! pushed onto the open set, so the search cannot pass through a hazard even
//! transiently. All search state lives for one call only.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::graph::{NodeId, RoadGraph};
use crate::models::{DangerZone, Point, Route};
use crate::safety::zone_containing;
use crate::spatial::distance_m;

/// Node path produced by [`find_node_path`].
#[derive(Debug, Clone, PartialEq)]
pub struct GraphPath {
    pub nodes: Vec<NodeId>,
    pub cost_m: f64,
    pub nodes_visited: usize,
}

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    node: NodeId,
    g_score: FloatOrd,
    f_score: FloatOrd,
}

// Ties on f prefer the larger g (closer to the goal), then the lower node id.
impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_score
            .cmp(&other.f_score)
            .then_with(|| other.g_score.cmp(&self.g_score))
            .then_with(|| self.node.cmp(&other.node))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Closest graph node to `point` by linear scan.
///
/// Ties go to the first node in insertion order. Returns `None` on an empty
/// graph.
pub fn nearest_node(graph: &RoadGraph, point: Point) -> Option<NodeId> {
    let mut best: Option<(NodeId, f64)> = None;
    for node in graph.nodes() {
        let dist = distance_m(point, node.point);
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((node.id, dist)),
        }
    }
    best.map(|(id, _)| id)
}

/// Snap `start` and `end` to the graph and search between them.
///
/// The returned route contains graph node coordinates only; consecutive
/// points are joined by a graph edge and none lies inside a zone.
pub fn find_path(
    graph: &RoadGraph,
    start: Point,
    end: Point,
    zones: &[DangerZone],
) -> Option<Route> {
    let start_node = nearest_node(graph, start)?;
    let goal_node = nearest_node(graph, end)?;
    let path = find_node_path(graph, start_node, goal_node, zones)?;
    tracing::debug!(
        "Offline A* found {} nodes ({:.0} m) after visiting {}",
        path.nodes.len(),
        path.cost_m,
        path.nodes_visited
    );

    let points = path
        .nodes
        .iter()
        .filter_map(|id| graph.node(*id).map(|node| node.point))
        .collect();
    Some(Route::new(points))
}

/// A* between two nodes, skipping any node inside a zone.
///
/// Returns `None` when either endpoint sits inside a zone or the open set
/// empties before the goal is reached.
pub fn find_node_path(
    graph: &RoadGraph,
    start: NodeId,
    goal: NodeId,
    zones: &[DangerZone],
) -> Option<GraphPath> {
    let start_point = graph.node(start)?.point;
    let goal_point = graph.node(goal)?.point;

    let blocked = |point: Point| zone_containing(zones, point).is_some();
    if blocked(start_point) || blocked(goal_point) {
        return None;
    }

    let mut open_set: BinaryHeap<Reverse<OpenNode>> = BinaryHeap::new();
    open_set.push(Reverse(OpenNode {
        node: start,
        g_score: FloatOrd(0.0),
        f_score: FloatOrd(distance_m(start_point, goal_point)),
    }));
    let mut closed_set: HashSet<NodeId> = HashSet::new();
    let mut g_score: HashMap<NodeId, f64> = HashMap::new();
    let mut came_from: HashMap<NodeId, NodeId> = HashMap::new();
    g_score.insert(start, 0.0);

    let mut nodes_visited = 0usize;

    while let Some(Reverse(current)) = open_set.pop() {
        if closed_set.contains(&current.node) {
            continue;
        }
        let best_g = g_score
            .get(&current.node)
            .copied()
            .unwrap_or(f64::INFINITY);
        if current.g_score.0 > best_g + 1e-9 {
            continue;
        }

        nodes_visited += 1;

        if current.node == goal {
            let mut nodes = vec![goal];
            let mut cursor = goal;
            while let Some(prev) = came_from.get(&cursor) {
                nodes.push(*prev);
                cursor = *prev;
            }
            nodes.reverse();
            return Some(GraphPath {
                nodes,
                cost_m: best_g,
                nodes_visited,
            });
        }

        closed_set.insert(current.node);

        for edge in graph.neighbors(current.node) {
            if closed_set.contains(&edge.to) {
                continue;
            }
            let Some(next) = graph.node(edge.to) else {
                continue;
            };
            if blocked(next.point) {
                continue;
            }

            let tentative_g = best_g + edge.distance_m;
            if tentative_g < g_score.get(&edge.to).copied().unwrap_or(f64::INFINITY) {
                came_from.insert(edge.to, current.node);
                g_score.insert(edge.to, tentative_g);
                open_set.push(Reverse(OpenNode {
                    node: edge.to,
                    g_score: FloatOrd(tentative_g),
                    f_score: FloatOrd(tentative_g + distance_m(next.point, goal_point)),
                }));
            }
        }
    }

    None
}
