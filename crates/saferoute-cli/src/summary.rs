//! Road graph statistics for asset inspection.

use std::collections::VecDeque;

use serde::Serialize;

use saferoute_core::{NodeId, Point, RoadGraph};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphSummary {
    pub nodes: usize,
    pub edges: usize,
    pub components: usize,
    pub largest_component: usize,
    pub total_length_m: f64,
    /// South-west and north-east corners.
    pub bounds: Option<(Point, Point)>,
}

pub fn summarize(graph: &RoadGraph) -> GraphSummary {
    let total_length_m = graph
        .nodes()
        .iter()
        .flat_map(|node| graph.neighbors(node.id))
        .map(|edge| edge.distance_m)
        .sum::<f64>()
        / 2.0;

    let bounds = graph.nodes().iter().fold(None, |acc: Option<(Point, Point)>, node| {
        let p = node.point;
        Some(match acc {
            None => (p, p),
            Some((sw, ne)) => (
                Point::new(sw.lat.min(p.lat), sw.lon.min(p.lon)),
                Point::new(ne.lat.max(p.lat), ne.lon.max(p.lon)),
            ),
        })
    });

    let sizes = component_sizes(graph);
    GraphSummary {
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        components: sizes.len(),
        largest_component: sizes.iter().copied().max().unwrap_or(0),
        total_length_m,
        bounds,
    }
}

/// Sizes of the connected components, in discovery order.
fn component_sizes(graph: &RoadGraph) -> Vec<usize> {
    let mut seen = vec![false; graph.node_count()];
    let mut sizes = Vec::new();

    for node in graph.nodes() {
        if seen[node.id.0] {
            continue;
        }
        seen[node.id.0] = true;
        let mut queue = VecDeque::from([node.id]);
        let mut size = 0;
        while let Some(NodeId(current)) = queue.pop_front() {
            size += 1;
            for edge in graph.neighbors(NodeId(current)) {
                if !seen[edge.to.0] {
                    seen[edge.to.0] = true;
                    queue.push_back(edge.to);
                }
            }
        }
        sizes.push(size);
    }

    sizes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnected_streets_are_separate_components() {
        let graph = RoadGraph::from_polylines(vec![
            vec![Point::new(0.0, 0.0), Point::new(0.001, 0.0), Point::new(0.002, 0.0)],
            vec![Point::new(0.01, 0.01), Point::new(0.01, 0.011)],
        ]);
        let summary = summarize(&graph);

        assert_eq!(summary.nodes, 5);
        assert_eq!(summary.edges, 3);
        assert_eq!(summary.components, 2);
        assert_eq!(summary.largest_component, 3);
        assert!((summary.total_length_m - 333.0).abs() < 1.0);
        assert_eq!(
            summary.bounds,
            Some((Point::new(0.0, 0.0), Point::new(0.01, 0.011)))
        );
    }

    #[test]
    fn empty_graph_has_no_bounds() {
        let summary = summarize(&RoadGraph::default());
        assert_eq!(summary.components, 0);
        assert!(summary.bounds.is_none());
    }
}
