//! Road graph built from street centerline polylines.
//!
//! Vertices are deduplicated by rounding coordinates to six decimal digits
//! (~0.1 m), so polylines that share an intersection share a node. Edges are
//! stored in both directions with the same projected length.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::RouteError;
use crate::models::Point;
use crate::spatial::distance_m;

const KEY_SCALE: f64 = 1e6;

/// Index of a node within its [`RoadGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Stable deduplication key: coordinates rounded to 1e-6 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey {
    lat_e6: i64,
    lon_e6: i64,
}

impl NodeKey {
    pub fn from_point(point: Point) -> Self {
        Self {
            lat_e6: (point.lat * KEY_SCALE).round() as i64,
            lon_e6: (point.lon * KEY_SCALE).round() as i64,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GraphNode {
    pub id: NodeId,
    pub key: NodeKey,
    /// Exact coordinate of the first polyline vertex that produced this node.
    pub point: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphEdge {
    pub to: NodeId,
    pub distance_m: f64,
}

/// Weighted undirected road graph. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct RoadGraph {
    nodes: Vec<GraphNode>,
    index: HashMap<NodeKey, NodeId>,
    adjacency: Vec<Vec<GraphEdge>>,
}

impl RoadGraph {
    /// Build a graph from street polylines.
    ///
    /// Polylines with fewer than two usable vertices contribute nothing.
    /// Consecutive vertices that collapse onto the same key are not linked.
    pub fn from_polylines<I, L>(polylines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[Point]>,
    {
        let mut graph = RoadGraph::default();
        for polyline in polylines {
            graph.add_polyline(polyline.as_ref());
        }
        graph
    }

    fn add_polyline(&mut self, coords: &[Point]) {
        if coords.len() < 2 || coords.iter().any(|point| !point.is_finite()) {
            return;
        }

        let mut previous: Option<(NodeId, Point)> = None;
        for point in coords {
            let id = self.intern(*point);
            if let Some((prev_id, prev_point)) = previous {
                if prev_id != id {
                    let dist = distance_m(prev_point, *point);
                    self.adjacency[prev_id.0].push(GraphEdge {
                        to: id,
                        distance_m: dist,
                    });
                    self.adjacency[id.0].push(GraphEdge {
                        to: prev_id,
                        distance_m: dist,
                    });
                }
            }
            previous = Some((id, *point));
        }
    }

    fn intern(&mut self, point: Point) -> NodeId {
        let key = NodeKey::from_point(point);
        if let Some(id) = self.index.get(&key) {
            return *id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(GraphNode { id, key, point });
        self.adjacency.push(Vec::new());
        self.index.insert(key, id);
        id
    }

    /// Parse a GeoJSON FeatureCollection of `LineString` / `MultiLineString`
    /// features with `[lon, lat]` coordinates.
    pub fn from_geojson_str(raw: &str) -> Result<Self, RouteError> {
        let collection: FeatureCollection = serde_json::from_str(raw)
            .map_err(|err| RouteError::AssetUnavailable(format!("invalid GeoJSON: {err}")))?;

        let mut polylines: Vec<Vec<Point>> = Vec::new();
        for feature in collection.features {
            let Some(geometry) = feature.geometry else {
                continue;
            };
            match geometry.kind.as_str() {
                "LineString" => {
                    if let Ok(coords) =
                        serde_json::from_value::<Vec<Vec<f64>>>(geometry.coordinates)
                    {
                        polylines.push(to_points(&coords));
                    }
                }
                "MultiLineString" => {
                    if let Ok(lines) =
                        serde_json::from_value::<Vec<Vec<Vec<f64>>>>(geometry.coordinates)
                    {
                        polylines.extend(lines.iter().map(|coords| to_points(coords)));
                    }
                }
                _ => {}
            }
        }

        let graph = RoadGraph::from_polylines(&polylines);
        if graph.edge_count() == 0 {
            return Err(RouteError::AssetUnavailable(
                "asset contains no usable LineString features".to_string(),
            ));
        }
        tracing::debug!(
            "Built road graph: {} nodes, {} edges from {} polylines",
            graph.node_count(),
            graph.edge_count(),
            polylines.len()
        );
        Ok(graph)
    }

    /// Load a GeoJSON road asset from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RouteError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            RouteError::AssetUnavailable(format!("{}: {}", path.display(), err))
        })?;
        Self::from_geojson_str(&raw)
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(id.0)
    }

    pub fn node_by_key(&self, key: NodeKey) -> Option<NodeId> {
        self.index.get(&key).copied()
    }

    pub fn neighbors(&self, id: NodeId) -> &[GraphEdge] {
        self.adjacency.get(id.0).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of undirected edges (each stored twice internally).
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn to_points(coords: &[Vec<f64>]) -> Vec<Point> {
    coords
        .iter()
        .filter_map(|pair| match pair.as_slice() {
            [lon, lat, ..] => Some(Point::new(*lat, *lon)),
            _ => None,
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cross_streets() -> Vec<Vec<Point>> {
        vec![
            // East-west street through the shared intersection at (0.001, 0.001).
            vec![
                Point::new(0.001, 0.0),
                Point::new(0.001, 0.001),
                Point::new(0.001, 0.002),
            ],
            // North-south street; its middle vertex differs by <1e-7 degrees.
            vec![
                Point::new(0.0, 0.001),
                Point::new(0.00100004, 0.00100004),
                Point::new(0.002, 0.001),
            ],
        ]
    }

    #[test]
    fn shared_intersection_is_deduplicated() {
        let graph = RoadGraph::from_polylines(cross_streets());
        assert_eq!(graph.node_count(), 5);
        assert_eq!(graph.edge_count(), 4);

        let hub = graph
            .node_by_key(NodeKey::from_point(Point::new(0.001, 0.001)))
            .expect("intersection node");
        assert_eq!(graph.neighbors(hub).len(), 4);
        // The first polyline to reach the key fixes the stored coordinate.
        assert_eq!(graph.node(hub).unwrap().point, Point::new(0.001, 0.001));
    }

    #[test]
    fn every_edge_has_a_mirror_with_equal_weight() {
        let graph = RoadGraph::from_polylines(cross_streets());
        for node in graph.nodes() {
            for edge in graph.neighbors(node.id) {
                let mirrored = graph
                    .neighbors(edge.to)
                    .iter()
                    .any(|back| back.to == node.id && back.distance_m == edge.distance_m);
                assert!(mirrored, "edge {:?} -> {:?} has no mirror", node.id, edge.to);
            }
        }
    }

    #[test]
    fn short_and_degenerate_polylines_are_ignored() {
        let graph = RoadGraph::from_polylines(vec![
            vec![Point::new(1.0, 1.0)],
            vec![Point::new(1.0, 1.0), Point::new(1.00000001, 1.0)],
            vec![Point::new(f64::NAN, 1.0), Point::new(1.0, 2.0)],
        ]);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn geojson_linestrings_are_read_as_lon_lat() {
        let raw = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"highway": "footway"},
                 "geometry": {"type": "LineString", "coordinates": [[2.0, 1.0], [2.001, 1.0]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "Point", "coordinates": [5.0, 5.0]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "MultiLineString", "coordinates": [[[2.001, 1.0], [2.001, 1.001]]]}}
            ]
        }"#;
        let graph = RoadGraph::from_geojson_str(raw).expect("valid asset");
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.nodes()[0].point, Point::new(1.0, 2.0));
    }

    #[test]
    fn malformed_or_empty_asset_is_unavailable() {
        assert!(matches!(
            RoadGraph::from_geojson_str("not json"),
            Err(RouteError::AssetUnavailable(_))
        ));
        assert!(matches!(
            RoadGraph::from_geojson_str(r#"{"type": "FeatureCollection", "features": []}"#),
            Err(RouteError::AssetUnavailable(_))
        ));
        assert!(matches!(
            RoadGraph::load("/nonexistent/roads.geojson"),
            Err(RouteError::AssetUnavailable(_))
        ));
    }
}
