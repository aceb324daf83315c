pub mod detour;
pub mod error;
pub mod graph;
pub mod local_detour;
pub mod models;
pub mod route_engine;
pub mod rules;
pub mod safety;
pub mod spatial;

pub use detour::{
    arc_detour, circles_to_polygons, polygons_to_feature_collection, tangential_pivots,
    zones_on_path, Polygon,
};
pub use error::RouteError;
pub use graph::{GraphEdge, GraphNode, NodeId, NodeKey, RoadGraph};
pub use local_detour::{local_safe_path, plan_local_detour};
pub use models::{DangerZone, Point, Route};
pub use route_engine::{find_node_path, find_path, nearest_node, GraphPath};
pub use rules::AvoidanceRules;
pub use safety::{is_path_safe, zone_containing, PathVerifier, Violation, MIN_SUBDIVISIONS};
pub use spatial::{distance_m, haversine_distance, LocalFrame};
