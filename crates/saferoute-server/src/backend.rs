//! Seam between the online orchestrator and the routing services it queries.

use std::future::Future;

use saferoute_core::{Point, Route};

/// Directions and nearest-road-point queries.
///
/// Implementations absorb their own failures: an error, timeout or bad
/// status comes back as `None`, never as a panic.
pub trait RoutingBackend: Send + Sync {
    /// Nearest point on the road network to `point`.
    fn snap(&self, point: Point) -> impl Future<Output = Option<Point>> + Send;

    /// Walking route visiting `waypoints` in order (at least two).
    fn directions(&self, waypoints: &[Point]) -> impl Future<Output = Option<Route>> + Send;
}
