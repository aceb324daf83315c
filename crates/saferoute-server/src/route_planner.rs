//! Safe-route facade: validates a request, then tries each routing strategy
//! in priority order and returns the first route that verifies safe.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use saferoute_core::{
    distance_m, find_path, plan_local_detour, zone_containing, AvoidanceRules, DangerZone,
    PathVerifier, Point, RoadGraph, Route, RouteError,
};

use crate::backend::RoutingBackend;
use crate::config::Config;
use crate::orchestrator::OnlineRouter;
use crate::ors::OrsClient;

/// Graph endpoints closer than this to the requested point are not stitched.
const STITCH_THRESHOLD_M: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// A* over the preloaded road graph.
    Offline,
    /// Directions service that takes the zones as avoid-polygons.
    PolygonAvoidance,
    /// Fast path then recursive leg splitting against the directions service.
    Online,
    /// Network-free iterative detour insertion.
    LocalDetour,
}

impl Strategy {
    pub const DEFAULT_ORDER: [Strategy; 4] = [
        Strategy::Offline,
        Strategy::PolygonAvoidance,
        Strategy::Online,
        Strategy::LocalDetour,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Offline => "offline",
            Strategy::PolygonAvoidance => "polygon_avoidance",
            Strategy::Online => "online",
            Strategy::LocalDetour => "local_detour",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verified route and the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedRoute {
    pub route: Route,
    pub strategy: Strategy,
    pub distance_m: f64,
}

pub struct SafeRoutePlanner<B> {
    graph: Option<Arc<RoadGraph>>,
    online: OnlineRouter<B>,
    avoidance: Option<OrsClient>,
    rules: AvoidanceRules,
    verifier: PathVerifier,
    strategies: Vec<Strategy>,
}

impl<B: RoutingBackend> SafeRoutePlanner<B> {
    pub fn new(online: OnlineRouter<B>) -> Self {
        let rules = online.rules().clone();
        Self {
            graph: None,
            online,
            avoidance: None,
            verifier: PathVerifier::new(rules.effective_subdivisions()),
            rules,
            strategies: Strategy::DEFAULT_ORDER.to_vec(),
        }
    }

    pub fn from_config(backend: B, config: &Config) -> Self {
        let planner = Self::new(OnlineRouter::from_config(backend, config));
        if config.local_detour_enabled {
            planner
        } else {
            let strategies = Strategy::DEFAULT_ORDER
                .into_iter()
                .filter(|strategy| *strategy != Strategy::LocalDetour)
                .collect();
            planner.with_strategies(strategies)
        }
    }

    pub fn with_graph(mut self, graph: Arc<RoadGraph>) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn with_polygon_avoidance(mut self, client: OrsClient) -> Self {
        self.avoidance = Some(client);
        self
    }

    pub fn with_strategies(mut self, strategies: Vec<Strategy>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn online(&self) -> &OnlineRouter<B> {
        &self.online
    }

    pub fn rules(&self) -> &AvoidanceRules {
        &self.rules
    }

    /// Configured strategies whose collaborator is present, in order.
    pub fn active_strategies(&self) -> Vec<Strategy> {
        self.strategies
            .iter()
            .copied()
            .filter(|strategy| match strategy {
                Strategy::Offline => self.graph.is_some(),
                Strategy::PolygonAvoidance => self.avoidance.is_some(),
                Strategy::Online | Strategy::LocalDetour => true,
            })
            .collect()
    }

    /// Plan a route that stays outside every zone.
    ///
    /// Returns `InputInvalid` before any routing if an endpoint can never be
    /// safe, and `NoPathFound` once every strategy is exhausted. An unsafe
    /// route is never returned.
    pub async fn plan(
        &self,
        start: Point,
        end: Point,
        zones: &[DangerZone],
    ) -> Result<PlannedRoute, RouteError> {
        validate_request(start, end, zones)?;

        for strategy in self.active_strategies() {
            let candidate = match strategy {
                Strategy::Offline => self.offline_route(start, end, zones),
                Strategy::PolygonAvoidance => match &self.avoidance {
                    Some(client) => {
                        client
                            .route_avoiding(start, end, zones, self.rules.polygon_sides)
                            .await
                    }
                    None => None,
                },
                Strategy::Online => self.online.route(start, end, zones).await,
                Strategy::LocalDetour => plan_local_detour(start, end, zones, &self.rules),
            };

            let Some(route) = candidate else {
                tracing::debug!("Strategy {} found no route", strategy);
                continue;
            };
            if !self.verifier.is_safe(route.points(), zones) {
                tracing::warn!("Strategy {} returned a route crossing a zone; discarded", strategy);
                continue;
            }

            tracing::debug!("Strategy {} produced a safe route ({} points)", strategy, route.len());
            return Ok(PlannedRoute {
                distance_m: route.distance_m(),
                route,
                strategy,
            });
        }

        Err(RouteError::NoPathFound)
    }

    /// Graph path with the exact endpoints stitched on.
    fn offline_route(&self, start: Point, end: Point, zones: &[DangerZone]) -> Option<Route> {
        let graph = self.graph.as_ref()?;
        let path = find_path(graph, start, end, zones)?;
        Some(stitch_endpoints(path, start, end))
    }
}

fn stitch_endpoints(path: Route, start: Point, end: Point) -> Route {
    let mut points = path.into_points();
    let far = |node: Option<&Point>, target: Point| {
        node.map_or(true, |node| distance_m(*node, target) > STITCH_THRESHOLD_M)
    };
    if far(points.first(), start) {
        points.insert(0, start);
    }
    if far(points.last(), end) {
        points.push(end);
    }
    Route::new(points)
}

/// Reject requests that no strategy could ever satisfy.
pub fn validate_request(start: Point, end: Point, zones: &[DangerZone]) -> Result<(), RouteError> {
    for (name, point) in [("start", start), ("end", end)] {
        if !point.is_finite()
            || !(-90.0..=90.0).contains(&point.lat)
            || !(-180.0..=180.0).contains(&point.lon)
        {
            return Err(RouteError::InputInvalid(format!(
                "{name} is not a valid coordinate"
            )));
        }
    }

    let errors: Vec<String> = zones.iter().flat_map(DangerZone::validate).collect();
    if !errors.is_empty() {
        return Err(RouteError::InputInvalid(errors.join("; ")));
    }

    for (name, point) in [("start", start), ("end", end)] {
        if let Some(index) = zone_containing(zones, point) {
            return Err(RouteError::InputInvalid(format!(
                "{name} lies inside danger zone {}",
                zones[index].label()
            )));
        }
    }
    Ok(())
}

// === Request/Response types ===

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafeRouteRequest {
    pub start: Point,
    pub end: Point,
    #[serde(default)]
    pub zones: Vec<DangerZone>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafeRouteResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
    pub points: Vec<Point>,
    pub errors: Vec<String>,
}

impl SafeRouteResponse {
    pub fn success(planned: PlannedRoute) -> Self {
        Self {
            ok: true,
            strategy: Some(planned.strategy),
            distance_m: Some(planned.distance_m),
            points: planned.route.into_points(),
            errors: Vec::new(),
        }
    }

    pub fn failure(err: &RouteError) -> Self {
        Self {
            ok: false,
            strategy: None,
            distance_m: None,
            points: Vec::new(),
            errors: vec![err.to_string()],
        }
    }
}
