//! OSRM HTTP client (`/route` and `/nearest` services).

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use saferoute_core::{Point, Route, RouteError};

use crate::backend::RoutingBackend;
use crate::config::Config;

#[derive(Debug, Clone)]
pub struct OsrmClient {
    client: Client,
    base_url: String,
    profile: String,
    snap_timeout: Duration,
    directions_timeout: Duration,
}

impl OsrmClient {
    pub fn new(client: Client, base_url: impl Into<String>, profile: impl Into<String>) -> Self {
        let defaults = Config::default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            profile: profile.into(),
            snap_timeout: defaults.snap_timeout(),
            directions_timeout: defaults.directions_timeout(),
        }
    }

    pub fn from_config(client: Client, config: &Config) -> Self {
        Self::new(client, config.osrm_url.clone(), config.osrm_profile.clone())
            .with_timeouts(config.snap_timeout(), config.directions_timeout())
    }

    pub fn with_timeouts(mut self, snap: Duration, directions: Duration) -> Self {
        self.snap_timeout = snap;
        self.directions_timeout = directions;
        self
    }

    pub fn route_url(&self, waypoints: &[Point]) -> String {
        let coords = waypoints
            .iter()
            .map(|p| format!("{:.6},{:.6}", p.lon, p.lat))
            .collect::<Vec<_>>()
            .join(";");
        format!(
            "{}/route/v1/{}/{}?overview=full&geometries=geojson",
            self.base_url, self.profile, coords
        )
    }

    pub fn nearest_url(&self, point: Point) -> String {
        format!(
            "{}/nearest/v1/{}/{:.6},{:.6}?number=1",
            self.base_url, self.profile, point.lon, point.lat
        )
    }

    /// Request a route through `waypoints`, reporting why it failed.
    pub async fn fetch_route(&self, waypoints: &[Point]) -> Result<Route, RouteError> {
        if waypoints.len() < 2 {
            return Err(RouteError::InputInvalid(
                "directions need at least two waypoints".to_string(),
            ));
        }

        let response = self
            .client
            .get(self.route_url(waypoints))
            .timeout(self.directions_timeout)
            .send()
            .await
            .map_err(|err| RouteError::ServiceUnavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(RouteError::ServiceUnavailable(format!(
                "OSRM route HTTP {}",
                response.status()
            )));
        }

        let payload: RouteResponse = response
            .json()
            .await
            .map_err(|err| RouteError::ServiceUnavailable(err.to_string()))?;
        route_from_response(payload)
    }

    /// Snap a point to the road network, reporting why it failed.
    pub async fn fetch_nearest(&self, point: Point) -> Result<Point, RouteError> {
        let response = self
            .client
            .get(self.nearest_url(point))
            .timeout(self.snap_timeout)
            .send()
            .await
            .map_err(|err| RouteError::ServiceUnavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(RouteError::ServiceUnavailable(format!(
                "OSRM nearest HTTP {}",
                response.status()
            )));
        }

        let payload: NearestResponse = response
            .json()
            .await
            .map_err(|err| RouteError::ServiceUnavailable(err.to_string()))?;
        nearest_from_response(payload)
    }
}

impl RoutingBackend for OsrmClient {
    async fn snap(&self, point: Point) -> Option<Point> {
        match self.fetch_nearest(point).await {
            Ok(snapped) => Some(snapped),
            Err(err) => {
                tracing::warn!("OSRM nearest failed: {}", err);
                None
            }
        }
    }

    async fn directions(&self, waypoints: &[Point]) -> Option<Route> {
        match self.fetch_route(waypoints).await {
            Ok(route) => Some(route),
            Err(err) => {
                tracing::warn!("OSRM route failed ({} waypoints): {}", waypoints.len(), err);
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RouteResponse {
    pub code: String,
    #[serde(default)]
    pub routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
pub struct OsrmRoute {
    pub geometry: LineGeometry,
}

#[derive(Debug, Deserialize)]
pub struct LineGeometry {
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
pub struct NearestResponse {
    pub code: String,
    #[serde(default)]
    pub waypoints: Vec<NearestWaypoint>,
}

#[derive(Debug, Deserialize)]
pub struct NearestWaypoint {
    pub location: [f64; 2],
}

/// First route's geometry, converted from `[lon, lat]`.
pub fn route_from_response(payload: RouteResponse) -> Result<Route, RouteError> {
    if payload.code != "Ok" {
        return Err(RouteError::ServiceUnavailable(format!(
            "OSRM route code {}",
            payload.code
        )));
    }
    let route = payload
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| RouteError::ServiceUnavailable("OSRM returned no routes".to_string()))?;
    let points: Vec<Point> = route
        .geometry
        .coordinates
        .iter()
        .map(|[lon, lat]| Point::new(*lat, *lon))
        .collect();
    if points.is_empty() {
        return Err(RouteError::ServiceUnavailable(
            "OSRM route geometry is empty".to_string(),
        ));
    }
    Ok(Route::new(points))
}

pub fn nearest_from_response(payload: NearestResponse) -> Result<Point, RouteError> {
    if payload.code != "Ok" {
        return Err(RouteError::ServiceUnavailable(format!(
            "OSRM nearest code {}",
            payload.code
        )));
    }
    payload
        .waypoints
        .first()
        .map(|waypoint| Point::new(waypoint.location[1], waypoint.location[0]))
        .ok_or_else(|| RouteError::ServiceUnavailable("OSRM returned no waypoints".to_string()))
}
