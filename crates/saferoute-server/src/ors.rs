//! OpenRouteService directions with polygon avoidance.
//!
//! Zones are sent as regular polygons in `options.avoid_polygons`; the
//! service then routes around them itself. Only used when an API key is
//! configured.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use saferoute_core::{
    circles_to_polygons, polygons_to_feature_collection, DangerZone, Point, Polygon, Route,
    RouteError,
};

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct OrsClient {
    client: Client,
    url: String,
    api_key: String,
    timeout: Duration,
}

impl OrsClient {
    pub fn new(client: Client, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
            timeout: Config::default().directions_timeout(),
        }
    }

    /// Client for the configured endpoint, or `None` without an API key.
    pub fn from_config(client: Client, config: &Config) -> Option<Self> {
        let key = config.ors_api_key.clone()?;
        Some(Self::new(client, config.ors_url.clone(), key).with_timeout(config.directions_timeout()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn fetch_route(
        &self,
        start: Point,
        end: Point,
        zones: &[DangerZone],
        sides: usize,
    ) -> Result<Route, RouteError> {
        let polygons = circles_to_polygons(zones, sides);
        let body = build_request_body(start, end, &polygons);

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", &self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|err| RouteError::ServiceUnavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(RouteError::ServiceUnavailable(format!(
                "ORS directions HTTP {}",
                response.status()
            )));
        }

        let payload: DirectionsResponse = response
            .json()
            .await
            .map_err(|err| RouteError::ServiceUnavailable(err.to_string()))?;
        route_from_response(payload)
    }

    /// Route around `zones`, absorbing failures as `None`.
    pub async fn route_avoiding(
        &self,
        start: Point,
        end: Point,
        zones: &[DangerZone],
        sides: usize,
    ) -> Option<Route> {
        match self.fetch_route(start, end, zones, sides).await {
            Ok(route) => Some(route),
            Err(err) => {
                tracing::warn!("ORS polygon-avoidance route failed: {}", err);
                None
            }
        }
    }
}

/// Request body for a two-point walking route avoiding `polygons`.
pub fn build_request_body(start: Point, end: Point, polygons: &[Polygon]) -> Value {
    let mut body = json!({
        "coordinates": [[start.lon, start.lat], [end.lon, end.lat]],
        "instructions": false,
        "preference": "shortest",
    });
    if !polygons.is_empty() {
        body["options"] = json!({
            "avoid_polygons": polygons_to_feature_collection(polygons),
        });
    }
    body
}

#[derive(Debug, Deserialize)]
pub struct DirectionsResponse {
    #[serde(default)]
    pub features: Vec<DirectionsFeature>,
}

#[derive(Debug, Deserialize)]
pub struct DirectionsFeature {
    pub geometry: DirectionsGeometry,
}

#[derive(Debug, Deserialize)]
pub struct DirectionsGeometry {
    pub coordinates: Vec<Vec<f64>>,
}

pub fn route_from_response(payload: DirectionsResponse) -> Result<Route, RouteError> {
    let feature = payload
        .features
        .into_iter()
        .next()
        .ok_or_else(|| RouteError::ServiceUnavailable("ORS returned no features".to_string()))?;
    // ORS may append elevation as a third coordinate.
    let points: Vec<Point> = feature
        .geometry
        .coordinates
        .iter()
        .filter_map(|coord| match coord.as_slice() {
            [lon, lat, ..] => Some(Point::new(*lat, *lon)),
            _ => None,
        })
        .collect();
    if points.is_empty() {
        return Err(RouteError::ServiceUnavailable(
            "ORS route geometry is empty".to_string(),
        ));
    }
    Ok(Route::new(points))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_carries_avoid_polygons_feature_collection() {
        let zones = vec![DangerZone::new(52.52, 13.40, 60.0)];
        let polygons = circles_to_polygons(&zones, 12);
        let body = build_request_body(
            Point::new(52.51, 13.39),
            Point::new(52.53, 13.41),
            &polygons,
        );

        assert_eq!(body["coordinates"][0][0], 13.39);
        assert_eq!(body["coordinates"][0][1], 52.51);
        assert_eq!(body["instructions"], false);
        assert_eq!(body["preference"], "shortest");
        let avoid = &body["options"]["avoid_polygons"];
        assert_eq!(avoid["type"], "FeatureCollection");
        assert_eq!(
            avoid["features"][0]["geometry"]["coordinates"][0]
                .as_array()
                .map(Vec::len),
            Some(13)
        );
    }

    #[test]
    fn body_without_zones_has_no_options() {
        let body = build_request_body(Point::new(0.0, 0.0), Point::new(0.01, 0.0), &[]);
        assert!(body.get("options").is_none());
    }

    #[test]
    fn geojson_response_is_read_as_lon_lat() {
        let payload: DirectionsResponse = serde_json::from_str(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"summary": {"distance": 210.4}},
                 "geometry": {"type": "LineString", "coordinates": [[13.39, 52.51, 34.0], [13.391, 52.512]]}}
            ]}"#,
        )
        .unwrap();
        let route = route_from_response(payload).unwrap();
        assert_eq!(route.len(), 2);
        assert_eq!(route.first(), Some(Point::new(52.51, 13.39)));
    }

    #[test]
    fn missing_key_disables_the_client() {
        assert!(OrsClient::from_config(Client::new(), &Config::default()).is_none());
        let config = Config {
            ors_api_key: Some("key".to_string()),
            ..Config::default()
        };
        assert!(OrsClient::from_config(Client::new(), &config).is_some());
    }
}
