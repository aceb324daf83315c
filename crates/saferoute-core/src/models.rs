//! Core data models for safe routing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::spatial::{distance_m, haversine_distance};

/// A geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

impl Point {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    /// Point at fraction `t` along the straight line to `other`, in degree space.
    pub fn lerp(&self, other: Point, t: f64) -> Point {
        Point {
            lat: self.lat + (other.lat - self.lat) * t,
            lon: self.lon + (other.lon - self.lon) * t,
        }
    }
}

/// A reported hazard, treated as a hard exclusion circle.
///
/// Everything except the center and radius is display metadata owned by the
/// reporting subsystem; routing only reads the geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DangerZone {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub radius_m: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl DangerZone {
    pub fn new(lat: f64, lon: f64, radius_m: f64) -> Self {
        Self {
            id: None,
            lat,
            lon,
            radius_m,
            description: None,
            reported_at: None,
            photo_url: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn center(&self) -> Point {
        Point::new(self.lat, self.lon)
    }

    /// Check whether a point lies inside (or on the edge of) this zone.
    pub fn contains(&self, point: Point) -> bool {
        distance_m(point, self.center()) <= self.radius_m
    }

    /// Human-readable label for logs and error messages.
    pub fn label(&self) -> String {
        match self.id.as_deref() {
            Some(id) => id.to_string(),
            None => format!("({:.6}, {:.6})", self.lat, self.lon),
        }
    }

    /// Validate the zone geometry.
    /// Returns a list of validation errors, empty if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            errors.push(format!("zone {} has invalid latitude", self.label()));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            errors.push(format!("zone {} has invalid longitude", self.label()));
        }
        if !self.radius_m.is_finite() || self.radius_m < 0.0 {
            errors.push(format!(
                "zone {} radius must be a non-negative number of meters",
                self.label()
            ));
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

/// An ordered walking path from start to end, inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route(Vec<Point>);

impl Route {
    pub fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// The two-point straight line between start and end.
    pub fn direct(start: Point, end: Point) -> Self {
        Self(vec![start, end])
    }

    pub fn points(&self) -> &[Point] {
        &self.0
    }

    pub fn into_points(self) -> Vec<Point> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<Point> {
        self.0.first().copied()
    }

    pub fn last(&self) -> Option<Point> {
        self.0.last().copied()
    }

    /// Great-circle length of the route in meters.
    pub fn distance_m(&self) -> f64 {
        self.0
            .windows(2)
            .map(|pair| haversine_distance(pair[0].lat, pair[0].lon, pair[1].lat, pair[1].lon))
            .sum()
    }
}

impl From<Vec<Point>> for Route {
    fn from(points: Vec<Point>) -> Self {
        Self(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_contains_center_and_excludes_far_points() {
        let zone = DangerZone::new(40.0, -74.0, 50.0);
        assert!(zone.contains(zone.center()));
        assert!(!zone.contains(Point::new(40.001, -74.0)));
    }

    #[test]
    fn negative_radius_is_rejected() {
        let zone = DangerZone::new(40.0, -74.0, -1.0).with_id("broken");
        let errors = zone.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("broken"));
        assert!(DangerZone::new(40.0, -74.0, 0.0).is_valid());
    }

    #[test]
    fn zone_metadata_is_optional_on_the_wire() {
        let zone: DangerZone =
            serde_json::from_str(r#"{"lat": 1.0, "lon": 2.0, "radius_m": 30.0}"#).unwrap();
        assert_eq!(zone.radius_m, 30.0);
        assert!(zone.id.is_none());

        let json = serde_json::to_value(&zone).unwrap();
        assert!(json.get("description").is_none());
    }

    #[test]
    fn route_distance_sums_segments() {
        let route = Route::new(vec![
            Point::new(0.0, 0.0),
            Point::new(0.001, 0.0),
            Point::new(0.002, 0.0),
        ]);
        let expected = haversine_distance(0.0, 0.0, 0.002, 0.0);
        assert!((route.distance_m() - expected).abs() < 0.01);
        assert_eq!(route.first(), Some(Point::new(0.0, 0.0)));
        assert_eq!(route.last(), Some(Point::new(0.002, 0.0)));
    }
}
