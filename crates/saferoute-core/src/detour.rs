//! Detour geometry around circular zones.
//!
//! A circle cannot, in general, be avoided with a single waypoint on the
//! straight line. Tangential pivots give the smallest perturbation that
//! routes around one zone, and arcs give a smoother multi-point alternative.
//!
//! Polygons adapt circles for services that only accept polygon avoidance.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_3, PI};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::{DangerZone, Point};
use crate::spatial::{cross_track_sign, segment_intersects_circle, LocalFrame};

/// Below this separation (meters) the zone center is treated as lying on
/// the start-end midpoint.
const DEGENERATE_M: f64 = 1e-6;

/// Zones whose radius-plus-buffer band touches the straight line `start`-`end`.
pub fn zones_on_path<'a>(
    start: Point,
    end: Point,
    zones: &'a [DangerZone],
    buffer_m: f64,
) -> Vec<&'a DangerZone> {
    zones
        .iter()
        .filter(|zone| segment_intersects_circle(start, end, zone.center(), zone.radius_m, buffer_m))
        .collect()
}

/// Two candidate waypoints `radius + buffer` from the zone center, at ±90°
/// from the direction center -> midpoint of `start`-`end`.
///
/// When the midpoint coincides with the center, the start -> end heading is
/// used as the base direction so the pivots flank the line on either side.
pub fn tangential_pivots(
    zone: &DangerZone,
    start: Point,
    end: Point,
    buffer_m: f64,
) -> [Point; 2] {
    let frame = LocalFrame::new(zone.center());
    let base_angle = base_angle(&frame, start, end);
    let offset = zone.radius_m + buffer_m;

    [base_angle + FRAC_PI_2, base_angle - FRAC_PI_2]
        .map(|angle| frame.to_point(offset * angle.cos(), offset * angle.sin()))
}

/// Arc of `steps` points on a circle of `radius + buffer` around the zone,
/// sweeping 60° from the midpoint direction.
///
/// The sweep turns toward the side of `start`-`end` the zone lies on, so the
/// arc bends away from backtracking.
pub fn arc_detour(
    start: Point,
    end: Point,
    zone: &DangerZone,
    steps: usize,
    buffer_m: f64,
) -> Vec<Point> {
    if steps == 0 {
        return Vec::new();
    }

    let frame = LocalFrame::new(zone.center());
    let base_angle = base_angle(&frame, start, end);
    let side = if cross_track_sign(start, end, zone.center()) > 0.0 {
        1.0
    } else {
        -1.0
    };
    let radius = zone.radius_m + buffer_m;
    let delta = if steps > 1 {
        FRAC_PI_3 / (steps - 1) as f64
    } else {
        0.0
    };

    (0..steps)
        .map(|i| {
            let angle = base_angle + side * delta * i as f64;
            frame.to_point(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

fn base_angle(frame: &LocalFrame, start: Point, end: Point) -> f64 {
    let (sx, sy) = frame.to_xy(start);
    let (ex, ey) = frame.to_xy(end);
    let (mx, my) = ((sx + ex) / 2.0, (sy + ey) / 2.0);
    if mx.hypot(my) > DEGENERATE_M {
        return my.atan2(mx);
    }
    let (dx, dy) = (ex - sx, ey - sy);
    if dx.hypot(dy) > DEGENERATE_M {
        dy.atan2(dx)
    } else {
        // No usable direction at all: pivots go east/west of north.
        PI / 2.0
    }
}

/// GeoJSON polygon geometry with `[lon, lat]` rings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<Vec<[f64; 2]>>,
}

impl Polygon {
    /// The outer ring, closed (first vertex repeated at the end).
    pub fn ring(&self) -> &[[f64; 2]] {
        self.coordinates.first().map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Approximate each zone with a regular `sides`-gon. Fewer than three sides
/// is raised to three.
pub fn circles_to_polygons(zones: &[DangerZone], sides: usize) -> Vec<Polygon> {
    let sides = sides.max(3);
    zones
        .iter()
        .map(|zone| {
            let frame = LocalFrame::new(zone.center());
            let mut ring: Vec<[f64; 2]> = (0..sides)
                .map(|i| {
                    let angle = i as f64 / sides as f64 * 2.0 * PI;
                    let vertex = frame.to_point(
                        zone.radius_m * angle.cos(),
                        zone.radius_m * angle.sin(),
                    );
                    [vertex.lon, vertex.lat]
                })
                .collect();
            if let Some(first) = ring.first().copied() {
                ring.push(first);
            }
            Polygon {
                kind: "Polygon".to_string(),
                coordinates: vec![ring],
            }
        })
        .collect()
}

/// Wrap polygons in a GeoJSON FeatureCollection.
pub fn polygons_to_feature_collection(polygons: &[Polygon]) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": polygons
            .iter()
            .map(|polygon| json!({
                "type": "Feature",
                "geometry": polygon,
                "properties": {},
            }))
            .collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::distance_m;

    const EPS_M: f64 = 0.5;

    #[test]
    fn pivots_sit_outside_radius_plus_buffer() {
        let cases = [
            (
                DangerZone::new(40.7128, -74.006, 80.0),
                Point::new(40.708, -74.01),
                Point::new(40.718, -74.0),
            ),
            (
                DangerZone::new(-33.87, 151.21, 150.0),
                Point::new(-33.875, 151.2),
                Point::new(-33.86, 151.22),
            ),
            (
                DangerZone::new(0.005, 0.0, 100.0),
                Point::new(0.0, 0.0),
                Point::new(0.01, 0.0),
            ),
        ];
        for buffer in [0.0, 30.0, 120.0] {
            for (zone, start, end) in &cases {
                for pivot in tangential_pivots(zone, *start, *end, buffer) {
                    let dist = distance_m(pivot, zone.center());
                    assert!(
                        dist >= zone.radius_m + buffer - EPS_M,
                        "pivot {pivot:?} only {dist} m from center"
                    );
                }
            }
        }
    }

    #[test]
    fn pivots_are_perpendicular_to_midpoint_direction() {
        // Zone due west of the midpoint of a north-bound line: the pivots
        // land north and south of the center.
        let zone = DangerZone::new(0.005, -0.0005, 50.0);
        let [a, b] = tangential_pivots(&zone, Point::new(0.0, 0.0), Point::new(0.01, 0.0), 30.0);
        assert!((a.lon - zone.lon).abs() < 1e-7);
        assert!((b.lon - zone.lon).abs() < 1e-7);
        assert!((a.lat - b.lat).abs() > 0.001);
    }

    #[test]
    fn centered_zone_pivots_flank_the_line() {
        let zone = DangerZone::new(0.005, 0.0, 100.0);
        let [a, b] = tangential_pivots(&zone, Point::new(0.0, 0.0), Point::new(0.01, 0.0), 30.0);
        assert!((a.lat - zone.lat).abs() < 1e-7);
        assert!((b.lat - zone.lat).abs() < 1e-7);
        assert!(a.lon * b.lon < 0.0, "pivots on opposite sides: {a:?} {b:?}");
    }

    #[test]
    fn arc_bends_to_the_zone_side() {
        let start = Point::new(0.0, 0.0);
        let end = Point::new(0.01, 0.0);
        let west_zone = DangerZone::new(0.005, -0.0005, 50.0);
        let arc = arc_detour(start, end, &west_zone, 5, 40.0);
        assert_eq!(arc.len(), 5);
        for point in &arc {
            let dist = distance_m(*point, west_zone.center());
            assert!((dist - 90.0).abs() < EPS_M);
        }
        // Starts on the midpoint side (east of the zone) and sweeps
        // counter-clockwise, i.e. northward.
        assert!(arc[0].lon > west_zone.lon);
        assert!(arc[4].lat > arc[0].lat);

        let east_zone = DangerZone::new(0.005, 0.0005, 50.0);
        let arc = arc_detour(start, end, &east_zone, 5, 40.0);
        assert!(arc[0].lon < east_zone.lon);
        assert!(arc[4].lat > arc[0].lat);
    }

    #[test]
    fn arc_with_no_steps_is_empty() {
        let zone = DangerZone::new(0.005, 0.0, 50.0);
        assert!(arc_detour(Point::new(0.0, 0.0), Point::new(0.01, 0.0), &zone, 0, 40.0).is_empty());
        assert_eq!(
            arc_detour(Point::new(0.0, 0.0), Point::new(0.01, 0.0), &zone, 1, 40.0).len(),
            1
        );
    }

    #[test]
    fn polygons_are_closed_rings_on_the_circle() {
        let zones = vec![DangerZone::new(51.5, -0.12, 75.0), DangerZone::new(51.51, -0.1, 20.0)];
        let polygons = circles_to_polygons(&zones, 12);
        assert_eq!(polygons.len(), 2);

        for (polygon, zone) in polygons.iter().zip(&zones) {
            assert_eq!(polygon.kind, "Polygon");
            let ring = polygon.ring();
            assert_eq!(ring.len(), 13);
            assert_eq!(ring.first(), ring.last());
            for [lon, lat] in ring {
                let dist = distance_m(Point::new(*lat, *lon), zone.center());
                assert!((dist - zone.radius_m).abs() < EPS_M);
            }
        }
    }

    #[test]
    fn feature_collection_wraps_each_polygon() {
        let polygons = circles_to_polygons(&[DangerZone::new(0.0, 0.0, 10.0)], 3);
        let fc = polygons_to_feature_collection(&polygons);
        assert_eq!(fc["type"], "FeatureCollection");
        assert_eq!(fc["features"][0]["geometry"]["type"], "Polygon");
        assert_eq!(
            fc["features"][0]["geometry"]["coordinates"][0]
                .as_array()
                .map(Vec::len),
            Some(4)
        );
    }

    #[test]
    fn only_zones_near_the_line_are_on_path() {
        let start = Point::new(0.0, 0.0);
        let end = Point::new(0.01, 0.0);
        let zones = vec![
            DangerZone::new(0.005, 0.0, 50.0),    // on the line
            DangerZone::new(0.005, 0.0012, 100.0), // ~133 m away, inside 100 + 40
            DangerZone::new(0.005, 0.003, 100.0),  // ~333 m away
        ];
        let hits = zones_on_path(start, end, &zones, 40.0);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[1].lon, 0.0012);
    }
}
