//! Spatial math for zone avoidance and distance calculations.
//!
//! Distances use an equirectangular projection: latitude degrees scale by a
//! fixed factor and longitude degrees by that factor times the cosine of the
//! mean latitude. Over city-scale spans (under ~5 km) this stays within 1% of
//! the great-circle distance.

use crate::models::Point;

/// Meters per degree of latitude used by the local projection.
pub const METERS_PER_DEG: f64 = 111_000.0;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of longitude at a given latitude.
pub fn meters_per_deg_lon(lat_deg: f64) -> f64 {
    METERS_PER_DEG * lat_deg.to_radians().cos()
}

/// Projected distance between two points in meters.
pub fn distance_m(a: Point, b: Point) -> f64 {
    let mean_lat = (a.lat + b.lat) / 2.0;
    let dy = (a.lat - b.lat) * METERS_PER_DEG;
    let dx = (a.lon - b.lon) * meters_per_deg_lon(mean_lat);
    dx.hypot(dy)
}

/// Calculate distance between two points in meters using Haversine formula.
///
/// Used where a reported length should match what a map shows; routing
/// decisions use [`distance_m`].
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// A flat east/north frame in meters anchored at `origin`.
///
/// Detour construction happens in this frame so that offsets measured in
/// meters come back out as the same distances under [`distance_m`].
#[derive(Debug, Clone, Copy)]
pub struct LocalFrame {
    origin: Point,
    meters_per_deg_lon: f64,
}

impl LocalFrame {
    pub fn new(origin: Point) -> Self {
        Self {
            origin,
            meters_per_deg_lon: meters_per_deg_lon(origin.lat).max(1e-9),
        }
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Project a point to (east_m, north_m).
    pub fn to_xy(&self, point: Point) -> (f64, f64) {
        (
            (point.lon - self.origin.lon) * self.meters_per_deg_lon,
            (point.lat - self.origin.lat) * METERS_PER_DEG,
        )
    }

    /// Inverse of [`LocalFrame::to_xy`].
    pub fn to_point(&self, east_m: f64, north_m: f64) -> Point {
        Point::new(
            self.origin.lat + north_m / METERS_PER_DEG,
            self.origin.lon + east_m / self.meters_per_deg_lon,
        )
    }
}

/// Closest point on segment `a`-`b` to `point`, with the clamped projection
/// parameter `t` in `[0, 1]`.
pub fn closest_point_on_segment(point: Point, a: Point, b: Point) -> (Point, f64) {
    let frame = LocalFrame::new(Point::new((a.lat + b.lat) / 2.0, a.lon));
    let (ax, ay) = frame.to_xy(a);
    let (bx, by) = frame.to_xy(b);
    let (px, py) = frame.to_xy(point);

    let sx = bx - ax;
    let sy = by - ay;
    let seg_len_sq = sx * sx + sy * sy;
    if seg_len_sq < 1e-12 {
        // Segment is essentially a point
        return (a, 0.0);
    }

    // t = ((P-A) · (B-A)) / |B-A|²
    let t = (((px - ax) * sx + (py - ay) * sy) / seg_len_sq).clamp(0.0, 1.0);
    (frame.to_point(ax + t * sx, ay + t * sy), t)
}

/// Minimum distance from a point to a line segment, in meters.
pub fn distance_to_segment_m(point: Point, seg_start: Point, seg_end: Point) -> f64 {
    let (closest, _) = closest_point_on_segment(point, seg_start, seg_end);
    distance_m(point, closest)
}

/// Does segment `a`-`b` pass within `radius_m + buffer_m` of `center`?
pub fn segment_intersects_circle(
    a: Point,
    b: Point,
    center: Point,
    radius_m: f64,
    buffer_m: f64,
) -> bool {
    distance_to_segment_m(center, a, b) < radius_m + buffer_m
}

/// 2D cross product of `a`->`b` and `a`->`c` in the local frame of `a`.
///
/// Positive when `c` lies to the left of the directed line `a`->`b`.
pub fn cross_track_sign(a: Point, b: Point, c: Point) -> f64 {
    let frame = LocalFrame::new(a);
    let (bx, by) = frame.to_xy(b);
    let (cx, cy) = frame.to_xy(c);
    bx * cy - by * cx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_known_distance() {
        // ~111km between these points (1 degree latitude)
        let dist = haversine_distance(0.0, 0.0, 1.0, 0.0);
        assert!((dist - 111_194.0).abs() < 100.0);
    }

    #[test]
    fn projected_distance_matches_great_circle_at_city_scale() {
        let cases = [
            (Point::new(40.7128, -74.0060), Point::new(40.7306, -73.9866)),
            (Point::new(-33.8688, 151.2093), Point::new(-33.8568, 151.2153)),
            (Point::new(59.3293, 18.0686), Point::new(59.3326, 18.0649)),
        ];
        for (a, b) in cases {
            let projected = distance_m(a, b);
            let exact = haversine_distance(a.lat, a.lon, b.lat, b.lon);
            let error = (projected - exact).abs() / exact;
            assert!(error < 0.01, "{a:?} -> {b:?}: {projected} vs {exact}");
        }
    }

    #[test]
    fn distance_to_segment_clamps_to_endpoints() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(0.01, 0.0);

        // Beyond the end of the segment, the closest point is `b`.
        let past_end = Point::new(0.011, 0.0);
        let dist = distance_to_segment_m(past_end, a, b);
        assert!((dist - 111.0).abs() < 0.5, "got {dist}");

        // Abeam the middle, the distance is purely lateral.
        let abeam = Point::new(0.005, 0.001);
        let dist = distance_to_segment_m(abeam, a, b);
        assert!((dist - 111.0).abs() < 0.5, "got {dist}");
    }

    #[test]
    fn degenerate_segment_measures_to_its_point() {
        let a = Point::new(10.0, 10.0);
        let p = Point::new(10.001, 10.0);
        let dist = distance_to_segment_m(p, a, a);
        assert!((dist - distance_m(p, a)).abs() < 1e-9);
    }

    #[test]
    fn segment_circle_intersection_respects_buffer() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(0.01, 0.0);
        // Center ~111 m east of the segment midpoint.
        let center = Point::new(0.005, 0.001);
        assert!(!segment_intersects_circle(a, b, center, 100.0, 0.0));
        assert!(segment_intersects_circle(a, b, center, 100.0, 20.0));
    }

    #[test]
    fn local_frame_round_trips() {
        let frame = LocalFrame::new(Point::new(48.8566, 2.3522));
        let p = frame.to_point(120.0, -45.0);
        let (x, y) = frame.to_xy(p);
        assert!((x - 120.0).abs() < 1e-6);
        assert!((y + 45.0).abs() < 1e-6);
    }

    #[test]
    fn cross_track_sign_identifies_side() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(0.01, 0.0); // heading north
        assert!(cross_track_sign(a, b, Point::new(0.005, -0.001)) > 0.0); // west = left
        assert!(cross_track_sign(a, b, Point::new(0.005, 0.001)) < 0.0);
    }
}
