//! Network-free detour insertion.
//!
//! Starting from the straight line, repeatedly find the first segment that
//! passes too close to a zone and splice in a point beside that zone,
//! perpendicular to the segment. Cheap and always available, but blind to
//! streets; used as the last resort.

use crate::models::{DangerZone, Point, Route};
use crate::rules::AvoidanceRules;
use crate::safety::{zone_containing, PathVerifier};
use crate::spatial::{closest_point_on_segment, distance_m, LocalFrame};

/// Segments shorter than this (meters) have no usable direction.
const MIN_SEGMENT_M: f64 = 1e-6;

/// Build a polyline from `start` to `end`, inserting at most
/// `rules.max_local_passes` detour points. The result is not verified.
pub fn local_safe_path(
    start: Point,
    end: Point,
    zones: &[DangerZone],
    rules: &AvoidanceRules,
) -> Vec<Point> {
    let mut path = vec![start, end];

    for _ in 0..rules.max_local_passes {
        let Some((segment, zone)) = first_blocked_segment(&path, zones, rules) else {
            break;
        };
        let Some(detour) = detour_point(path[segment], path[segment + 1], zone, zones, rules)
        else {
            break;
        };
        path.insert(segment + 1, detour);
    }

    path
}

/// Run the local strategy and keep the result only if it verifies safe.
pub fn plan_local_detour(
    start: Point,
    end: Point,
    zones: &[DangerZone],
    rules: &AvoidanceRules,
) -> Option<Route> {
    let path = local_safe_path(start, end, zones, rules);
    let verifier = PathVerifier::new(rules.effective_subdivisions());
    if verifier.is_safe(&path, zones) {
        Some(Route::new(path))
    } else {
        tracing::debug!(
            "Local detour left {} points still crossing a zone",
            path.len()
        );
        None
    }
}

/// First segment that passes too close to a zone.
///
/// The intersection buffer only applies where the closest approach falls
/// strictly between the endpoints. An endpoint sitting in the buffer band
/// (a start just outside a zone, or an inserted detour point) only blocks
/// its segment when it is inside the zone itself.
fn first_blocked_segment<'a>(
    path: &[Point],
    zones: &'a [DangerZone],
    rules: &AvoidanceRules,
) -> Option<(usize, &'a DangerZone)> {
    path.windows(2).enumerate().find_map(|(i, pair)| {
        zones
            .iter()
            .find(|zone| {
                let (closest, t) = closest_point_on_segment(zone.center(), pair[0], pair[1]);
                let buffer = if t > 0.0 && t < 1.0 {
                    rules.local_intersection_buffer_m
                } else {
                    0.0
                };
                distance_m(closest, zone.center()) < zone.radius_m + buffer
            })
            .map(|zone| (i, zone))
    })
}

fn detour_point(
    a: Point,
    b: Point,
    zone: &DangerZone,
    zones: &[DangerZone],
    rules: &AvoidanceRules,
) -> Option<Point> {
    let frame = LocalFrame::new(zone.center());
    let (ax, ay) = frame.to_xy(a);
    let (bx, by) = frame.to_xy(b);
    let (dx, dy) = (bx - ax, by - ay);
    let len = dx.hypot(dy);
    if len < MIN_SEGMENT_M {
        return None;
    }

    let offset = zone.radius_m + rules.local_detour_buffer_m;
    let (px, py) = (-dy / len * offset, dx / len * offset);
    let left = frame.to_point(px, py);
    let right = frame.to_point(-px, -py);

    let left_free = zone_containing(zones, left).is_none();
    let right_free = zone_containing(zones, right).is_none();
    let chosen = match (left_free, right_free) {
        (true, false) => left,
        (false, true) => right,
        _ => {
            let (anchor, _) = closest_point_on_segment(zone.center(), a, b);
            if distance_m(right, anchor) < distance_m(left, anchor) {
                right
            } else {
                left
            }
        }
    };
    Some(chosen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::distance_to_segment_m;

    fn north_line() -> (Point, Point) {
        (Point::new(0.0, 0.0), Point::new(0.01, 0.0))
    }

    #[test]
    fn no_zones_returns_the_straight_line() {
        let (start, end) = north_line();
        let route = plan_local_detour(start, end, &[], &AvoidanceRules::default()).unwrap();
        assert_eq!(route.points(), &[start, end]);
    }

    #[test]
    fn zone_straddling_the_line_gets_one_side_point() {
        let (start, end) = north_line();
        let zones = vec![DangerZone::new(0.005, 0.0, 100.0)];
        let route = plan_local_detour(start, end, &zones, &AvoidanceRules::default())
            .expect("single insertion clears the zone");

        assert_eq!(route.len(), 3);
        assert_eq!(route.first(), Some(start));
        assert_eq!(route.last(), Some(end));
        let inserted = route.points()[1];
        assert!((distance_m(inserted, zones[0].center()) - 130.0).abs() < 0.5);
        for pair in route.points().windows(2) {
            let clearance = distance_to_segment_m(zones[0].center(), pair[0], pair[1]);
            assert!(clearance > 120.0, "clearance {clearance}");
        }
    }

    #[test]
    fn detour_prefers_the_side_not_inside_another_zone() {
        let (start, end) = north_line();
        // The west candidate (~130 m west of the first zone) lies inside the
        // second zone, so the east side is taken.
        let zones = vec![
            DangerZone::new(0.005, 0.0, 100.0),
            DangerZone::new(0.005, -0.0012, 80.0),
        ];
        let path = local_safe_path(start, end, &zones, &AvoidanceRules::default());
        assert!(path[1].lon > 0.0, "expected east side, got {:?}", path[1]);
    }

    #[test]
    fn pass_limit_bounds_the_number_of_insertions() {
        let (start, end) = north_line();
        // A dense east-west wall nothing can get around in a few passes.
        let zones: Vec<DangerZone> = (-20..=20)
            .map(|i| DangerZone::new(0.005, i as f64 * 0.001, 80.0))
            .collect();
        let rules = AvoidanceRules {
            max_local_passes: 3,
            ..AvoidanceRules::default()
        };
        let path = local_safe_path(start, end, &zones, &rules);
        assert!(path.len() <= 2 + 3);
        assert!(plan_local_detour(start, end, &zones, &rules).is_none());
    }

    #[test]
    fn start_just_outside_a_zone_needs_few_insertions() {
        let (start, end) = north_line();
        // The start sits 2.5 m outside the zone, inside the intersection band.
        let zones = vec![DangerZone::new(0.0005, 0.0, 53.0)];
        assert!(!zones[0].contains(start));

        let route = plan_local_detour(start, end, &zones, &AvoidanceRules::default())
            .expect("a short detour clears the zone");
        assert!(route.len() <= 5, "{} points", route.len());
        assert!(route.distance_m() < 1_250.0, "{:.0} m", route.distance_m());
        for pair in route.points().windows(2) {
            assert!(distance_to_segment_m(zones[0].center(), pair[0], pair[1]) >= 53.0);
        }
    }

    #[test]
    fn result_is_deterministic() {
        let (start, end) = north_line();
        let zones = vec![
            DangerZone::new(0.003, 0.0002, 60.0),
            DangerZone::new(0.007, -0.0002, 60.0),
        ];
        let rules = AvoidanceRules::default();
        let first = local_safe_path(start, end, &zones, &rules);
        assert_eq!(local_safe_path(start, end, &zones, &rules), first);
    }

    #[test]
    fn coincident_endpoints_stop_without_inserting() {
        let point = Point::new(0.005, 0.0);
        let zones = vec![DangerZone::new(0.005, 0.0005, 100.0)];
        let path = local_safe_path(point, point, &zones, &AvoidanceRules::default());
        assert_eq!(path, vec![point, point]);
    }
}
