//! Randomized routing scenarios for stress runs.

use rand::Rng;

use saferoute_core::{DangerZone, LocalFrame, Point};

#[derive(Debug, Clone)]
pub struct Scenario {
    pub start: Point,
    pub end: Point,
    pub zones: Vec<DangerZone>,
}

/// Random start/end about `span_m` apart around `center`, with `zone_count`
/// zones scattered along the corridor between them.
///
/// Zones that would swallow an endpoint are dropped, so every scenario is a
/// valid request.
pub fn random_scenario<R: Rng>(
    rng: &mut R,
    center: Point,
    span_m: f64,
    zone_count: usize,
    radius_range_m: (f64, f64),
) -> Scenario {
    let frame = LocalFrame::new(center);
    let heading = rng.random_range(0.0..std::f64::consts::TAU);
    let half = span_m / 2.0;
    let (dx, dy) = (half * heading.cos(), half * heading.sin());
    let start = frame.to_point(-dx, -dy);
    let end = frame.to_point(dx, dy);

    let (min_r, max_r) = radius_range_m;
    let zones = (0..zone_count)
        .map(|i| {
            let t = rng.random_range(0.1..0.9);
            let lateral = rng.random_range(-0.25..0.25) * span_m;
            let along = (t - 0.5) * span_m;
            let east = along * heading.cos() - lateral * heading.sin();
            let north = along * heading.sin() + lateral * heading.cos();
            let zone_center = frame.to_point(east, north);
            let radius = if max_r > min_r {
                rng.random_range(min_r..max_r)
            } else {
                min_r
            };
            DangerZone::new(zone_center.lat, zone_center.lon, radius).with_id(format!("zone-{i}"))
        })
        .filter(|zone| !zone.contains(start) && !zone.contains(end))
        .collect();

    Scenario { start, end, zones }
}
