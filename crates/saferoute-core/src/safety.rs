//! Path safety verification.
//!
//! Every candidate route, whatever produced it, passes through
//! [`PathVerifier`] before it is handed to a caller.

use crate::models::{DangerZone, Point};

/// Minimum interpolation subdivisions per segment.
pub const MIN_SUBDIVISIONS: usize = 5;

/// First sampled point found inside a zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Violation {
    /// Index of the segment (or lone point) the sample belongs to.
    pub segment_index: usize,
    pub point: Point,
    /// Index into the zone slice that was checked.
    pub zone_index: usize,
}

/// Sampling-based check that a polyline stays outside every zone.
///
/// Each segment is checked at its endpoints and at `subdivisions - 1`
/// evenly spaced interior points. A curve could in principle clip a zone
/// between samples; raise the subdivision count where that matters.
#[derive(Debug, Clone, Copy)]
pub struct PathVerifier {
    subdivisions: usize,
}

impl Default for PathVerifier {
    fn default() -> Self {
        Self {
            subdivisions: MIN_SUBDIVISIONS,
        }
    }
}

impl PathVerifier {
    /// Create a verifier; counts below [`MIN_SUBDIVISIONS`] are raised to it.
    pub fn new(subdivisions: usize) -> Self {
        Self {
            subdivisions: subdivisions.max(MIN_SUBDIVISIONS),
        }
    }

    pub fn subdivisions(&self) -> usize {
        self.subdivisions
    }

    /// True only if every sampled point clears every zone.
    pub fn is_safe(&self, path: &[Point], zones: &[DangerZone]) -> bool {
        self.first_violation(path, zones).is_none()
    }

    /// Walk the path in traversal order and report the first sample inside a zone.
    pub fn first_violation(&self, path: &[Point], zones: &[DangerZone]) -> Option<Violation> {
        if zones.is_empty() {
            return None;
        }

        for (i, point) in path.iter().enumerate() {
            if let Some(zone_index) = zone_containing(zones, *point) {
                return Some(Violation {
                    segment_index: i,
                    point: *point,
                    zone_index,
                });
            }

            let Some(next) = path.get(i + 1) else {
                continue;
            };
            for j in 1..self.subdivisions {
                let t = j as f64 / self.subdivisions as f64;
                let sample = point.lerp(*next, t);
                if let Some(zone_index) = zone_containing(zones, sample) {
                    return Some(Violation {
                        segment_index: i,
                        point: sample,
                        zone_index,
                    });
                }
            }
        }

        None
    }
}

/// Check a path with the default sampling density.
pub fn is_path_safe(path: &[Point], zones: &[DangerZone]) -> bool {
    PathVerifier::default().is_safe(path, zones)
}

/// Index of the first zone containing `point`, if any.
pub fn zone_containing(zones: &[DangerZone], point: Point) -> Option<usize> {
    zones.iter().position(|zone| zone.contains(point))
}
