//! Tunable thresholds for zone avoidance.

use serde::{Deserialize, Serialize};

use crate::safety::MIN_SUBDIVISIONS;

/// Configuration for detour generation and route verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvoidanceRules {
    /// Band around a zone (meters beyond its radius) that counts as blocking the direct line
    pub zone_on_path_buffer_m: f64,
    /// Pivot buffer used when building fast-path anchors
    pub fast_path_buffer_m: f64,
    /// Widening pivot buffers tried, in order, by the recursive fallback
    pub fallback_buffers_m: Vec<f64>,
    /// Deepest recursion level the fallback may reach (root leg is depth 0)
    pub max_fallback_depth: usize,
    /// Directions requests one fallback run may spend across all of its legs
    pub max_fallback_calls: usize,
    /// Offset beyond the radius for points inserted by the local detour strategy
    pub local_detour_buffer_m: f64,
    /// Extra clearance the local strategy demands where a segment passes a zone
    /// between its endpoints
    pub local_intersection_buffer_m: f64,
    /// Maximum detour insertions performed by the local strategy
    pub max_local_passes: usize,
    /// Interpolation subdivisions per segment during verification (never below 5)
    pub safety_subdivisions: usize,
    /// Points produced by an arc detour
    pub arc_steps: usize,
    pub arc_buffer_m: f64,
    /// Sides of the polygon approximating each zone for polygon-avoidance services
    pub polygon_sides: usize,
}

impl Default for AvoidanceRules {
    fn default() -> Self {
        Self {
            zone_on_path_buffer_m: 40.0,
            fast_path_buffer_m: 40.0,
            fallback_buffers_m: vec![30.0, 60.0, 90.0, 120.0],
            max_fallback_depth: 6,
            max_fallback_calls: 64,
            local_detour_buffer_m: 30.0,
            local_intersection_buffer_m: 5.0,
            max_local_passes: 20,
            safety_subdivisions: MIN_SUBDIVISIONS,
            arc_steps: 5,
            arc_buffer_m: 40.0,
            polygon_sides: 12,
        }
    }
}

impl AvoidanceRules {
    /// Subdivision count actually used for verification.
    pub fn effective_subdivisions(&self) -> usize {
        self.safety_subdivisions.max(MIN_SUBDIVISIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subdivisions_never_drop_below_minimum() {
        let rules = AvoidanceRules {
            safety_subdivisions: 2,
            ..AvoidanceRules::default()
        };
        assert_eq!(rules.effective_subdivisions(), MIN_SUBDIVISIONS);

        let rules = AvoidanceRules {
            safety_subdivisions: 12,
            ..AvoidanceRules::default()
        };
        assert_eq!(rules.effective_subdivisions(), 12);
    }
}
