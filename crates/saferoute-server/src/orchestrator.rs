//! Online routing around danger zones.
//!
//! Two stages per request:
//!
//! 1. **Fast path**: snap tangential pivots of every zone near the direct
//!    line onto streets (concurrently, each call individually timed out),
//!    then ask for a single route through the surviving anchors, raced
//!    against a short deadline.
//! 2. **Fallback**: recursive leg splitting. Route a leg directly; if it
//!    crosses a zone, pick a pivot beside the first zone hit and solve the
//!    two halves independently, up to a fixed depth. The whole fallback
//!    also shares one budget of directions calls and one deadline.
//!
//! Service failures never escape as errors; they end the current attempt
//! with `None` and the next stage takes over.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::future::{join_all, BoxFuture, FutureExt};
use tokio::time::timeout;

use saferoute_core::{
    distance_m, tangential_pivots, zone_containing, zones_on_path, AvoidanceRules, DangerZone,
    PathVerifier, Point, Route,
};

use crate::backend::RoutingBackend;
use crate::config::Config;

pub struct OnlineRouter<B> {
    backend: B,
    rules: AvoidanceRules,
    verifier: PathVerifier,
    snap_timeout: Duration,
    directions_timeout: Duration,
    race_timeout: Duration,
    fallback_timeout: Duration,
}

impl<B: RoutingBackend> OnlineRouter<B> {
    pub fn new(backend: B, rules: AvoidanceRules) -> Self {
        let defaults = Config::default();
        Self {
            backend,
            verifier: PathVerifier::new(rules.effective_subdivisions()),
            rules,
            snap_timeout: defaults.snap_timeout(),
            directions_timeout: defaults.directions_timeout(),
            race_timeout: defaults.fast_path_timeout(),
            fallback_timeout: defaults.fallback_timeout(),
        }
    }

    pub fn from_config(backend: B, config: &Config) -> Self {
        Self::new(backend, config.avoidance_rules()).with_timeouts(
            config.snap_timeout(),
            config.directions_timeout(),
            config.fast_path_timeout(),
        )
        .with_fallback_timeout(config.fallback_timeout())
    }

    pub fn with_timeouts(mut self, snap: Duration, directions: Duration, race: Duration) -> Self {
        self.snap_timeout = snap;
        self.directions_timeout = directions;
        self.race_timeout = race;
        self
    }

    pub fn with_fallback_timeout(mut self, deadline: Duration) -> Self {
        self.fallback_timeout = deadline;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn rules(&self) -> &AvoidanceRules {
        &self.rules
    }

    /// Best-effort safe route from `start` to `end`.
    ///
    /// Without zones the direct service route is returned as-is. Otherwise
    /// any returned route has passed the verifier.
    pub async fn route(&self, start: Point, end: Point, zones: &[DangerZone]) -> Option<Route> {
        if zones.is_empty() {
            return self.directions(&[start, end]).await;
        }

        if let Some(route) = self.fast_path(start, end, zones).await {
            tracing::debug!("Fast path produced a safe route ({} points)", route.len());
            return Some(route);
        }

        let fallback = timeout(self.fallback_timeout, self.build_safe_leg(start, end, zones, 0));
        let points = match fallback.await {
            Ok(points) => points?,
            Err(_) => {
                tracing::warn!("Recursive fallback gave up after {:?}", self.fallback_timeout);
                return None;
            }
        };
        tracing::debug!("Recursive fallback produced a safe route ({} points)", points.len());
        Some(Route::new(points))
    }

    /// One anchored directions request around the zones on the direct line.
    pub async fn fast_path(&self, start: Point, end: Point, zones: &[DangerZone]) -> Option<Route> {
        let candidates: Vec<Point> = zones_on_path(start, end, zones, self.rules.zone_on_path_buffer_m)
            .into_iter()
            .flat_map(|zone| tangential_pivots(zone, start, end, self.rules.fast_path_buffer_m))
            .collect();
        if candidates.is_empty() {
            return None;
        }

        let snapped = join_all(
            candidates
                .iter()
                .map(|candidate| timeout(self.snap_timeout, self.backend.snap(*candidate))),
        )
        .await;

        let mut anchors: Vec<Point> = snapped
            .into_iter()
            .filter_map(|result| result.ok().flatten())
            .filter(|anchor| zone_containing(zones, *anchor).is_none())
            .collect();
        if anchors.is_empty() {
            tracing::debug!("Fast path: no usable anchors from {} candidates", candidates.len());
            return None;
        }
        anchors.sort_by(|a, b| distance_m(start, *a).total_cmp(&distance_m(start, *b)));

        let mut waypoints = Vec::with_capacity(anchors.len() + 2);
        waypoints.push(start);
        waypoints.extend(anchors);
        waypoints.push(end);

        // Dropping the request on timeout only stops waiting for it.
        let route = match timeout(self.race_timeout, self.backend.directions(&waypoints)).await {
            Ok(route) => route?,
            Err(_) => {
                tracing::debug!("Fast path lost the race after {:?}", self.race_timeout);
                return None;
            }
        };

        if self.verifier.is_safe(route.points(), zones) {
            Some(route)
        } else {
            tracing::debug!("Fast path route still crosses a zone");
            None
        }
    }

    /// Recursively split `start`-`end` around the first zone its direct
    /// route crosses. Depth 0 is the whole request.
    ///
    /// At most `max_fallback_calls` directions requests are spent across all
    /// legs; once they run out every remaining leg fails.
    pub async fn build_safe_leg(
        &self,
        start: Point,
        end: Point,
        zones: &[DangerZone],
        depth: usize,
    ) -> Option<Vec<Point>> {
        let budget = AtomicUsize::new(self.rules.max_fallback_calls);
        let points = self.split_leg(start, end, zones, depth, &budget).await;
        if points.is_none() && budget.load(Ordering::Relaxed) == 0 {
            tracing::debug!(
                "Fallback spent its {} directions calls without a safe route",
                self.rules.max_fallback_calls
            );
        }
        points
    }

    fn split_leg<'a>(
        &'a self,
        start: Point,
        end: Point,
        zones: &'a [DangerZone],
        depth: usize,
        budget: &'a AtomicUsize,
    ) -> BoxFuture<'a, Option<Vec<Point>>> {
        async move {
            if depth > self.rules.max_fallback_depth {
                return None;
            }
            budget
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |left| left.checked_sub(1))
                .ok()?;

            let route = self.directions(&[start, end]).await?;
            let violation = match self.verifier.first_violation(route.points(), zones) {
                None => return Some(route.into_points()),
                Some(violation) => violation,
            };
            let offending = zones.get(violation.zone_index)?;

            for buffer in &self.rules.fallback_buffers_m {
                for pivot in tangential_pivots(offending, start, end, *buffer) {
                    if zone_containing(zones, pivot).is_some() {
                        continue;
                    }
                    let Some(first_half) =
                        self.split_leg(start, pivot, zones, depth + 1, budget).await
                    else {
                        continue;
                    };
                    let Some(second_half) =
                        self.split_leg(pivot, end, zones, depth + 1, budget).await
                    else {
                        continue;
                    };

                    let mut joined = first_half;
                    joined.extend(second_half.into_iter().skip(1));
                    return Some(joined);
                }
            }

            tracing::debug!(
                "No pivot around zone {} cleared the leg at depth {}",
                offending.label(),
                depth
            );
            None
        }
        .boxed()
    }

    async fn directions(&self, waypoints: &[Point]) -> Option<Route> {
        match timeout(self.directions_timeout, self.backend.directions(waypoints)).await {
            Ok(route) => route,
            Err(_) => {
                tracing::warn!("Directions request timed out after {:?}", self.directions_timeout);
                None
            }
        }
    }
}
