//! REST API routes.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use saferoute_core::{circles_to_polygons, polygons_to_feature_collection, DangerZone, RouteError};

use crate::backend::RoutingBackend;
use crate::route_planner::{SafeRouteRequest, SafeRouteResponse};
use crate::state::AppState;

/// Create the API router.
pub fn create_router<B: RoutingBackend + 'static>() -> Router<Arc<AppState<B>>> {
    Router::new()
        .route("/v1/routes/safe", post(safe_route_handler::<B>))
        .route("/v1/zones/polygons", post(zone_polygons_handler::<B>))
}

#[derive(Debug, Deserialize)]
pub struct ZonePolygonsRequest {
    pub zones: Vec<DangerZone>,
    /// Polygon sides; defaults to the configured avoidance rules.
    pub sides: Option<usize>,
}

async fn safe_route_handler<B: RoutingBackend + 'static>(
    State(state): State<Arc<AppState<B>>>,
    Json(request): Json<SafeRouteRequest>,
) -> impl IntoResponse {
    let result = state
        .planner()
        .plan(request.start, request.end, &request.zones)
        .await;

    match result {
        Ok(planned) => {
            tracing::Span::current().record("strategy", planned.strategy.as_str());
            tracing::info!(
                "Safe route: {} points, {:.0} m",
                planned.route.len(),
                planned.distance_m
            );
            (StatusCode::OK, Json(SafeRouteResponse::success(planned)))
        }
        Err(err) => {
            let status = match err {
                RouteError::InputInvalid(_) => StatusCode::BAD_REQUEST,
                RouteError::NoPathFound => StatusCode::NOT_FOUND,
                RouteError::AssetUnavailable(_) | RouteError::ServiceUnavailable(_) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
            };
            tracing::info!("Route request failed: {}", err);
            (status, Json(SafeRouteResponse::failure(&err)))
        }
    }
}

async fn zone_polygons_handler<B: RoutingBackend + 'static>(
    State(state): State<Arc<AppState<B>>>,
    Json(request): Json<ZonePolygonsRequest>,
) -> impl IntoResponse {
    let errors: Vec<String> = request.zones.iter().flat_map(DangerZone::validate).collect();
    if !errors.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "errors": errors })),
        );
    }

    let sides = request
        .sides
        .unwrap_or(state.planner().rules().polygon_sides);
    let polygons = circles_to_polygons(&request.zones, sides);
    (StatusCode::OK, Json(polygons_to_feature_collection(&polygons)))
}
